//! Info command implementation.

use std::path::Path;

use crate::app::api;
use crate::domain::AppError;

pub fn run_info(config_path: Option<&Path>, json: bool) -> Result<(), AppError> {
    let config = api::load_config(config_path)?;
    let report = api::info(&config);

    if json {
        let rendered = serde_json::to_string_pretty(&report).map_err(|e| AppError::ParseError {
            what: "info report".to_string(),
            details: e.to_string(),
        })?;
        println!("{}", rendered);
        return Ok(());
    }

    println!("API URL:        {}", report.api_url);
    println!("Model:          {}", report.model);
    println!("API key:        {}", report.api_key.as_deref().unwrap_or("(not set)"));
    println!("Locator:        {}", report.locator);
    println!("Documents dir:  {}", report.documents_dir.display());
    println!("Workspace dir:  {}", report.workspace_dir.display());
    if let Some(prompt) = &report.custom_prompt {
        println!("Custom prompt:  {}", prompt);
    }

    if !report.execution_enabled {
        println!("⚠️  Code execution disabled");
    } else if report.languages.is_empty() {
        println!("⚠️  No code execution tools detected");
    } else {
        println!("Code execution: {}", report.languages.join(", "));
    }
    Ok(())
}
