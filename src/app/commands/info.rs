//! Configuration and environment report.

use std::path::PathBuf;

use serde::Serialize;

use crate::domain::configuration::AppConfig;
use crate::domain::LocatorStrategy;
use crate::ports::CodeExecutor;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoReport {
    pub api_url: String,
    pub model: String,
    /// Masked key, or `None` when no key is configured.
    pub api_key: Option<String>,
    pub locator: LocatorStrategy,
    pub documents_dir: PathBuf,
    pub workspace_dir: PathBuf,
    pub custom_prompt: Option<String>,
    pub execution_enabled: bool,
    pub languages: Vec<String>,
}

pub fn execute(config: &AppConfig, executor: &dyn CodeExecutor) -> InfoReport {
    InfoReport {
        api_url: config.api.api_url.to_string(),
        model: config.api.model.clone(),
        api_key: config.api.api_key.as_deref().filter(|k| !k.trim().is_empty()).map(mask_key),
        locator: config.locator.strategy,
        documents_dir: config.document.documents_dir.clone(),
        workspace_dir: config.document.workspace_dir.clone(),
        custom_prompt: config.document.custom_prompt.clone(),
        execution_enabled: config.execution.enabled,
        languages: if config.execution.enabled { executor.available_languages() } else { Vec::new() },
    }
}

/// Keep the first and last four characters of long keys; hide short keys entirely.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
