//! Interactive configuration.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use dialoguer::{Confirm, Error as DialoguerError, Input, Password, Select};
use url::Url;

use crate::app::api;
use crate::domain::configuration::loader::{self, CONFIG_FILE};
use crate::domain::{AppConfig, AppError, LocatorStrategy};

pub fn run_configure(config_path: Option<&Path>) -> Result<(), AppError> {
    let path = config_path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    // File values only, without environment overrides.
    let mut config = if path.exists() {
        loader::parse_config_content(&fs::read_to_string(&path)?)?
    } else {
        AppConfig::default()
    };

    if !prompt_settings(&mut config)? {
        println!("Configuration unchanged");
        return Ok(());
    }

    let save = Confirm::new()
        .with_prompt(format!("Save configuration to {}?", path.display()))
        .default(true)
        .interact_opt()
        .map_err(|e| prompt_error("confirmation", e))?;
    if save != Some(true) {
        println!("Configuration unchanged");
        return Ok(());
    }

    api::save_config(&config, &path)?;
    println!("✅ Configuration saved to {}", path.display());
    Ok(())
}

/// Walk through the editable settings; `false` when the user interrupts.
fn prompt_settings(config: &mut AppConfig) -> Result<bool, AppError> {
    let Some(url) = text("API URL", config.api.api_url.as_str())? else {
        return Ok(false);
    };
    config.api.api_url = Url::parse(&url)
        .map_err(|e| AppError::InvalidConfig(format!("API URL is not valid: {e}")))?;

    let key = Password::new()
        .with_prompt("API key (leave empty to keep current)")
        .allow_empty_password(true)
        .interact();
    match key {
        Ok(key) if !key.trim().is_empty() => config.api.api_key = Some(key.trim().to_string()),
        Ok(_) => {}
        Err(DialoguerError::IO(err)) if err.kind() == ErrorKind::Interrupted => return Ok(false),
        Err(err) => return Err(prompt_error("API key", err)),
    }

    let Some(model) = text("Model", &config.api.model)? else {
        return Ok(false);
    };
    config.api.model = model;

    let strategies = [LocatorStrategy::Assisted, LocatorStrategy::Pattern];
    let labels: Vec<&str> = strategies.iter().map(|s| s.label()).collect();
    let current = strategies.iter().position(|s| *s == config.locator.strategy).unwrap_or(0);
    let Some(choice) = Select::new()
        .with_prompt("Insertion point locator")
        .items(&labels)
        .default(current)
        .interact_opt()
        .map_err(|e| prompt_error("locator", e))?
    else {
        return Ok(false);
    };
    config.locator.strategy = strategies[choice];

    let Some(prompt) = text("Custom prompt (optional)", config.document.custom_prompt.as_deref().unwrap_or(""))?
    else {
        return Ok(false);
    };
    config.document.custom_prompt = Some(prompt).filter(|p| !p.trim().is_empty());

    let Some(docs) = text("Documents directory", &config.document.documents_dir.to_string_lossy())?
    else {
        return Ok(false);
    };
    config.document.documents_dir = PathBuf::from(docs);

    let Some(http_proxy) = text("HTTP proxy (optional)", config.api.http_proxy.as_deref().unwrap_or(""))?
    else {
        return Ok(false);
    };
    config.api.http_proxy = Some(http_proxy).filter(|p| !p.trim().is_empty());

    let Some(https_proxy) =
        text("HTTPS proxy (optional)", config.api.https_proxy.as_deref().unwrap_or(""))?
    else {
        return Ok(false);
    };
    config.api.https_proxy = Some(https_proxy).filter(|p| !p.trim().is_empty());

    config.validate()?;
    Ok(true)
}

/// Free-text prompt; `None` when the user interrupts.
fn text(prompt: &str, default: &str) -> Result<Option<String>, AppError> {
    match Input::<String>::new()
        .with_prompt(prompt)
        .default(default.to_string())
        .allow_empty(true)
        .interact_text()
    {
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(DialoguerError::IO(err)) if err.kind() == ErrorKind::Interrupted => Ok(None),
        Err(err) => Err(prompt_error(prompt, err)),
    }
}

fn prompt_error(what: &str, err: DialoguerError) -> AppError {
    AppError::config_error(format!("Failed to read {}: {}", what, err))
}
