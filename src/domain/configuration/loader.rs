//! Configuration loading: file, then environment.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use url::Url;

use super::AppConfig;
use crate::domain::AppError;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "docfill.toml";

/// Load configuration from `path` (or `docfill.toml` when absent) and apply
/// environment overrides from the process environment.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, AppError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an injectable environment lookup.
///
/// A missing default file yields defaults; a missing explicit file is an error.
pub fn load_config_with_env<F>(path: Option<&Path>, env: F) -> Result<AppConfig, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

    let mut config = if config_path.exists() {
        debug!(path = %config_path.display(), "loading configuration");
        let content = fs::read_to_string(&config_path)?;
        parse_config_content(&content)?
    } else if path.is_some() {
        return Err(AppError::config_error(format!(
            "Config file not found: {}",
            config_path.display()
        )));
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content.
pub fn parse_config_content(content: &str) -> Result<AppConfig, AppError> {
    let config: AppConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Override API settings from `OPENAI_API_URL`, `OPENAI_API_KEY`, `OPENAI_MODEL`,
/// `HTTP_PROXY` and `HTTPS_PROXY`. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut AppConfig, env: F) -> Result<(), AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).map(|value| value.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(url) = lookup("OPENAI_API_URL") {
        config.api.api_url = Url::parse(&url).map_err(|e| {
            AppError::InvalidConfig(format!("OPENAI_API_URL is not a valid URL: {e}"))
        })?;
    }
    if let Some(key) = lookup("OPENAI_API_KEY") {
        config.api.api_key = Some(key);
    }
    if let Some(model) = lookup("OPENAI_MODEL") {
        config.api.model = model;
    }
    if let Some(proxy) = lookup("HTTP_PROXY") {
        config.api.http_proxy = Some(proxy);
    }
    if let Some(proxy) = lookup("HTTPS_PROXY") {
        config.api.https_proxy = Some(proxy);
    }
    Ok(())
}

/// Write `config` as TOML, creating parent directories as needed.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<(), AppError> {
    config.validate()?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml::to_string_pretty(config)?)?;
    Ok(())
}
