//! Application configuration domain models.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use super::LocatorStrategy;
use crate::domain::AppError;
use crate::domain::content::{DEFAULT_EXECUTION_KEYWORDS, DEFAULT_IMAGE_WIDTH};
use crate::domain::locator::DEFAULT_CONTEXT_BLOCKS;

/// Configuration loaded from `docfill.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Text model endpoint configuration.
    #[serde(default)]
    pub api: ApiConfig,
    /// Document handling configuration.
    #[serde(default)]
    pub document: DocumentConfig,
    /// Insertion point detection.
    #[serde(default)]
    pub locator: LocatorConfig,
    /// Generated-code execution.
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Chart rendering.
    #[serde(default)]
    pub chart: ChartConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        self.api.validate()?;
        self.execution.validate()?;
        self.chart.validate()?;
        Ok(())
    }
}

/// OpenAI-compatible chat endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL; `/chat/completions` is appended when missing.
    #[serde(default = "default_api_url")]
    pub api_url: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https_proxy: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            model: default_model(),
            timeout_secs: default_api_timeout(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            http_proxy: None,
            https_proxy: None,
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.timeout_secs == 0 {
            return Err(AppError::InvalidConfig(
                "api.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(AppError::InvalidConfig("api.max_tokens must be greater than 0".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::InvalidConfig(
                "api.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(AppError::InvalidConfig("api.model must not be empty".to_string()));
        }
        for (name, proxy) in [("http_proxy", &self.http_proxy), ("https_proxy", &self.https_proxy)]
        {
            if let Some(proxy) = proxy {
                Url::parse(proxy).map_err(|e| {
                    AppError::InvalidConfig(format!("api.{name} is not a valid URL: {e}"))
                })?;
            }
        }
        Ok(())
    }

    /// Whether a non-empty API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }
}

fn default_api_url() -> Url {
    Url::parse("https://openrouter.ai/api/v1").expect("Default API URL must be valid")
}

fn default_model() -> String {
    "anthropic/claude-3.5-sonnet".to_string()
}

fn default_api_timeout() -> u64 {
    180
}

fn default_max_tokens() -> u32 {
    8000
}

fn default_temperature() -> f32 {
    0.7
}

/// Document handling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentConfig {
    /// Extra instructions appended to every fill prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
    /// Where relative document names are looked up.
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,
    /// Scratch directory for compiled programs and charts.
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: PathBuf,
    /// Non-empty blocks of context on each side of a point.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            custom_prompt: None,
            documents_dir: default_documents_dir(),
            workspace_dir: default_workspace_dir(),
            context_window: default_context_window(),
        }
    }
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("documents")
}

fn default_workspace_dir() -> PathBuf {
    PathBuf::from("workspace")
}

fn default_context_window() -> usize {
    DEFAULT_CONTEXT_BLOCKS
}

/// Insertion point detection configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocatorConfig {
    #[serde(default)]
    pub strategy: LocatorStrategy,
}

/// Generated-code execution configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Wall-clock limit per compile or run step, in seconds.
    #[serde(default = "default_execution_timeout")]
    pub timeout_secs: u64,
    /// Description terms that trigger running generated code.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            timeout_secs: default_execution_timeout(),
            keywords: default_keywords(),
        }
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.timeout_secs == 0 {
            return Err(AppError::InvalidConfig(
                "execution.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.keywords.iter().any(|keyword| keyword.trim().is_empty()) {
            return Err(AppError::InvalidConfig(
                "execution.keywords must not contain empty entries".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_execution_timeout() -> u64 {
    30
}

fn default_keywords() -> Vec<String> {
    DEFAULT_EXECUTION_KEYWORDS.iter().map(|keyword| keyword.to_string()).collect()
}

/// Chart rendering configuration, passed explicitly to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// `font.sans-serif` fallback list, in priority order.
    #[serde(default = "default_fonts")]
    pub fonts: Vec<String>,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Width of inserted charts in inches.
    #[serde(default = "default_width_inches")]
    pub width_inches: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            fonts: default_fonts(),
            dpi: default_dpi(),
            width_inches: default_width_inches(),
        }
    }
}

impl ChartConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.dpi == 0 {
            return Err(AppError::InvalidConfig("chart.dpi must be greater than 0".to_string()));
        }
        if !(self.width_inches.is_finite() && self.width_inches > 0.0) {
            return Err(AppError::InvalidConfig(
                "chart.width_inches must be a positive number".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_fonts() -> Vec<String> {
    let fonts: &[&str] = if cfg!(target_os = "windows") {
        &["Microsoft YaHei", "SimHei", "DejaVu Sans"]
    } else if cfg!(target_os = "macos") {
        &["Arial Unicode MS", "Songti SC", "DejaVu Sans"]
    } else {
        &["Noto Sans CJK SC", "WenQuanYi Micro Hei", "DejaVu Sans"]
    };
    fonts.iter().map(|font| font.to_string()).collect()
}

fn default_dpi() -> u32 {
    150
}

fn default_width_inches() -> f64 {
    DEFAULT_IMAGE_WIDTH
}
