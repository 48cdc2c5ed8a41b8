//! API facade for the application.
//!
//! Builds collaborators from configuration and runs commands with them.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::adapters::{
    ChatCompletionClient, ProcessCodeExecutor, PythonChartRenderer, StdioGenerator,
};
use crate::app::AppContext;
use crate::app::commands::{info, process};
use crate::domain::configuration::loader;
use crate::ports::{
    ChartRenderer, CodeExecutor, DisabledChartRenderer, DisabledCodeExecutor, TextGenerator,
};

pub use crate::app::commands::info::InfoReport;
pub use crate::app::commands::process::{ProcessOptions, ProcessOutcome};
pub use crate::domain::AppError;
pub use crate::domain::configuration::AppConfig;

/// Where generated text comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeneratorMode {
    /// The configured chat completion endpoint.
    #[default]
    Http,
    /// Prompts on stderr, answers typed on stdin.
    Stdio,
}

/// Load `docfill.toml` (or `path`) with environment overrides applied.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, AppError> {
    loader::load_config(path)
}

/// Persist `config` to `path`.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<(), AppError> {
    loader::save_config(config, path)
}

/// Create an `AppContext` from configuration.
pub fn create_context(config: &AppConfig, mode: GeneratorMode) -> Result<AppContext, AppError> {
    let generator: Box<dyn TextGenerator> = match mode {
        GeneratorMode::Stdio => Box::new(StdioGenerator::stdio()),
        GeneratorMode::Http => {
            if !config.api.has_api_key() {
                return Err(AppError::config_error(
                    "API key not configured. Run `docfill configure`, set OPENAI_API_KEY, or use --test-mode",
                ));
            }
            Box::new(ChatCompletionClient::new(&config.api)?)
        }
    };

    Ok(AppContext::new(generator, create_executor(config), create_chart_renderer(config)))
}

/// Local executor, or one that refuses everything when execution is disabled.
pub fn create_executor(config: &AppConfig) -> Box<dyn CodeExecutor> {
    if config.execution.enabled {
        Box::new(ProcessCodeExecutor::new(
            config.document.workspace_dir.clone(),
            Duration::from_secs(config.execution.timeout_secs),
        ))
    } else {
        Box::new(DisabledCodeExecutor)
    }
}

fn create_chart_renderer(config: &AppConfig) -> Box<dyn ChartRenderer> {
    if config.chart.enabled && config.execution.enabled {
        Box::new(PythonChartRenderer::new(
            config.chart.clone(),
            config.document.workspace_dir.clone(),
            Duration::from_secs(config.execution.timeout_secs),
        ))
    } else {
        Box::new(DisabledChartRenderer)
    }
}

/// `input` as given when it exists, else looked up under `documents_dir`.
pub fn resolve_input(input: &Path, documents_dir: &Path) -> Result<PathBuf, AppError> {
    if input.is_file() {
        return Ok(input.to_path_buf());
    }
    if input.is_relative() {
        let candidate = documents_dir.join(input);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    Err(AppError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("Document not found: {}", input.display()),
    )))
}

/// Fill the document at `input` using collaborators built from `config`.
pub fn process(
    input: &Path,
    output: Option<&Path>,
    config: &AppConfig,
    mode: GeneratorMode,
) -> Result<ProcessOutcome, AppError> {
    let input = resolve_input(input, &config.document.documents_dir)?;
    let ctx = create_context(config, mode)?;
    let mut options = ProcessOptions::from_config(input, config);
    options.output = output.map(Path::to_path_buf);
    process::execute(&ctx, &options)
}

/// Fill a document with caller-supplied collaborators.
pub fn process_with(ctx: &AppContext, options: &ProcessOptions) -> Result<ProcessOutcome, AppError> {
    process::execute(ctx, options)
}

/// Describe the effective configuration and detected toolchains.
pub fn info(config: &AppConfig) -> InfoReport {
    let executor = create_executor(config);
    info::execute(config, executor.as_ref())
}
