//! Fill pipeline: load, locate, generate, parse, insert, report, save.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::app::AppContext;
use crate::domain::configuration::AppConfig;
use crate::domain::prompt::{self, FillRequest};
use crate::domain::{
    AppError, AssistedLocator, CompletionStatus, ContentParser, DocumentModel, InsertionEngine,
    InsertionPoint, LocatorStrategy, PatternLocator, PositionLocator,
};

/// Options for one fill run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOptions {
    pub input: PathBuf,
    /// Defaults to overwriting `input`.
    pub output: Option<PathBuf>,
    pub strategy: LocatorStrategy,
    pub custom_prompt: Option<String>,
    pub context_window: usize,
    pub execution_keywords: Vec<String>,
    pub image_width: f64,
}

impl ProcessOptions {
    pub fn from_config(input: impl Into<PathBuf>, config: &AppConfig) -> Self {
        Self {
            input: input.into(),
            output: None,
            strategy: config.locator.strategy,
            custom_prompt: config.document.custom_prompt.clone(),
            context_window: config.document.context_window,
            execution_keywords: config.execution.keywords.clone(),
            image_width: config.chart.width_inches,
        }
    }

    pub fn output_path(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.input)
    }
}

/// Result of a fill run.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    /// True when every located point was filled.
    pub success: bool,
    pub status: CompletionStatus,
    pub output: PathBuf,
}

/// Run the fill pipeline over `options.input` and save the result.
///
/// Only structural and I/O problems abort the run. A point whose generation,
/// parsing or insertion fails is left unfilled and reported in the status.
pub fn execute(ctx: &AppContext, options: &ProcessOptions) -> Result<ProcessOutcome, AppError> {
    let mut model = DocumentModel::load(&options.input)?;
    let full_text = model.full_text();
    info!(path = %options.input.display(), chars = full_text.chars().count(), "document loaded");

    let mut points = locate(ctx, &model, options);
    let output = options.output_path().to_path_buf();

    if points.is_empty() {
        info!("no insertion points found");
        model.save(&output)?;
        let status = CompletionStatus::of(&points);
        return Ok(ProcessOutcome { success: true, status, output });
    }
    info!(count = points.len(), "insertion points located");

    let languages = ctx.executor().available_languages();
    let parser = ContentParser::new(ctx.executor(), ctx.charts())
        .with_keywords(options.execution_keywords.clone())
        .with_image_width(options.image_width);

    for idx in 0..points.len() {
        let point = &points[idx];
        info!(point = idx + 1, total = points.len(), description = %point.summary(), "filling");

        let request = FillRequest {
            full_text: &full_text,
            point,
            custom_prompt: options.custom_prompt.as_deref(),
            languages: &languages,
        };
        let response = ctx.generator().generate(&prompt::fill_prompt(&request)?);
        if response.trim().is_empty() {
            warn!(anchor = point.anchor_index, "{}", AppError::Generation("empty response".into()));
            continue;
        }

        let blocks = parser.parse(&response, &point.description);
        if blocks.is_empty() {
            warn!(anchor = point.anchor_index, "response produced no content");
            continue;
        }

        match InsertionEngine::apply(&mut model, &mut points, idx, blocks) {
            Ok(inserted) => info!(inserted, "point filled"),
            Err(err) if err.is_recoverable() => warn!(error = %err, "point left unfilled"),
            Err(err) => return Err(err),
        }
    }

    let status = CompletionStatus::of(&points);
    for point in status.unfilled() {
        warn!(anchor = point.anchor_index, description = %point.summary(), "insertion point not filled");
    }

    model.save(&output)?;
    info!(path = %output.display(), "document saved");

    Ok(ProcessOutcome { success: status.is_complete(), status, output })
}

fn locate(
    ctx: &AppContext,
    model: &DocumentModel,
    options: &ProcessOptions,
) -> Vec<InsertionPoint> {
    match options.strategy {
        LocatorStrategy::Pattern => {
            PatternLocator::default().with_context_size(options.context_window).locate(model)
        }
        LocatorStrategy::Assisted => AssistedLocator::new(ctx.generator())
            .with_context_size(options.context_window)
            .locate(model),
    }
}
