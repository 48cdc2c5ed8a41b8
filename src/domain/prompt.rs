//! Prompt rendering from embedded templates.

use std::sync::OnceLock;

use minijinja::{Environment, UndefinedBehavior, context};
use serde::Serialize;

use crate::domain::AppError;
use crate::domain::document::DocumentModel;
use crate::domain::insertion_point::InsertionPoint;

const DETECT_POINTS: &str = "detect_points";
const FILL_POINT: &str = "fill_point";

static ENV: OnceLock<Environment<'static>> = OnceLock::new();

fn environment() -> &'static Environment<'static> {
    ENV.get_or_init(|| {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_template(DETECT_POINTS, include_str!("../assets/prompts/detect_points.j2"))
            .expect("embedded detection template must parse");
        env.add_template(FILL_POINT, include_str!("../assets/prompts/fill_point.j2"))
            .expect("embedded fill template must parse");
        env
    })
}

#[derive(Serialize)]
struct ListedBlock {
    index: usize,
    text: String,
}

/// Inputs for the per-point generation prompt.
#[derive(Debug, Clone, Copy)]
pub struct FillRequest<'a> {
    pub full_text: &'a str,
    pub point: &'a InsertionPoint,
    pub custom_prompt: Option<&'a str>,
    pub languages: &'a [String],
}

/// Prompt asking the model to list insertion points as JSON.
pub fn detection_prompt(model: &DocumentModel) -> Result<String, AppError> {
    let blocks: Vec<ListedBlock> = model
        .blocks()
        .map(|block| ListedBlock { index: block.index, text: block.text.replace('\n', " / ") })
        .collect();

    render(DETECT_POINTS, context! { full_text => model.full_text(), blocks => blocks })
}

/// Prompt asking the model to write the content for one point.
pub fn fill_prompt(request: &FillRequest<'_>) -> Result<String, AppError> {
    let custom_prompt = request.custom_prompt.map(str::trim).filter(|p| !p.is_empty());
    render(
        FILL_POINT,
        context! {
            full_text => request.full_text,
            anchor_index => request.point.anchor_index,
            description => &request.point.description,
            context_before => &request.point.context_before,
            context_after => &request.point.context_after,
            custom_prompt => custom_prompt,
            languages => request.languages,
        },
    )
}

fn render(name: &str, ctx: minijinja::Value) -> Result<String, AppError> {
    environment()
        .get_template(name)
        .and_then(|template| template.render(ctx))
        .map_err(|err| AppError::Prompt(format!("{name}: {err}")))
}
