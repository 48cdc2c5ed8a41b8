//! Typed generated material and the parser that produces it.

mod markdown;
mod parser;

use std::path::PathBuf;

use serde::Serialize;

pub use parser::{ContentParser, DEFAULT_EXECUTION_KEYWORDS, DEFAULT_IMAGE_WIDTH, is_plotting_code};

/// Language recorded for fences without a recognised language tag.
pub const PLAIN_LANGUAGE: &str = "plain";

/// One unit of generated material to insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        body: String,
    },
    Code {
        language: String,
        body: String,
    },
    Table {
        headers: Option<Vec<String>>,
        rows: Vec<Vec<String>>,
    },
    Image {
        path: PathBuf,
        width_hint: f64,
    },
}

impl ContentBlock {
    pub fn text(body: impl Into<String>) -> Self {
        ContentBlock::Text { body: body.into() }
    }

    pub fn code(language: impl Into<String>, body: impl Into<String>) -> Self {
        ContentBlock::Code { language: language.into(), body: body.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ContentBlock::Text { .. } => "text",
            ContentBlock::Code { .. } => "code",
            ContentBlock::Table { .. } => "table",
            ContentBlock::Image { .. } => "image",
        }
    }
}
