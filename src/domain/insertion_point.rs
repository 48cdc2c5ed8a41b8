//! Located positions awaiting generated content.

use std::fmt;

use serde::Serialize;

use crate::domain::content::ContentBlock;

const SUMMARY_CHARS: usize = 60;

/// A position after which generated content will be spliced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertionPoint {
    /// Block index after which content goes; re-based as earlier points are filled.
    pub anchor_index: usize,
    /// What the position asks for.
    pub description: String,
    pub context_before: String,
    pub context_after: String,
    pub filled: bool,
    pub inserted_block_count: usize,
    /// Blocks that made it into the document.
    pub content: Vec<ContentBlock>,
}

impl InsertionPoint {
    pub fn new(anchor_index: usize, description: impl Into<String>) -> Self {
        Self {
            anchor_index,
            description: description.into(),
            context_before: String::new(),
            context_after: String::new(),
            filled: false,
            inserted_block_count: 0,
            content: Vec::new(),
        }
    }

    pub fn with_context(mut self, before: impl Into<String>, after: impl Into<String>) -> Self {
        self.context_before = before.into();
        self.context_after = after.into();
        self
    }

    /// Description cut to a display-friendly length.
    pub fn summary(&self) -> String {
        let mut chars = self.description.chars();
        let head: String = chars.by_ref().take(SUMMARY_CHARS).collect();
        if chars.next().is_some() { format!("{head}...") } else { head }
    }
}

impl fmt::Display for InsertionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.anchor_index, self.summary())
    }
}
