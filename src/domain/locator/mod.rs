//! Strategies that find where generated content is needed.

mod assisted;
mod pattern;

use crate::domain::document::DocumentModel;
use crate::domain::insertion_point::InsertionPoint;

pub use assisted::AssistedLocator;
pub use pattern::{
    BlankRule, KeywordClauseRule, NumberedRequirementRule, PatternLocator, PatternRule,
    QuestionRule,
};

/// Non-empty blocks taken on each side of an anchor for prompt context.
pub const DEFAULT_CONTEXT_BLOCKS: usize = 5;

/// Produces insertion points for a document.
///
/// Points must come out in non-decreasing anchor order; re-basing relies on it.
pub trait PositionLocator {
    fn locate(&self, model: &DocumentModel) -> Vec<InsertionPoint>;
}

/// Text of up to `size` non-empty blocks before and after `anchor`.
pub fn context_window(model: &DocumentModel, anchor: usize, size: usize) -> (String, String) {
    model.context_around(anchor, size, size)
}
