pub mod completion;
pub mod configuration;
pub mod content;
pub mod document;
mod error;
pub mod insertion;
pub mod insertion_point;
pub mod locator;
pub mod prompt;

pub use completion::CompletionStatus;
pub use configuration::{AppConfig, LocatorStrategy};
pub use content::{ContentBlock, ContentParser};
pub use document::{Block, BlockKind, DocumentModel, RenderableBlock};
pub use error::AppError;
pub use insertion::InsertionEngine;
pub use insertion_point::InsertionPoint;
pub use locator::{AssistedLocator, PatternLocator, PositionLocator};
