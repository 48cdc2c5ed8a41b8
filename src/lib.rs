//! docfill: locate fill-in positions in Word documents and complete them with generated content.

pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;

#[cfg(test)]
pub(crate) mod testing;

pub use app::AppContext;
pub use app::api::{
    GeneratorMode, InfoReport, ProcessOptions, ProcessOutcome, info, load_config, process,
    process_with, save_config,
};
pub use domain::{
    AppConfig, AppError, Block, BlockKind, CompletionStatus, ContentBlock, DocumentModel,
    InsertionEngine, InsertionPoint, LocatorStrategy,
};
