use std::io;

use thiserror::Error;

/// Library-wide error type for docfill operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Configuration or environment issue.
    #[error("{0}")]
    Configuration(String),

    /// Configuration values failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The document container is unreadable or malformed.
    #[error("Malformed document: {0}")]
    Structural(String),

    /// A block index did not address an existing block.
    #[error("Block index {index} is out of range (document has {count} blocks)")]
    OutOfRange { index: usize, count: usize },

    /// The generative model call failed or returned nothing usable.
    #[error("Content generation failed: {0}")]
    Generation(String),

    /// Chart rendering failed.
    #[error("Chart rendering failed: {0}")]
    Render(String),

    /// Code compilation or execution failed.
    #[error("Code execution failed: {0}")]
    Execution(String),

    /// An image could not be embedded.
    #[error("Cannot embed image '{path}': {reason}")]
    Image { path: String, reason: String },

    /// Prompt template rendering failed.
    #[error("Prompt rendering failed: {0}")]
    Prompt(String),

    /// Parse error.
    #[error("Failed to parse {what}: {details}")]
    ParseError { what: String, details: String },

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
}

impl AppError {
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        AppError::Configuration(message.into())
    }

    pub fn structural<S: Into<String>>(message: S) -> Self {
        AppError::Structural(message.into())
    }

    /// Whether the failure is local to one insertion point and processing may continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Generation(_)
                | AppError::Render(_)
                | AppError::Execution(_)
                | AppError::Image { .. }
        )
    }

    /// Provide an `io::ErrorKind`-like view for callers mapping errors to exit codes.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            AppError::Io(err) => err.kind(),
            AppError::Configuration(_)
            | AppError::InvalidConfig(_)
            | AppError::Structural(_)
            | AppError::OutOfRange { .. }
            | AppError::ParseError { .. }
            | AppError::TomlParseError(_)
            | AppError::TomlSerializeError(_) => io::ErrorKind::InvalidInput,
            AppError::Image { .. } => io::ErrorKind::NotFound,
            AppError::Generation(_)
            | AppError::Render(_)
            | AppError::Execution(_)
            | AppError::Prompt(_) => io::ErrorKind::Other,
        }
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::Structural(format!("invalid document container: {err}"))
    }
}

impl From<quick_xml::Error> for AppError {
    fn from(err: quick_xml::Error) -> Self {
        AppError::Structural(format!("invalid document XML: {err}"))
    }
}
