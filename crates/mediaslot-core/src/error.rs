//! Error types for mediaslot

use thiserror::Error;

/// The main error type for mediaslot operations
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Slot not found: {0}")]
    SlotNotFound(String),

    #[error("File not found in slot '{slot}': {filename}")]
    FileNotFound { slot: String, filename: String },

    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Manifest invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Generation error: {0}")]
    GenerationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),
}

impl MediaError {
    /// True for errors caused by an unknown slot or candidate
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MediaError::SlotNotFound(_) | MediaError::FileNotFound { .. }
        )
    }

    /// True for errors caused by a malformed request
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MediaError::MissingRequiredField(_) | MediaError::ValidationError(_)
        )
    }
}

/// Result type alias for mediaslot operations
pub type Result<T> = std::result::Result<T, MediaError>;

impl From<serde_json::Error> for MediaError {
    fn from(err: serde_json::Error) -> Self {
        MediaError::JsonError(err.to_string())
    }
}

impl From<toml::de::Error> for MediaError {
    fn from(err: toml::de::Error) -> Self {
        MediaError::TomlParseError(err.to_string())
    }
}
