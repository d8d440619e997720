//! # Error Types
//!
//! Structured error types for memorial_core. The dimensioning and summary
//! calculations themselves never fail; errors come from the surfaces around
//! them: policy validation, memorial editing, file I/O and PDF rendering.
//!
//! ## Example
//!
//! ```rust
//! use memorial_core::errors::{CalcError, CalcResult};
//!
//! fn validate_margin(margin: f64) -> CalcResult<()> {
//!     if margin <= 0.0 {
//!         return Err(CalcError::InvalidInput {
//!             field: "cable_ampacity_margin".to_string(),
//!             value: margin.to_string(),
//!             reason: "Margin must be positive".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for memorial_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for memorial operations.
///
/// Each variant carries enough context to be reported verbatim by the CLI
/// or serialized to JSON for other consumers.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (out of range, unordered table, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// Motor rating not present in the catalog
    #[error("Motor not found in catalog: {cv} cv")]
    MotorNotFound { cv: f64 },

    /// No page with this id in the memorial
    #[error("Page not found: {page_id}")]
    PageNotFound { page_id: String },

    /// No block with this id in the memorial
    #[error("Block not found: {block_id}")]
    BlockNotFound { block_id: String },

    /// The memorial is locked against edits
    #[error("Memorial is locked: {operation} not allowed")]
    DocumentLocked { operation: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// External text generation failed
    #[error("Text generation failed: {reason}")]
    GenerationFailed { reason: String },

    /// Typst compilation or PDF export failed
    #[error("Render failed: {stage} - {reason}")]
    RenderFailed { stage: String, reason: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MotorNotFound error
    pub fn motor_not_found(cv: f64) -> Self {
        CalcError::MotorNotFound { cv }
    }

    /// Create a PageNotFound error
    pub fn page_not_found(page_id: impl ToString) -> Self {
        CalcError::PageNotFound {
            page_id: page_id.to_string(),
        }
    }

    /// Create a BlockNotFound error
    pub fn block_not_found(block_id: impl ToString) -> Self {
        CalcError::BlockNotFound {
            block_id: block_id.to_string(),
        }
    }

    /// Create a DocumentLocked error
    pub fn document_locked(operation: impl Into<String>) -> Self {
        CalcError::DocumentLocked {
            operation: operation.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        CalcError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a RenderFailed error
    pub fn render_failed(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::RenderFailed {
            stage: stage.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CalcError::FileLocked { .. } | CalcError::GenerationFailed { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MotorNotFound { .. } => "MOTOR_NOT_FOUND",
            CalcError::PageNotFound { .. } => "PAGE_NOT_FOUND",
            CalcError::BlockNotFound { .. } => "BLOCK_NOT_FOUND",
            CalcError::DocumentLocked { .. } => "DOCUMENT_LOCKED",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::FileLocked { .. } => "FILE_LOCKED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::GenerationFailed { .. } => "GENERATION_FAILED",
            CalcError::RenderFailed { .. } => "RENDER_FAILED",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(e: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_input("contactor_margin", "-1.25", "Margin must be positive");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidInput\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::motor_not_found(9999.0).error_code(), "MOTOR_NOT_FOUND");
        assert_eq!(CalcError::document_locked("remove block").error_code(), "DOCUMENT_LOCKED");
        assert_eq!(CalcError::block_not_found("b1").error_code(), "BLOCK_NOT_FOUND");
    }

    #[test]
    fn test_motor_not_found_message() {
        let error = CalcError::motor_not_found(9999.0);
        assert_eq!(error.to_string(), "Motor not found in catalog: 9999 cv");
    }

    #[test]
    fn test_recoverable() {
        assert!(CalcError::file_locked("a.mdt", "someone", "now").is_recoverable());
        assert!(!CalcError::page_not_found("p1").is_recoverable());
    }
}
