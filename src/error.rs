//! Error handling for Kiln
//!
//! Infrastructure failures (files, serialization, configuration). Editor
//! outcomes use the flat [`DiscError`] taxonomy instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::disc::DiscError;

/// Result type alias for Kiln infrastructure operations
pub type Result<T> = std::result::Result<T, KilnError>;

/// Main error type for Kiln infrastructure operations
#[derive(Error, Debug)]
pub enum KilnError {
    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory creation failed: {path}: {source}")]
    DirectoryCreateError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Serialization Errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {reason}")]
    Xml { reason: String },

    #[error("Invalid project schema version: {version}")]
    InvalidSchemaVersion { version: String },

    // Configuration Errors
    #[error("Invalid configuration in {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    // Editor Errors
    #[error("Disc operation failed: {0}")]
    Disc(#[from] DiscError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KilnError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            KilnError::FileNotFound { .. } => "FILE_NOT_FOUND",
            KilnError::FileReadError { .. } => "FILE_READ_ERROR",
            KilnError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            KilnError::DirectoryCreateError { .. } => "DIRECTORY_CREATE_ERROR",
            KilnError::Json(_) => "JSON_ERROR",
            KilnError::Xml { .. } => "XML_ERROR",
            KilnError::InvalidSchemaVersion { .. } => "INVALID_SCHEMA_VERSION",
            KilnError::Config { .. } => "CONFIG_ERROR",
            KilnError::Disc(code) => code.code(),
            KilnError::Io(_) => "IO_ERROR",
        }
    }

    /// Returns true if the operation can be retried later.
    pub fn is_retryable(&self) -> bool {
        match self {
            KilnError::FileWriteError { .. } => true,
            KilnError::Disc(code) => code.is_pending(),
            _ => false,
        }
    }

    /// Returns a user-friendly recovery suggestion.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            KilnError::FileNotFound { .. } => Some("Check the file path and try again."),
            KilnError::InvalidSchemaVersion { .. } => {
                Some("The project was written by an incompatible version of Kiln.")
            }
            KilnError::Config { .. } => {
                Some("Fix the configuration file or remove it to use the defaults.")
            }
            KilnError::Disc(DiscError::Loading) | KilnError::Disc(DiscError::NotReady) => {
                Some("Wait for the project to finish loading and try again.")
            }
            KilnError::Disc(DiscError::EmptySelection) => Some("Add some files to the project first."),
            KilnError::Disc(DiscError::Size) => {
                Some("Remove some files or insert a disc with more free space.")
            }
            _ => None,
        }
    }
}

/// Wrap any displayable XML failure.
pub(crate) fn xml_error(err: impl std::fmt::Display) -> KilnError {
    KilnError::Xml {
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = KilnError::FileNotFound {
            path: PathBuf::from("project.json"),
        };
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
        assert_eq!(
            KilnError::Disc(DiscError::Joliet).error_code(),
            "ERROR_JOLIET"
        );
    }

    #[test]
    fn test_pending_disc_errors_are_retryable() {
        assert!(KilnError::Disc(DiscError::Loading).is_retryable());
        assert!(!KilnError::Disc(DiscError::FileNotFound).is_retryable());
        assert!(KilnError::Disc(DiscError::NotReady)
            .recovery_suggestion()
            .is_some());
    }

    #[test]
    fn test_xml_error_keeps_reason() {
        let err = xml_error("unexpected end of document");
        assert_eq!(err.to_string(), "XML error: unexpected end of document");
    }
}
