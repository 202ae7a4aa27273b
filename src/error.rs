//! Error types for the migration library.
//!
//! Every failure is fatal for the current run: the driver never retries and
//! never isolates a failing document, so callers simply propagate with `?`.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MigrateError>;

#[derive(Error, Debug)]
pub enum MigrateError {
    /// A required setting is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse descriptor '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Attachment not found: {path}")]
    AttachmentNotFound { path: PathBuf },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk input folder: {0}")]
    Walk(#[from] walkdir::Error),

    /// The Paperless API answered with a non-2xx status.
    #[error("{action}: {status}")]
    Upload { action: String, status: StatusCode },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl MigrateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MigrateError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn upload(action: impl Into<String>, status: StatusCode) -> Self {
        MigrateError::Upload {
            action: action.into(),
            status,
        }
    }
}
