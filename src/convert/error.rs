//! Error types for document conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from rendering or scanning a document.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch converter '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Converter exited with {status} for {path}: {stderr}")]
    Failed {
        path: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("Converter produced no output for {path}")]
    EmptyOutput { path: PathBuf },

    #[error("Converter output for {path} is not valid UTF-8")]
    InvalidUtf8 { path: PathBuf },
}
