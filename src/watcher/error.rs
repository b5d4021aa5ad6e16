//! Error types for the filesystem watcher.

use std::path::PathBuf;
use thiserror::Error;

use crate::service::ServiceError;

/// Errors from setting up or running the content root watch.
#[derive(Error, Debug)]
pub enum WatchError {
    /// A required builder option was never set.
    #[error("watcher is missing its {0}")]
    MissingOption(&'static str),

    #[error("cannot resolve content root {path}")]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot watch {path}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The backend dropped its event sender.
    #[error("notify event stream closed")]
    EventStreamClosed,

    #[error("walking new directory {path} failed")]
    Walk {
        path: PathBuf,
        #[source]
        source: tokio::task::JoinError,
    },

    /// Events can no longer be delivered.
    #[error("cannot forward events")]
    ServiceStopped(#[source] ServiceError),

    #[error("notify backend error")]
    Backend(#[from] notify::Error),
}
