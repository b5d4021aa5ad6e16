//! Filesystem watching for the content root.
//!
//! # Architecture
//!
//! ```text
//! notify::RecommendedWatcher (recursive)
//!   -> FsWatcher: filter, translate, debounce
//!   -> route service mailbox (FsEvent)
//!   -> ChangeNotifier: RouteTable update + ServerEvent broadcast
//! ```

mod debouncer;
mod error;
mod fs;
mod notifier;

use std::path::PathBuf;

pub use debouncer::{ChangeKind, Debouncer};
pub use error::WatchError;
pub use fs::{FsWatcher, FsWatcherBuilder, RawChange, translate_event};
pub use notifier::ChangeNotifier;

/// A settled filesystem change, relative to the content root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    Added(PathBuf),
    Changed(PathBuf),
    /// A file or a whole directory is gone.
    Removed(PathBuf),
}

