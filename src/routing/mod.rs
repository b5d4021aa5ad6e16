//! Content routing: maps document files to URL routes.
//!
//! # Architecture
//!
//! ```text
//! PathFilter  -> accepts/rejects relative paths, derives routes
//! RouteTable  -> route -> RouteInfo (title, included files)
//!   DependencyIndex -> resolved included path -> dependent routes
//! ContentWalker -> initial recursive scan of the content root
//! ```

mod deps;
mod filter;
mod scan;
mod table;
mod types;

pub use deps::{DependencyIndex, normalize_lexically, resolve_included};
pub use filter::{Candidate, PathFilter, RESERVED_PREFIX, to_slash};
pub use scan::ContentWalker;
pub use table::RouteTable;
pub use types::{IncludedFile, NavEntry, Route, RouteInfo};
