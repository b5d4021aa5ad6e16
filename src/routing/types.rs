//! Route table value types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A file pulled into a document.
///
/// `path` is kept exactly as written in the source, relative to the owning
/// document's directory. Attribute references such as `{includedir}` are not
/// expanded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IncludedFile {
    /// `include::path[]` directive.
    Include { path: String },
    /// Diagram macro (`plantuml::path[]`, `d2::path[]`, ...).
    Diagram { path: String },
}

impl IncludedFile {
    pub fn include(path: impl Into<String>) -> Self {
        IncludedFile::Include { path: path.into() }
    }

    pub fn diagram(path: impl Into<String>) -> Self {
        IncludedFile::Diagram { path: path.into() }
    }

    pub fn path(&self) -> &str {
        match self {
            IncludedFile::Include { path } | IncludedFile::Diagram { path } => path,
        }
    }
}

/// Metadata stored for each route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// Path relative to the content root, `/`-separated. Doubles as the display name.
    pub file: String,
    /// Absolute path on disk.
    pub abs_path: PathBuf,
    pub title: Option<String>,
    /// `None` when the document pulls nothing in.
    pub included_files: Option<Vec<IncludedFile>>,
}

/// A route together with its metadata, as returned by lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub route: String,
    pub info: RouteInfo,
}

impl Route {
    pub fn file(&self) -> &str {
        &self.info.file
    }

    pub fn title(&self) -> Option<&str> {
        self.info.title.as_deref()
    }
}

/// One navigation entry rendered into page shells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub route: String,
    pub file: String,
    pub title: Option<String>,
}

impl From<&Route> for NavEntry {
    fn from(route: &Route) -> Self {
        Self {
            route: route.route.clone(),
            file: route.info.file.clone(),
            title: route.info.title.clone(),
        }
    }
}
