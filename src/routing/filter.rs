//! Path classification and route derivation.
//!
//! All functions work on `Path` components rather than strings so that
//! Windows separators produce the same routes as Unix ones.

use std::path::{Component, Path};

/// URL prefix reserved for the server's own assets and endpoints.
///
/// A top-level directory with this name is never routed.
pub const RESERVED_PREFIX: &str = "__ads";

/// A path accepted by [`PathFilter::classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// `/`-prefixed route with the extension stripped.
    pub route: String,
    /// `/`-separated relative file path.
    pub file: String,
}

/// Decides which relative paths are trackable documents.
#[derive(Debug, Clone)]
pub struct PathFilter {
    /// Document extensions without the leading dot.
    extensions: Vec<String>,
    /// Directory names excluded at any depth.
    excluded_dirs: Vec<String>,
}

impl PathFilter {
    pub fn new<E, D>(extensions: E, excluded_dirs: D) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_string())
                .filter(|ext| !ext.is_empty())
                .collect(),
            excluded_dirs: excluded_dirs
                .into_iter()
                .map(|dir| dir.as_ref().to_string())
                .collect(),
        }
    }

    pub fn excluded_dirs(&self) -> &[String] {
        &self.excluded_dirs
    }

    /// True if any path segment starts with a dot.
    pub fn is_hidden(path: &Path) -> bool {
        path.components().any(|component| match component {
            Component::Normal(name) => name.to_string_lossy().starts_with('.'),
            _ => false,
        })
    }

    /// True if any path segment is an excluded directory name.
    pub fn is_excluded(&self, path: &Path) -> bool {
        path.components().any(|component| match component {
            Component::Normal(name) => {
                let name = name.to_string_lossy();
                self.excluded_dirs.iter().any(|dir| *dir == name)
            }
            _ => false,
        })
    }

    /// Subscription-level filter: hidden paths and excluded directories.
    ///
    /// Unlike [`classify`](Self::classify) this does not look at the
    /// extension, since included fragments and diagram sources may have any.
    pub fn is_ignored(&self, path: &Path) -> bool {
        Self::is_hidden(path) || self.is_excluded(path)
    }

    /// True if the file extension is one of the document extensions.
    pub fn is_document(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|known| known == ext))
    }

    /// Classify a path relative to the content root.
    ///
    /// Returns `None` for hidden files, excluded directories, the reserved
    /// prefix, non-document extensions, non-UTF-8 names, and anything that
    /// is not a plain relative path.
    pub fn classify(&self, relative: &Path) -> Option<Candidate> {
        if self.is_ignored(relative) || !self.is_document(relative) {
            return None;
        }

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => segments.push(name.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }

        if segments.first() == Some(&RESERVED_PREFIX) {
            return None;
        }

        let (name, dirs) = segments.split_last()?;
        let stem = Path::new(name).file_stem()?.to_str()?;

        let mut route = String::from("/");
        for dir in dirs {
            route.push_str(dir);
            route.push('/');
        }
        route.push_str(stem);

        Some(Candidate {
            route,
            file: segments.join("/"),
        })
    }
}

/// Render a relative path with `/` separators.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
