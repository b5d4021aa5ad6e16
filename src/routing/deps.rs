//! Reverse dependency index: included path -> dependent routes.

use std::collections::{BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};

use super::types::RouteInfo;

/// Collapse `.` and `..` without touching the filesystem.
///
/// Deleted files must still resolve, so `canonicalize` is not an option.
/// A `..` that would climb above the root of an absolute path is dropped.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                Some(Component::ParentDir) | Some(Component::CurDir) | None => {
                    out.push("..");
                }
            },
            other => out.push(other.as_os_str()),
        }
    }

    out
}

/// Resolve an included path against the directory of its owning document.
pub fn resolve_included(owner_abs_path: &Path, included: &str) -> PathBuf {
    let base = owner_abs_path.parent().unwrap_or_else(|| Path::new(""));
    normalize_lexically(&base.join(included))
}

/// Inverse multimap of dependency edges across all routes.
///
/// Rebuilt from the forward sets on demand; the route table marks it stale
/// whenever any route's included files change.
#[derive(Debug, Default)]
pub struct DependencyIndex {
    dependents: HashMap<PathBuf, BTreeSet<String>>,
    stale: bool,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Recompute every edge from the given forward sets.
    pub fn rebuild<'a>(&mut self, routes: impl IntoIterator<Item = (&'a String, &'a RouteInfo)>) {
        self.dependents.clear();

        for (route, info) in routes {
            let Some(included) = &info.included_files else {
                continue;
            };
            for file in included {
                let resolved = resolve_included(&info.abs_path, file.path());
                self.dependents
                    .entry(resolved)
                    .or_default()
                    .insert(route.clone());
            }
        }

        self.stale = false;
    }

    /// Routes depending on an absolute, normalized path.
    pub fn dependents_of(&self, path: &Path) -> Option<&BTreeSet<String>> {
        self.dependents.get(path).filter(|routes| !routes.is_empty())
    }

    /// Number of distinct included paths.
    pub fn len(&self) -> usize {
        self.dependents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::IncludedFile;

    #[test]
    fn test_normalize_collapses_dots() {
        assert_eq!(
            normalize_lexically(Path::new("/docs/guide/../shared/./frag.adoc")),
            PathBuf::from("/docs/shared/frag.adoc")
        );
    }

    #[test]
    fn test_normalize_keeps_leading_parent_for_relative() {
        assert_eq!(
            normalize_lexically(Path::new("../a/../../b")),
            PathBuf::from("../../b")
        );
    }

    #[test]
    fn test_normalize_does_not_climb_above_root() {
        assert_eq!(
            normalize_lexically(Path::new("/../etc")),
            PathBuf::from("/etc")
        );
    }

    #[test]
    fn test_resolve_included_relative_to_owner_dir() {
        assert_eq!(
            resolve_included(Path::new("/docs/guide/setup.adoc"), "../shared/frag.adoc"),
            PathBuf::from("/docs/shared/frag.adoc")
        );
        assert_eq!(
            resolve_included(Path::new("/docs/intro.adoc"), "diagrams/flow.puml"),
            PathBuf::from("/docs/diagrams/flow.puml")
        );
    }

    #[test]
    fn test_rebuild_inverts_edges() {
        let a = (
            "/a".to_string(),
            RouteInfo {
                file: "a.adoc".into(),
                abs_path: PathBuf::from("/docs/a.adoc"),
                title: None,
                included_files: Some(vec![IncludedFile::include("shared.adoc")]),
            },
        );
        let b = (
            "/sub/b".to_string(),
            RouteInfo {
                file: "sub/b.adoc".into(),
                abs_path: PathBuf::from("/docs/sub/b.adoc"),
                title: None,
                included_files: Some(vec![
                    IncludedFile::include("../shared.adoc"),
                    IncludedFile::diagram("flow.d2"),
                ]),
            },
        );

        let mut index = DependencyIndex::new();
        index.invalidate();
        index.rebuild([(&a.0, &a.1), (&b.0, &b.1)]);

        assert!(!index.is_stale());
        assert_eq!(index.len(), 2);

        let shared: Vec<_> = index
            .dependents_of(Path::new("/docs/shared.adoc"))
            .unwrap()
            .iter()
            .cloned()
            .collect();
        assert_eq!(shared, vec!["/a".to_string(), "/sub/b".to_string()]);

        assert!(index.dependents_of(Path::new("/docs/sub/flow.d2")).is_some());
        assert!(index.dependents_of(Path::new("/docs/flow.d2")).is_none());
    }
}
