//! The route table: authoritative route -> document mapping.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::convert::Converter;

use super::deps::{DependencyIndex, normalize_lexically};
use super::filter::PathFilter;
use super::types::{IncludedFile, NavEntry, Route, RouteInfo};

/// Maps routes to documents under one content root.
///
/// Owned by a single writer (the route service loop). Entries are kept in
/// route order so navigation listings come out sorted.
pub struct RouteTable {
    /// Absolute content root.
    root: PathBuf,
    filter: PathFilter,
    converter: Arc<dyn Converter>,
    routes: BTreeMap<String, RouteInfo>,
    index: DependencyIndex,
}

impl RouteTable {
    /// Create an empty table. `root` should be absolute.
    pub fn new(root: PathBuf, filter: PathFilter, converter: Arc<dyn Converter>) -> Self {
        Self {
            root: normalize_lexically(&root),
            filter,
            converter,
            routes: BTreeMap::new(),
            index: DependencyIndex::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn filter(&self) -> &PathFilter {
        &self.filter
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// All routes in route order.
    pub fn routes(&self) -> impl Iterator<Item = Route> + '_ {
        self.routes.iter().map(|(route, info)| Route {
            route: route.clone(),
            info: info.clone(),
        })
    }

    /// Insert a document by its path relative to the content root.
    ///
    /// Returns the new route, or `None` if the path is not a document or
    /// the route is already taken.
    pub fn insert(&mut self, relative: impl AsRef<Path>) -> Option<Route> {
        let relative = relative.as_ref();
        let Some(candidate) = self.filter.classify(relative) else {
            crate::debug_event!("router", "skipped", "{}", relative.display());
            return None;
        };

        if let Some(existing) = self.routes.get(&candidate.route) {
            if existing.file == candidate.file {
                crate::debug_event!(
                    "router",
                    "already routed",
                    "{} on {}",
                    candidate.file,
                    candidate.route
                );
            } else {
                tracing::warn!(
                    "[router] route {} already served by {}, ignoring {}",
                    candidate.route,
                    existing.file,
                    candidate.file
                );
            }
            return None;
        }

        let abs_path = self.root.join(relative);
        let (title, included_files) = self.load_metadata(&abs_path);
        let info = RouteInfo {
            file: candidate.file,
            abs_path,
            title,
            included_files,
        };

        if info.included_files.is_some() {
            self.index.invalidate();
        }

        crate::debug_event!("router", "inserted", "{} on {}", info.file, candidate.route);
        self.routes.insert(candidate.route.clone(), info.clone());

        Some(Route {
            route: candidate.route,
            info,
        })
    }

    /// Remove the route owned by a file. Returns whether anything was removed.
    pub fn remove_by_file(&mut self, relative: impl AsRef<Path>) -> bool {
        let relative = relative.as_ref();
        let Some(candidate) = self.filter.classify(relative) else {
            return false;
        };

        let owned = self
            .routes
            .get(&candidate.route)
            .is_some_and(|info| info.file == candidate.file);

        if !owned {
            crate::debug_event!("router", "not routed", "{}", candidate.file);
            return false;
        }

        if let Some(info) = self.routes.remove(&candidate.route)
            && info.included_files.is_some()
        {
            self.index.invalidate();
        }
        crate::debug_event!("router", "removed", "{} from {}", candidate.file, candidate.route);
        true
    }

    /// Remove every route whose file lives under a directory.
    ///
    /// Used when a whole directory disappears in one filesystem event.
    pub fn remove_under(&mut self, relative_dir: impl AsRef<Path>) -> Vec<Route> {
        let prefix = super::filter::to_slash(relative_dir.as_ref());
        if prefix.is_empty() {
            return Vec::new();
        }
        let prefix = format!("{prefix}/");

        let doomed: Vec<String> = self
            .routes
            .iter()
            .filter(|(_, info)| info.file.starts_with(&prefix))
            .map(|(route, _)| route.clone())
            .collect();

        let mut removed = Vec::with_capacity(doomed.len());
        for route in doomed {
            if let Some(info) = self.routes.remove(&route) {
                crate::debug_event!("router", "removed", "{} from {}", info.file, route);
                removed.push(Route { route, info });
            }
        }

        if !removed.is_empty() {
            self.index.invalidate();
        }
        removed
    }

    /// Absolute path of the document serving a route.
    pub fn absolute_path(&self, route: &str) -> Option<&Path> {
        self.routes.get(route).map(|info| info.abs_path.as_path())
    }

    /// Stored entry for a route, without refreshing metadata.
    pub fn get(&self, route: &str) -> Option<Route> {
        self.routes.get(route).map(|info| Route {
            route: route.to_string(),
            info: info.clone(),
        })
    }

    /// Entry for a route with its metadata re-derived from disk.
    pub fn get_fresh(&mut self, route: &str) -> Option<Route> {
        self.refresh(route);
        self.get(route)
    }

    /// Look up the route owned by a file, refreshing its metadata first.
    pub fn get_by_file(&mut self, relative: impl AsRef<Path>) -> Option<Route> {
        let candidate = self.filter.classify(relative.as_ref())?;
        let owned = self
            .routes
            .get(&candidate.route)
            .is_some_and(|info| info.file == candidate.file);
        if !owned {
            return None;
        }

        self.refresh(&candidate.route);
        self.routes.get(&candidate.route).map(|info| Route {
            route: candidate.route,
            info: info.clone(),
        })
    }

    /// All routes whose documents pull in the given absolute path.
    ///
    /// Every route's metadata is re-derived first, so an include added by
    /// the very edit being processed is already visible.
    pub fn routes_depending_on(&mut self, included_abs_path: &Path) -> Option<Vec<Route>> {
        let keys: Vec<String> = self.routes.keys().cloned().collect();
        for route in &keys {
            self.refresh(route);
        }

        if self.index.is_stale() {
            self.index.rebuild(self.routes.iter());
            crate::debug_event!(
                "router",
                "dependency index rebuilt",
                "{} included paths",
                self.index.len()
            );
        }

        let target = normalize_lexically(included_abs_path);
        let dependents = self.index.dependents_of(&target)?;

        let found: Vec<Route> = dependents
            .iter()
            .filter_map(|route| {
                self.routes.get(route).map(|info| Route {
                    route: route.clone(),
                    info: info.clone(),
                })
            })
            .collect();

        if found.is_empty() { None } else { Some(found) }
    }

    /// Navigation listing in route order.
    pub fn navigation(&self) -> Vec<NavEntry> {
        self.routes().map(|route| NavEntry::from(&route)).collect()
    }

    /// Re-derive one entry's metadata, invalidating the index if its
    /// dependency set changed.
    fn refresh(&mut self, route: &str) {
        let Some(abs_path) = self.routes.get(route).map(|info| info.abs_path.clone()) else {
            return;
        };
        let (title, included_files) = self.load_metadata(&abs_path);

        if let Some(info) = self.routes.get_mut(route) {
            if info.included_files != included_files {
                info.included_files = included_files;
                self.index.invalidate();
            }
            info.title = title;
        }
    }

    fn load_metadata(&self, abs_path: &Path) -> (Option<String>, Option<Vec<IncludedFile>>) {
        match self.converter.metadata(abs_path) {
            Ok(metadata) => {
                let included = if metadata.included_files.is_empty() {
                    None
                } else {
                    Some(metadata.included_files)
                };
                (metadata.title, included)
            }
            Err(e) => {
                tracing::warn!("[router] cannot read metadata of {}: {e}", abs_path.display());
                (None, None)
            }
        }
    }
}
