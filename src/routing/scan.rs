//! Recursive discovery of document files under the content root.
//!
//! Used once at startup and whenever a whole directory appears in a single
//! watch event (a directory moved into the tree).

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use super::filter::PathFilter;

/// Walks a directory tree for document files.
pub struct ContentWalker {
    filter: PathFilter,
}

impl ContentWalker {
    pub fn new(filter: PathFilter) -> Self {
        Self { filter }
    }

    /// Walk `dir` and return document paths relative to `root`.
    ///
    /// `dir` must be `root` or a directory beneath it.
    pub fn walk(&self, root: &Path, dir: &Path) -> Vec<PathBuf> {
        let excluded = self.filter.excluded_dirs().to_vec();

        let mut builder = WalkBuilder::new(dir);
        builder
            .hidden(true) // Skip dot-files and dot-directories
            .git_ignore(false) // The watcher does not honour .gitignore either
            .git_global(false)
            .git_exclude(false)
            .ignore(false)
            .parents(false)
            .follow_links(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                !(is_dir
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| excluded.iter().any(|dir| dir == name)))
            });

        let mut found: Vec<PathBuf> = builder
            .build()
            .filter_map(Result::ok) // Skip entries we can't access
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .filter_map(|entry| {
                let relative = entry.path().strip_prefix(root).ok()?.to_path_buf();
                self.filter.classify(&relative).map(|_| relative)
            })
            .collect();

        found.sort();
        found
    }
}
