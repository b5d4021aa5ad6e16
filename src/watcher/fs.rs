//! Recursive `notify` subscription on the content root.
//!
//! Raw events are filtered (outside the root, hidden, excluded), translated
//! to [`FsEvent`]s relative to the root and forwarded to the route service
//! mailbox. File changes of every kind are coalesced per path before they
//! are forwarded; a directory moved into the tree is walked right away.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::routing::{ContentWalker, PathFilter};
use crate::service::RouteServiceHandle;

use super::FsEvent;
use super::debouncer::{ChangeKind, Debouncer};
use super::error::WatchError;

/// A filesystem change before debouncing and directory expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawChange {
    Created(PathBuf),
    Removed(PathBuf),
    Modified(PathBuf),
    /// Rename whose direction the platform did not report.
    Moved(PathBuf),
}

/// Translate one `notify` event into changes relative to `root`.
///
/// Paths outside `root`, the root itself, hidden paths and excluded
/// directories are dropped. Metadata and access events produce nothing.
pub fn translate_event(event: &Event, root: &Path, filter: &PathFilter) -> Vec<RawChange> {
    let relative = |path: &PathBuf| -> Option<PathBuf> {
        let rel = path.strip_prefix(root).ok()?;
        if rel.as_os_str().is_empty() || filter.is_ignored(rel) {
            return None;
        }
        Some(rel.to_path_buf())
    };

    let each = |make: fn(PathBuf) -> RawChange| -> Vec<RawChange> {
        event.paths.iter().filter_map(relative).map(make).collect()
    };

    match event.kind {
        EventKind::Create(_) => each(RawChange::Created),
        EventKind::Remove(_) => each(RawChange::Removed),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => each(RawChange::Removed),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => each(RawChange::Created),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut changes = Vec::with_capacity(2);
            if let Some(from) = event.paths.first().and_then(relative) {
                changes.push(RawChange::Removed(from));
            }
            if let Some(to) = event.paths.get(1).and_then(relative) {
                changes.push(RawChange::Created(to));
            }
            changes
        }
        EventKind::Modify(ModifyKind::Name(_)) => each(RawChange::Moved),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => each(RawChange::Modified),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

/// Watches the content root and feeds the route service.
pub struct FsWatcher {
    /// Canonical content root, as reported in event paths.
    root: PathBuf,
    filter: PathFilter,
    debouncer: Debouncer,
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    _watcher: RecommendedWatcher,
    sink: RouteServiceHandle,
}

impl FsWatcher {
    pub fn builder() -> FsWatcherBuilder {
        FsWatcherBuilder::new()
    }

    /// Run until cancelled or until the route service goes away.
    pub async fn watch(mut self, ct: CancellationToken) -> Result<(), WatchError> {
        crate::log_event!("watcher", "started", "{}", self.root.display());

        loop {
            let deadline = self.debouncer.next_deadline();
            let settle = tokio::time::sleep_until(
                deadline.map_or_else(Instant::now, Instant::from_std),
            );

            tokio::select! {
                _ = ct.cancelled() => {
                    crate::debug_event!("watcher", "stopped");
                    return Ok(());
                }

                res = self.event_rx.recv() => match res {
                    Some(Ok(event)) => self.handle_event(event).await?,
                    Some(Err(e)) => tracing::error!("[watcher] file watch error: {e}"),
                    None => return Err(WatchError::EventStreamClosed),
                },

                _ = settle, if deadline.is_some() => {
                    self.flush_ready().await?;
                }
            }
        }
    }

    async fn handle_event(&mut self, event: Event) -> Result<(), WatchError> {
        for change in translate_event(&event, &self.root, &self.filter) {
            crate::debug_event!("watcher", "raw", "{change:?}");
            match change {
                RawChange::Created(path) => self.added(path).await?,
                RawChange::Removed(path) => self.debouncer.record(path, ChangeKind::Removed),
                RawChange::Modified(path) => self.debouncer.record(path, ChangeKind::Changed),
                RawChange::Moved(path) => {
                    if self.root.join(&path).exists() {
                        self.added(path).await?;
                    } else {
                        self.debouncer.record(path, ChangeKind::Removed);
                    }
                }
            }
        }
        Ok(())
    }

    /// Forward settled paths. What is on disk now decides between a
    /// removal and an addition; the coalesced kind only says whether an
    /// existing file was replaced or merely written.
    async fn flush_ready(&mut self) -> Result<(), WatchError> {
        for (path, kind) in self.debouncer.take_ready() {
            let exists = self.root.join(&path).exists();
            let event = match kind {
                _ if !exists => FsEvent::Removed(path),
                ChangeKind::Changed => FsEvent::Changed(path),
                ChangeKind::Added | ChangeKind::Removed => FsEvent::Added(path),
            };
            self.send(event).await?;
        }
        Ok(())
    }

    /// A new entry. Files wait out the quiet period like any other change.
    /// Directories moved into the tree arrive as a single event, so their
    /// documents are discovered by walking them.
    async fn added(&mut self, path: PathBuf) -> Result<(), WatchError> {
        let absolute = self.root.join(&path);
        if !absolute.is_dir() {
            self.debouncer.record(path, ChangeKind::Added);
            return Ok(());
        }

        let walker = ContentWalker::new(self.filter.clone());
        let root = self.root.clone();
        let found = tokio::task::spawn_blocking(move || walker.walk(&root, &absolute))
            .await
            .map_err(|source| WatchError::Walk {
                path: path.clone(),
                source,
            })?;

        crate::debug_event!(
            "watcher",
            "directory added",
            "{} ({} documents)",
            path.display(),
            found.len()
        );
        for file in found {
            self.send(FsEvent::Added(file)).await?;
        }
        Ok(())
    }

    async fn send(&self, event: FsEvent) -> Result<(), WatchError> {
        self.sink
            .file_event(event)
            .await
            .map_err(WatchError::ServiceStopped)
    }
}

/// Builder for [`FsWatcher`].
pub struct FsWatcherBuilder {
    root: Option<PathBuf>,
    filter: Option<PathFilter>,
    sink: Option<RouteServiceHandle>,
    debounce_ms: u64,
}

impl FsWatcherBuilder {
    pub fn new() -> Self {
        Self {
            root: None,
            filter: None,
            sink: None,
            debounce_ms: 100,
        }
    }

    pub fn root(mut self, root: PathBuf) -> Self {
        self.root = Some(root);
        self
    }

    pub fn filter(mut self, filter: PathFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Mailbox that receives translated events.
    pub fn sink(mut self, sink: RouteServiceHandle) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Create the `notify` watcher and subscribe to the root recursively.
    pub fn build(self) -> Result<FsWatcher, WatchError> {
        let root = self.root.ok_or(WatchError::MissingOption("content root"))?;
        let sink = self.sink.ok_or(WatchError::MissingOption("route service handle"))?;
        let filter = self.filter.ok_or(WatchError::MissingOption("path filter"))?;

        // Event paths are reported against the resolved root (symlinks, /private on macOS)
        let root = root
            .canonicalize()
            .map_err(|source| WatchError::Canonicalize { path: root, source })?;

        let (tx, rx) = mpsc::channel(256);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|source| WatchError::Watch {
                path: root.clone(),
                source,
            })?;

        Ok(FsWatcher {
            root,
            filter,
            debouncer: Debouncer::new(self.debounce_ms),
            event_rx: rx,
            _watcher: watcher,
            sink,
        })
    }
}

impl Default for FsWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
