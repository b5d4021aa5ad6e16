//! The route service: single owner of the route table.
//!
//! Filesystem events, the initial scan and HTTP lookups all arrive as
//! [`RouteMessage`]s on one mailbox and are handled to completion in
//! arrival order. Nothing else holds the table, so no lock guards it.

use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::routing::{ContentWalker, NavEntry, PathFilter, Route};
use crate::watcher::{ChangeNotifier, FsEvent};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Route service is not running")]
    MailboxClosed,

    #[error("Initial scan failed: {0}")]
    Scan(String),
}

/// Everything a page handler needs to render one document.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Display file name, relative to the content root
    pub file: String,
    pub abs_path: PathBuf,
    pub title: Option<String>,
    pub navigation: Vec<NavEntry>,
}

/// Requests handled by the route service loop.
#[derive(Debug)]
pub enum RouteMessage {
    /// A settled filesystem change.
    Fs(FsEvent),
    /// Documents found by the startup scan. Inserted without notifications.
    Scanned(Vec<PathBuf>),
    Resolve {
        route: String,
        reply: oneshot::Sender<Option<Resolution>>,
    },
    Navigation {
        reply: oneshot::Sender<Vec<NavEntry>>,
    },
    Routes {
        reply: oneshot::Sender<Vec<Route>>,
    },
}

/// Cloneable sender side of the mailbox.
#[derive(Clone, Debug)]
pub struct RouteServiceHandle {
    tx: mpsc::Sender<RouteMessage>,
}

impl RouteServiceHandle {
    pub async fn file_event(&self, event: FsEvent) -> Result<(), ServiceError> {
        self.send(RouteMessage::Fs(event)).await
    }

    pub async fn scanned(&self, files: Vec<PathBuf>) -> Result<(), ServiceError> {
        self.send(RouteMessage::Scanned(files)).await
    }

    /// Look up the document serving a route.
    pub async fn resolve(&self, route: impl Into<String>) -> Result<Option<Resolution>, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(RouteMessage::Resolve {
            route: route.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| ServiceError::MailboxClosed)
    }

    pub async fn navigation(&self) -> Result<Vec<NavEntry>, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(RouteMessage::Navigation { reply }).await?;
        rx.await.map_err(|_| ServiceError::MailboxClosed)
    }

    pub async fn routes(&self) -> Result<Vec<Route>, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(RouteMessage::Routes { reply }).await?;
        rx.await.map_err(|_| ServiceError::MailboxClosed)
    }

    async fn send(&self, message: RouteMessage) -> Result<(), ServiceError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| ServiceError::MailboxClosed)
    }
}

/// Event loop owning the [`ChangeNotifier`] and, through it, the route table.
pub struct RouteService {
    notifier: ChangeNotifier,
    rx: mpsc::Receiver<RouteMessage>,
}

impl RouteService {
    pub fn new(notifier: ChangeNotifier, capacity: usize) -> (Self, RouteServiceHandle) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { notifier, rx }, RouteServiceHandle { tx })
    }

    /// Process messages until cancelled or until every handle is dropped.
    pub async fn run(mut self, ct: CancellationToken) {
        crate::debug_event!("service", "started");

        loop {
            tokio::select! {
                _ = ct.cancelled() => {
                    crate::debug_event!("service", "stopped");
                    break;
                }
                message = self.rx.recv() => match message {
                    Some(message) => self.handle(message),
                    None => {
                        crate::debug_event!("service", "all handles dropped");
                        break;
                    }
                },
            }
        }
    }

    /// Handle one message to completion.
    pub fn handle(&mut self, message: RouteMessage) {
        match message {
            RouteMessage::Fs(event) => {
                self.notifier.handle(&event);
            }
            RouteMessage::Scanned(files) => {
                let table = self.notifier.table_mut();
                let inserted = files
                    .iter()
                    .filter(|file| table.insert(file).is_some())
                    .count();
                crate::log_event!(
                    "router",
                    "scanned",
                    "{inserted} documents ({} routes total)",
                    table.len()
                );
            }
            RouteMessage::Resolve { route, reply } => {
                // The page about to be rendered carries the title on disk now
                let table = self.notifier.table_mut();
                let resolution = table.get_fresh(&route).map(|found| Resolution {
                    file: found.info.file,
                    abs_path: found.info.abs_path,
                    title: found.info.title,
                    navigation: table.navigation(),
                });
                let _ = reply.send(resolution);
            }
            RouteMessage::Navigation { reply } => {
                let _ = reply.send(self.notifier.table().navigation());
            }
            RouteMessage::Routes { reply } => {
                let _ = reply.send(self.notifier.table().routes().collect());
            }
        }
    }
}

/// Scan the content root on a blocking thread and queue the results.
pub async fn initial_scan(
    handle: &RouteServiceHandle,
    root: PathBuf,
    filter: PathFilter,
) -> Result<usize, ServiceError> {
    let files = tokio::task::spawn_blocking(move || ContentWalker::new(filter).walk(&root, &root))
        .await
        .map_err(|e| ServiceError::Scan(e.to_string()))?;

    let count = files.len();
    handle.scanned(files).await?;
    Ok(count)
}
