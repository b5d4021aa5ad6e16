//! HTTP front end: document pages, reserved assets and the live-update
//! WebSocket.

mod assets;
mod handlers;
mod pages;
mod websocket;

pub use assets::{Asset, ReservedAssets, WS_PATH};
pub use handlers::request_route;
pub use pages::{PageRenderer, escape_html, render_navigation};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::convert::{AsciidoctorConverter, Converter};
use crate::notifications::NotificationBroadcaster;
use crate::routing::{PathFilter, RESERVED_PREFIX, RouteTable};
use crate::service::{RouteService, RouteServiceHandle, initial_scan};
use crate::watcher::{ChangeNotifier, FsWatcher};

/// State shared by every handler.
pub struct AppState {
    pub routes: RouteServiceHandle,
    pub converter: Arc<dyn Converter>,
    pub broadcaster: NotificationBroadcaster,
    pub pages: PageRenderer,
    pub assets: ReservedAssets,
    /// Canonical content root
    pub content_root: PathBuf,
    pub filter: PathFilter,
    pub health_path: String,
}

impl AppState {
    pub fn new(
        routes: RouteServiceHandle,
        converter: Arc<dyn Converter>,
        broadcaster: NotificationBroadcaster,
        content_root: PathBuf,
        filter: PathFilter,
        health_path: impl Into<String>,
    ) -> Self {
        let health_path = health_path.into();
        Self {
            routes,
            converter,
            broadcaster,
            pages: PageRenderer::default(),
            assets: ReservedAssets::new(&health_path),
            content_root,
            filter,
            health_path,
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route(&state.health_path, get(handlers::health))
        .route(WS_PATH, get(websocket::ws_handler))
        .route(&format!("/{RESERVED_PREFIX}/{{*asset}}"), get(handlers::asset))
        .fallback(handlers::page)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Options for [`serve`] that come from the command line.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub root: PathBuf,
    pub watch: bool,
}

/// Run the preview server until Ctrl+C.
///
/// Startup order: route service, watcher, initial scan, listener. The
/// watcher subscribes before the scan so no change is missed in between;
/// duplicate additions are no-ops in the route table.
pub async fn serve(settings: Settings, options: ServeOptions) -> anyhow::Result<()> {
    let root = options
        .root
        .canonicalize()
        .with_context(|| format!("no such directory: {}", options.root.display()))?;
    anyhow::ensure!(root.is_dir(), "path {} is not a directory", root.display());
    anyhow::ensure!(
        settings.server.health_path.starts_with('/'),
        "health path must start with '/': {}",
        settings.server.health_path
    );

    let filter = PathFilter::new(
        &settings.content.extensions,
        &settings.content.excluded_dirs,
    );
    let converter: Arc<dyn Converter> =
        Arc::new(AsciidoctorConverter::new(&settings.converter));
    let broadcaster = NotificationBroadcaster::new(64);

    let table = RouteTable::new(root.clone(), filter.clone(), Arc::clone(&converter));
    let notifier = ChangeNotifier::new(table, Arc::new(broadcaster.clone()));
    let (service, handle) = RouteService::new(notifier, 256);

    let ct = CancellationToken::new();
    tokio::spawn(service.run(ct.child_token()));

    if options.watch && settings.watch.enabled {
        let built = FsWatcher::builder()
            .root(root.clone())
            .filter(filter.clone())
            .sink(handle.clone())
            .debounce_ms(settings.watch.debounce_ms)
            .build();

        match built {
            Ok(watcher) => {
                let watcher_ct = ct.child_token();
                tokio::spawn(async move {
                    if let Err(e) = watcher.watch(watcher_ct).await {
                        tracing::error!("[watcher] error: {e}");
                    }
                });
                crate::log_event!(
                    "watcher",
                    "enabled",
                    "debounce: {}ms",
                    settings.watch.debounce_ms
                );
            }
            Err(e) => {
                tracing::warn!("[watcher] failed to start: {e}");
                tracing::warn!("[watcher] continuing without live updates");
            }
        }
    }

    let count = initial_scan(&handle, root.clone(), filter.clone()).await?;
    crate::log_event!("router", "initial scan", "{count} documents under {}", root.display());

    let state = Arc::new(AppState::new(
        handle,
        converter,
        broadcaster,
        root,
        filter,
        settings.server.health_path.clone(),
    ));
    let app = router(state);

    let bind = format!("{}:{}", settings.server.bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("cannot bind {bind}"))?;
    let local: SocketAddr = listener.local_addr()?;
    crate::log_event!("server", "listening", "http://{local}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(ct.clone()))
        .await?;

    ct.cancel();
    crate::log_event!("server", "stopped");
    Ok(())
}

/// Resolves on Ctrl+C or when `ct` is cancelled, cancelling `ct` either way.
async fn shutdown_signal(ct: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("[server] cannot listen for ctrl+c: {e}");
                // Keep serving until cancelled some other way
                ct.cancelled().await;
            }
        }
        _ = ct.cancelled() => {}
    }
    crate::log_event!("server", "shutting down");
    ct.cancel();
}
