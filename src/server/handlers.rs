//! Request handlers.

use std::path::{Component, Path};
use std::sync::Arc;

use axum::extract::{self, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use percent_encoding::percent_decode_str;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::routing::PathFilter;
use crate::service::{Resolution, ServiceError};

use super::AppState;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn home(State(state): State<Arc<AppState>>) -> Response {
    match state.routes.navigation().await {
        Ok(navigation) => Html(state.pages.home(&navigation)).into_response(),
        Err(e) => unavailable(e),
    }
}

pub async fn asset(
    State(state): State<Arc<AppState>>,
    extract::Path(name): extract::Path<String>,
) -> Response {
    match state.assets.get(&name) {
        Some(asset) => ([(header::CONTENT_TYPE, asset.content_type)], asset.body).into_response(),
        None => (StatusCode::NOT_FOUND, format!("asset {name} not found")).into_response(),
    }
}

/// Everything not matched by a fixed route: documents, then static files,
/// then the not-found page.
pub async fn page(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let decoded = percent_decode_str(request.uri().path())
        .decode_utf8_lossy()
        .into_owned();
    let route = request_route(&decoded, &state.filter);

    match state.routes.resolve(route).await {
        Ok(Some(resolution)) => render_document(&state, resolution).await,
        Ok(None) if is_static_request(&decoded, &state.filter) => {
            serve_static(&state, &decoded, request).await
        }
        Ok(None) => not_found(&state, &decoded).await,
        Err(e) => unavailable(e),
    }
}

/// Route a request path maps to: trailing slashes and a document
/// extension are dropped, so `/guide/setup.adoc` serves `/guide/setup`.
pub fn request_route(path: &str, filter: &PathFilter) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }

    if filter.is_document(Path::new(trimmed))
        && let Some((stem, _)) = trimmed.rsplit_once('.')
    {
        return stem.to_string();
    }
    trimmed.to_string()
}

/// True for paths naming a non-document file, e.g. an image.
fn is_static_request(path: &str, filter: &PathFilter) -> bool {
    let path = Path::new(path);
    path.extension().is_some() && !filter.is_document(path)
}

async fn render_document(state: &AppState, resolution: Resolution) -> Response {
    let converter = Arc::clone(&state.converter);
    let abs_path = resolution.abs_path.clone();
    let rendered = tokio::task::spawn_blocking(move || converter.render(&abs_path)).await;

    match rendered {
        Ok(Ok(html)) => {
            crate::debug_event!("server", "rendered", "{}", resolution.file);
            Html(state.pages.document(
                resolution.title.as_deref(),
                &resolution.file,
                &html,
                &resolution.navigation,
            ))
            .into_response()
        }
        Ok(Err(e)) => {
            tracing::error!("[server] {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render {}: {e}", resolution.file),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("[server] render task failed for {}: {e}", resolution.file);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serve a file from the content root. Only plain, visible relative paths
/// are accepted.
async fn serve_static(state: &AppState, decoded: &str, request: Request) -> Response {
    let relative = Path::new(decoded.trim_start_matches('/'));
    let plain = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)));

    if !plain || state.filter.is_ignored(relative) {
        crate::debug_event!("server", "refused", "{decoded}");
        return (StatusCode::NOT_FOUND, format!("file {decoded} not found")).into_response();
    }

    let absolute = state.content_root.join(relative);
    match ServeFile::new(absolute).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

async fn not_found(state: &AppState, path: &str) -> Response {
    match state.routes.navigation().await {
        Ok(navigation) => (
            StatusCode::NOT_FOUND,
            Html(state.pages.not_found(path, &navigation)),
        )
            .into_response(),
        Err(e) => unavailable(e),
    }
}

fn unavailable(e: ServiceError) -> Response {
    tracing::error!("[server] {e}");
    (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
}
