//! Live filesystem events flowing from the watcher into the route table.

mod common;

use std::sync::Arc;
use std::time::Duration;

use adoc_live::routing::RouteTable;
use adoc_live::service::{RouteService, RouteServiceHandle, initial_scan};
use adoc_live::{ChangeNotifier, FsWatcher, ServerEvent};
use common::{ContentDir, Recorder, adoc_filter};
use tokio_util::sync::CancellationToken;

/// Poll `check` until it holds or a few seconds pass.
async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

async fn has_route(handle: &RouteServiceHandle, route: &str) -> bool {
    handle.resolve(route).await.unwrap().is_some()
}

#[tokio::test]
async fn test_watcher_routes_new_and_removed_documents() {
    let content = ContentDir::new();
    let recorder = Arc::new(Recorder::default());
    let table = RouteTable::new(content.root.clone(), adoc_filter(), content.converter());
    let (service, handle) = RouteService::new(ChangeNotifier::new(table, recorder.clone()), 32);

    let ct = CancellationToken::new();
    tokio::spawn(service.run(ct.clone()));

    let watcher = FsWatcher::builder()
        .root(content.root.clone())
        .filter(adoc_filter())
        .sink(handle.clone())
        .debounce_ms(20)
        .build()
        .unwrap();
    tokio::spawn(watcher.watch(ct.clone()));

    let routes = &handle;
    content.write("live.adoc", "= Live\n");
    content.write(".hidden/ignored.adoc", "= Ignored\n");
    assert!(eventually(move || has_route(routes, "/live")).await);

    content.remove("live.adoc");
    assert!(eventually(move || async move { !has_route(routes, "/live").await }).await);

    let events = recorder.take();
    assert!(events.contains(&ServerEvent::FileRemove {
        file: "live.adoc".to_string()
    }));
    assert!(events.iter().all(|event| !matches!(
        event,
        ServerEvent::FileAdded { file, .. } if file.contains("ignored")
    )));
    assert!(!has_route(&handle, "/.hidden/ignored").await);

    ct.cancel();
}

#[tokio::test]
async fn test_atomic_save_is_a_change() {
    let content = ContentDir::new();
    content.write("intro.adoc", "= Intro\n");

    let recorder = Arc::new(Recorder::default());
    let table = RouteTable::new(content.root.clone(), adoc_filter(), content.converter());
    let (service, handle) = RouteService::new(ChangeNotifier::new(table, recorder.clone()), 32);

    let ct = CancellationToken::new();
    tokio::spawn(service.run(ct.clone()));
    initial_scan(&handle, content.root.clone(), adoc_filter())
        .await
        .unwrap();

    let watcher = FsWatcher::builder()
        .root(content.root.clone())
        .filter(adoc_filter())
        .sink(handle.clone())
        .debounce_ms(20)
        .build()
        .unwrap();
    tokio::spawn(watcher.watch(ct.clone()));
    // Let the backend settle before the save
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Write a temporary sibling, then rename it over the document
    let temp = content.write("intro.adoc.tmp", "= Intro v2\n");
    std::fs::rename(&temp, content.root.join("intro.adoc")).unwrap();

    let change = ServerEvent::FileChange {
        route: Some("/intro".to_string()),
        affected_routes: None,
    };
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let (sink, log, change) = (&recorder, &seen, &change);
    assert!(
        eventually(move || async move {
            log.lock().unwrap().extend(sink.take());
            log.lock().unwrap().contains(change)
        })
        .await
    );

    let events = seen.lock().unwrap().clone();
    assert!(
        events
            .iter()
            .all(|event| !matches!(event, ServerEvent::FileRemove { .. })),
        "{events:?}"
    );
    let resolved = handle.resolve("/intro").await.unwrap().unwrap();
    assert_eq!(resolved.title.as_deref(), Some("Intro v2"));

    ct.cancel();
}
