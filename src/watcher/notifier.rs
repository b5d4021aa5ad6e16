//! Turns filesystem changes into route table updates and notifications.

use std::path::Path;
use std::sync::Arc;

use crate::notifications::{Broadcast, ServerEvent};
use crate::routing::{RouteTable, to_slash};

use super::FsEvent;

/// Applies add/change/remove events to the route table and broadcasts the
/// resulting notification, if any.
///
/// Every handler returns the event it broadcast so callers can observe the
/// outcome without subscribing.
pub struct ChangeNotifier {
    table: RouteTable,
    broadcaster: Arc<dyn Broadcast>,
}

impl ChangeNotifier {
    pub fn new(table: RouteTable, broadcaster: Arc<dyn Broadcast>) -> Self {
        Self { table, broadcaster }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut RouteTable {
        &mut self.table
    }

    /// A file appeared. Announces it if it produced a new route.
    pub fn on_add(&mut self, relative: &Path) -> Option<ServerEvent> {
        let route = self.table.insert(relative)?;
        crate::log_event!("router", "added", "{} on {}", route.file(), route.route);

        let event = ServerEvent::FileAdded {
            route: route.route,
            file: route.info.file,
            title: route.info.title,
        };
        self.emit(event)
    }

    /// A file disappeared. Announces it if it owned a route.
    pub fn on_remove(&mut self, relative: &Path) -> Option<ServerEvent> {
        if !self.table.remove_by_file(relative) {
            return None;
        }

        let file = to_slash(relative);
        crate::log_event!("router", "removed", "{file}");
        self.emit(ServerEvent::FileRemove { file })
    }

    /// A directory disappeared. Announces every document it contained.
    pub fn on_remove_dir(&mut self, relative: &Path) -> Vec<ServerEvent> {
        self.table
            .remove_under(relative)
            .into_iter()
            .filter_map(|route| {
                crate::log_event!("router", "removed", "{}", route.file());
                self.emit(ServerEvent::FileRemove {
                    file: route.info.file,
                })
            })
            .collect()
    }

    /// A file's content changed.
    ///
    /// Reports the file's own route (if it is a document) and every route
    /// that pulls it in. Stays silent when neither exists.
    pub fn on_change(&mut self, relative: &Path) -> Option<ServerEvent> {
        let direct = self.table.get_by_file(relative).map(|route| route.route);

        let absolute = self.table.root().join(relative);
        let affected = self
            .table
            .routes_depending_on(&absolute)
            .map(|routes| routes.into_iter().map(|route| route.route).collect::<Vec<_>>());

        if direct.is_none() && affected.is_none() {
            crate::debug_event!("router", "untracked change", "{}", relative.display());
            return None;
        }

        crate::log_event!(
            "router",
            "changed",
            "{} ({} dependents)",
            to_slash(relative),
            affected.as_ref().map_or(0, Vec::len)
        );

        self.emit(ServerEvent::FileChange {
            route: direct,
            affected_routes: affected,
        })
    }

    /// Dispatch one watcher event.
    ///
    /// An added path that produces no new route is reported as a change:
    /// a save that renames a temporary file over a document, or a missing
    /// include coming into existence, must still reach its readers.
    /// A removed path without a document extension is treated as a
    /// directory, since the entry is gone and cannot be inspected.
    pub fn handle(&mut self, event: &FsEvent) -> Vec<ServerEvent> {
        match event {
            FsEvent::Added(path) => match self.on_add(path) {
                Some(event) => vec![event],
                None => self.on_change(path).into_iter().collect(),
            },
            FsEvent::Changed(path) => self.on_change(path).into_iter().collect(),
            FsEvent::Removed(path) if self.table.filter().is_document(path) => {
                self.on_remove(path).into_iter().collect()
            }
            FsEvent::Removed(path) => self.on_remove_dir(path),
        }
    }

    fn emit(&self, event: ServerEvent) -> Option<ServerEvent> {
        self.broadcaster.broadcast(event.clone());
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{ConvertError, Converter, DocumentMetadata};
    use crate::routing::{IncludedFile, PathFilter};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<ServerEvent>>,
    }

    impl Broadcast for Recorder {
        fn broadcast(&self, event: ServerEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[derive(Default)]
    struct FakeConverter {
        metadata: Mutex<HashMap<PathBuf, DocumentMetadata>>,
    }

    impl Converter for FakeConverter {
        fn render(&self, _path: &Path) -> Result<String, ConvertError> {
            Ok(String::new())
        }

        fn metadata(&self, path: &Path) -> Result<DocumentMetadata, ConvertError> {
            Ok(self
                .metadata
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn notifier() -> (ChangeNotifier, Arc<FakeConverter>, Arc<Recorder>) {
        let converter = Arc::new(FakeConverter::default());
        let recorder = Arc::new(Recorder::default());
        let table = RouteTable::new(
            PathBuf::from("/docs"),
            PathFilter::new(["adoc"], ["node_modules"]),
            converter.clone(),
        );
        (ChangeNotifier::new(table, recorder.clone()), converter, recorder)
    }

    #[test]
    fn test_add_broadcasts_once() {
        let (mut notifier, converter, recorder) = notifier();
        converter.metadata.lock().unwrap().insert(
            PathBuf::from("/docs/intro.adoc"),
            DocumentMetadata {
                title: Some("Intro".into()),
                included_files: vec![],
            },
        );

        let event = notifier.on_add(Path::new("intro.adoc")).unwrap();
        assert_eq!(
            event,
            ServerEvent::FileAdded {
                route: "/intro".into(),
                file: "intro.adoc".into(),
                title: Some("Intro".into()),
            }
        );

        // Second add of the same file is silent
        assert!(notifier.on_add(Path::new("intro.adoc")).is_none());
        assert_eq!(recorder.events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_change_of_untracked_file_is_silent() {
        let (mut notifier, _, recorder) = notifier();
        notifier.on_add(Path::new("intro.adoc"));

        assert!(notifier.on_change(Path::new("unrelated.txt")).is_none());
        assert_eq!(recorder.events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_change_of_include_reports_dependents_only() {
        let (mut notifier, converter, _) = notifier();
        converter.metadata.lock().unwrap().insert(
            PathBuf::from("/docs/intro.adoc"),
            DocumentMetadata {
                title: None,
                included_files: vec![IncludedFile::include("parts/body.txt")],
            },
        );
        notifier.on_add(Path::new("intro.adoc"));

        let event = notifier.on_change(Path::new("parts/body.txt")).unwrap();
        assert_eq!(
            event,
            ServerEvent::FileChange {
                route: None,
                affected_routes: Some(vec!["/intro".into()]),
            }
        );
    }

    #[test]
    fn test_handle_directory_removal() {
        let (mut notifier, _, recorder) = notifier();
        notifier.on_add(Path::new("guide/a.adoc"));
        notifier.on_add(Path::new("guide/b.adoc"));
        recorder.events.lock().unwrap().clear();

        let events = notifier.handle(&FsEvent::Removed(PathBuf::from("guide")));
        assert_eq!(
            events,
            vec![
                ServerEvent::FileRemove {
                    file: "guide/a.adoc".into()
                },
                ServerEvent::FileRemove {
                    file: "guide/b.adoc".into()
                },
            ]
        );
        assert!(notifier.table().is_empty());
        assert_eq!(recorder.events.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_added_over_existing_route_is_a_change() {
        let (mut notifier, converter, recorder) = notifier();
        let intro = PathBuf::from("/docs/intro.adoc");
        converter.metadata.lock().unwrap().insert(
            intro.clone(),
            DocumentMetadata {
                title: Some("Intro".into()),
                included_files: vec![],
            },
        );
        notifier.handle(&FsEvent::Added(PathBuf::from("intro.adoc")));

        // A temporary file renamed over the document
        converter.metadata.lock().unwrap().insert(
            intro,
            DocumentMetadata {
                title: Some("Intro v2".into()),
                included_files: vec![],
            },
        );
        let events = notifier.handle(&FsEvent::Added(PathBuf::from("intro.adoc")));
        assert_eq!(
            events,
            vec![ServerEvent::FileChange {
                route: Some("/intro".into()),
                affected_routes: None,
            }]
        );
        assert_eq!(
            notifier.table().get("/intro").unwrap().info.title.as_deref(),
            Some("Intro v2")
        );
        assert_eq!(recorder.events.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_added_include_reaches_dependents() {
        let (mut notifier, converter, _) = notifier();
        converter.metadata.lock().unwrap().insert(
            PathBuf::from("/docs/intro.adoc"),
            DocumentMetadata {
                title: None,
                included_files: vec![IncludedFile::include("parts/late.txt")],
            },
        );
        notifier.on_add(Path::new("intro.adoc"));

        let events = notifier.handle(&FsEvent::Added(PathBuf::from("parts/late.txt")));
        assert_eq!(
            events,
            vec![ServerEvent::FileChange {
                route: None,
                affected_routes: Some(vec!["/intro".into()]),
            }]
        );

        assert!(notifier
            .handle(&FsEvent::Added(PathBuf::from("notes.txt")))
            .is_empty());
    }
}
