//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use adoc_live::convert::scanner::scan_document;
use adoc_live::{Broadcast, ConvertError, Converter, DocumentMetadata, PathFilter, ServerEvent};
use tempfile::TempDir;

/// Broadcast sink that keeps every event.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<ServerEvent>>,
}

impl Recorder {
    pub fn take(&self) -> Vec<ServerEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl Broadcast for Recorder {
    fn broadcast(&self, event: ServerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Reads metadata with the native scanner and renders a fixed fragment.
///
/// Documents whose name contains `broken` fail to render; those whose name
/// contains `standalone` render as a full page with a stylesheet.
pub struct FakeConverter;

impl Converter for FakeConverter {
    fn render(&self, path: &Path) -> Result<String, ConvertError> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if name.contains("broken") {
            return Err(ConvertError::Failed {
                path: path.to_path_buf(),
                status: "exit status: 1".to_string(),
                stderr: "asciidoctor: FAILED".to_string(),
            });
        }
        if name.contains("standalone") {
            return Ok(format!(
                "<!DOCTYPE html>\n<html>\n<head>\n<title>{name}</title>\n\
                 <style>.adoc-default{{color:#222}}</style>\n</head>\n\
                 <body class=\"article\"><div class=\"rendered\">{name}</div></body>\n</html>\n"
            ));
        }
        Ok(format!("<div class=\"rendered\">{name}</div>"))
    }

    fn metadata(&self, path: &Path) -> Result<DocumentMetadata, ConvertError> {
        scan_document(path)
    }
}

pub fn adoc_filter() -> PathFilter {
    PathFilter::new(["adoc"], ["node_modules"])
}

/// Temporary content root. Paths are canonicalized so they match what the
/// server and watcher see.
pub struct ContentDir {
    _dir: TempDir,
    pub root: PathBuf,
}

impl ContentDir {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        Self { _dir: dir, root }
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.root.join(relative)).unwrap();
    }

    pub fn converter(&self) -> Arc<dyn Converter> {
        Arc::new(FakeConverter)
    }
}
