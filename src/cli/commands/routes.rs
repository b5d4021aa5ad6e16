//! Routes command - scan a content root once and list what it serves.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use console::style;

use crate::config::Settings;
use crate::convert::{AsciidoctorConverter, Converter};
use crate::routing::{ContentWalker, IncludedFile, PathFilter, Route, RouteTable};

/// Build a route table for `root` the way the server does at startup.
pub fn scan_routes(
    settings: &Settings,
    root: &Path,
    converter: Arc<dyn Converter>,
) -> anyhow::Result<Vec<Route>> {
    let root = root
        .canonicalize()
        .with_context(|| format!("no such directory: {}", root.display()))?;
    anyhow::ensure!(root.is_dir(), "path {} is not a directory", root.display());

    let filter = PathFilter::new(&settings.content.extensions, &settings.content.excluded_dirs);
    let files = ContentWalker::new(filter.clone()).walk(&root, &root);

    let mut table = RouteTable::new(root, filter, converter);
    for file in &files {
        table.insert(file);
    }
    Ok(table.routes().collect())
}

/// Print every route with its file, title and included files.
pub fn run(settings: &Settings, root: &Path) -> anyhow::Result<()> {
    let converter = Arc::new(AsciidoctorConverter::new(&settings.converter));
    let routes = scan_routes(settings, root, converter)?;

    if routes.is_empty() {
        println!("No documents found under {}", root.display());
        return Ok(());
    }

    for route in &routes {
        println!(
            "{}  {}  {}",
            style(&route.route).green().bold(),
            style(route.file()).dim(),
            route.title().unwrap_or("")
        );
        for included in route.info.included_files.iter().flatten() {
            let kind = match included {
                IncludedFile::Include { .. } => "include",
                IncludedFile::Diagram { .. } => "diagram",
            };
            println!("    {} {}", style(format!("{kind}:")).cyan(), included.path());
        }
    }
    println!("\n{} routes", routes.len());
    Ok(())
}
