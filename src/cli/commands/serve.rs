//! Serve command - run the preview server.

use std::path::PathBuf;

use console::style;

use crate::config::Settings;
use crate::server::{self, ServeOptions};

/// Run the preview server for `root` until Ctrl+C.
pub async fn run(settings: Settings, root: PathBuf) -> anyhow::Result<()> {
    anyhow::ensure!(root.is_dir(), "no such directory: {}", root.display());

    let watch = settings.watch.enabled;
    eprintln!(
        "{} {} on {}",
        style("adoc-live").cyan().bold(),
        style(env!("CARGO_PKG_VERSION")).dim(),
        style(format!(
            "http://{}:{}",
            settings.server.bind, settings.server.port
        ))
        .green()
    );
    eprintln!(
        "{}: {}{}",
        style("Serving").dim(),
        root.display(),
        if watch { "" } else { " (watch disabled)" }
    );

    server::serve(settings, ServeOptions { root, watch }).await
}
