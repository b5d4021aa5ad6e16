//! CLI argument parsing using clap.

use clap::{
    Args, Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::{Path, PathBuf};

use crate::config::Settings;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

const AFTER_HELP: &str = "\
Quick Start:
  $ adoc-live                        # Preview the current directory
  $ adoc-live serve docs -p 9000     # Preview docs/ on port 9000
  $ adoc-live routes docs            # List routes and their includes
  $ adoc-live config                 # Show the effective configuration";

/// Live preview server for AsciiDoc document trees
#[derive(Parser, Debug)]
#[command(
    name = "adoc-live",
    version = env!("CARGO_PKG_VERSION"),
    about = "Live preview server for AsciiDoc document trees",
    long_about = "Serve a directory of AsciiDoc documents as HTML pages and \
                  reload open browsers when a document or anything it includes changes.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// Path to a custom settings file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The subcommand to run; `serve` when none was given.
    pub fn selected_command(&self) -> Commands {
        self.command.clone().unwrap_or_default()
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the preview server (default)
    Serve(ServeArgs),

    /// Scan once and print the route table
    Routes {
        /// Content directory (defaults to the configured root or the current directory)
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Display the effective configuration
    Config,

    /// Write a .adoc-live.toml with default settings
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Serve(ServeArgs::default())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Content directory (defaults to the configured root or the current directory)
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind (overrides config)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Serve without watching for changes
    #[arg(long)]
    pub no_watch: bool,
}

impl ServeArgs {
    /// Fold command-line overrides into loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(bind) = &self.bind {
            settings.server.bind = bind.clone();
        }
        if self.no_watch {
            settings.watch.enabled = false;
        }
    }
}

/// Content root for a command: explicit directory, else the configured
/// root, else `cwd`.
pub fn content_dir(dir: Option<&Path>, settings: &Settings, cwd: &Path) -> PathBuf {
    match dir {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => cwd.join(dir),
        None => settings.content_root(cwd),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_is_default_command() {
        let cli = Cli::try_parse_from(["adoc-live"]).unwrap();
        assert!(cli.command.is_none());
        match cli.selected_command() {
            Commands::Serve(args) => {
                assert!(args.dir.is_none());
                assert!(!args.no_watch);
            }
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from([
            "adoc-live", "serve", "docs", "-p", "9000", "--bind", "0.0.0.0", "--no-watch",
        ])
        .unwrap();
        let Commands::Serve(args) = cli.selected_command() else {
            panic!("expected serve");
        };
        assert_eq!(args.dir, Some(PathBuf::from("docs")));

        let mut settings = Settings::default();
        args.apply(&mut settings);
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.bind, "0.0.0.0");
        assert!(!settings.watch.enabled);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["adoc-live", "routes", "docs", "-d", "-c", "alt.toml"]).unwrap();
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        assert!(matches!(cli.selected_command(), Commands::Routes { dir: Some(_) }));
    }

    #[test]
    fn test_content_dir_precedence() {
        let cwd = Path::new("/work");
        let mut settings = Settings::default();
        assert_eq!(content_dir(None, &settings, cwd), PathBuf::from("/work"));

        settings.content.root = Some(PathBuf::from("site"));
        assert_eq!(content_dir(None, &settings, cwd), PathBuf::from("/work/site"));
        assert_eq!(
            content_dir(Some(Path::new("docs")), &settings, cwd),
            PathBuf::from("/work/docs")
        );
        assert_eq!(
            content_dir(Some(Path::new("/abs")), &settings, cwd),
            PathBuf::from("/abs")
        );
    }
}
