use adoc_live::cli::commands::{config, routes, serve};
use adoc_live::cli::{Cli, Commands, content_dir};
use adoc_live::{Settings, logging};
use anyhow::Context;
use clap::Parser;
use console::style;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {e:#}", style("Error:").red().bold());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("cannot load configuration from {}", path.display()))?,
        None => Settings::load().context("cannot load configuration")?,
    };
    if cli.debug {
        settings.logging.default = "debug".to_string();
    }

    let command = cli.selected_command();
    if let Commands::Serve(args) = &command {
        args.apply(&mut settings);
    }
    logging::init_with_config(&settings.logging);

    let cwd = std::env::current_dir().context("cannot read the current directory")?;
    match command {
        Commands::Serve(args) => {
            let root = content_dir(args.dir.as_deref(), &settings, &cwd);
            serve::run(settings, root).await
        }
        Commands::Routes { dir } => {
            let root = content_dir(dir.as_deref(), &settings, &cwd);
            routes::run(&settings, &root)
        }
        Commands::Config => config::run_config(&settings),
        Commands::Init { force } => config::run_init(&cwd, force),
    }
}
