// ABOUTME: Entry point for the dockapp CLI application.
// ABOUTME: Parses arguments, sets up logging, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use dockapp::config::{self, CONFIG_FILENAME};
use dockapp::error::Result;
use dockapp::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the flags when set
    let default_filter = if cli.verbose {
        "dockapp=debug"
    } else if cli.quiet || cli.json {
        "dockapp=warn"
    } else {
        "dockapp=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli, Output::new(mode)).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli, output: Output) -> Result<()> {
    let cwd = env::current_dir()?;

    match cli.command {
        Commands::Init { name, image, force } => {
            config::init_config(&cwd, name.as_deref(), image.as_deref(), force)?;
            output.success(&format!("Created {CONFIG_FILENAME}"));
            Ok(())
        }
        Commands::Deploy(args) => {
            let config = commands::resolve_config(
                &cwd,
                cli.config.as_deref(),
                args.overrides.into_overrides(),
            )?;
            commands::deploy(config, args.detach, output).await
        }
        Commands::Show(args) => {
            let config =
                commands::resolve_config(&cwd, cli.config.as_deref(), args.into_overrides())?;
            commands::show(&config, &output);
            Ok(())
        }
    }
}
