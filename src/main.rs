//! Cookbook CLI: versioned recipe resolution.

use anyhow::Result;
use clap::Parser;
use cookbook::core::config::{load_config, CONFIG_FILE};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cookbook",
    version,
    about = "Versioned recipe resolution: derivation patches, alias-namespaced composition, yield scaling"
)]
struct Cli {
    /// Project config file
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Recipe tree root (overrides the config file)
    #[arg(long, global = true)]
    recipes_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: cookbook::cli::Commands,
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli.config)?;
    if let Some(dir) = cli.recipes_dir {
        config.recipes_dir = dir;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    cookbook::cli::dispatch(cli.command, &config)
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
