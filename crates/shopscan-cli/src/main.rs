mod cli;
mod commands;
mod display;

use anyhow::Result;
use clap::Parser;
use shopscan::ScannerConfig;
use tracing_subscriber::EnvFilter;

use cli::{CacheAction, Cli, Command};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Status lines reach stderr through the observer
    let directive = if cli.verbose {
        "shopscan=debug"
    } else {
        "shopscan=warn"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();

    let config = ScannerConfig::builder()
        .process_name(cli.process)
        .cache_path(cli.cache)
        .build();

    match cli.command {
        None => commands::scan::run(&config, false, None),
        Some(Command::Scan { full, output }) => {
            commands::scan::run(&config, full, output.as_deref())
        }
        Some(Command::Regions) => commands::regions::run(&config),
        Some(Command::Cache { action }) => match action {
            CacheAction::Show => commands::cache::show(&config),
            CacheAction::Clear => commands::cache::clear(&config),
        },
    }
}
