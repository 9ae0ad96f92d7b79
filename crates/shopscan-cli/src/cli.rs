//! Command line definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shopscan::config::{DEFAULT_CACHE_FILE, DEFAULT_PROCESS_NAME};

#[derive(Parser)]
#[command(name = "shopscan")]
#[command(about = "Find and list the shops of a running MegaBonk game")]
#[command(version)]
pub struct Cli {
    /// Target process executable name
    #[arg(long, global = true, env = "SHOPSCAN_PROCESS", default_value = DEFAULT_PROCESS_NAME)]
    pub process: String,

    /// Learned region cache file
    #[arg(long, global = true, env = "SHOPSCAN_CACHE", default_value = DEFAULT_CACHE_FILE)]
    pub cache: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scan for shops (learned regions first)
    Scan {
        /// Skip learned regions and scan the whole address space
        #[arg(long)]
        full: bool,

        /// Write all shops as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the memory regions a full scan would visit
    Regions,
    /// Inspect or clear the learned region cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Print learned regions
    Show,
    /// Delete the cache file
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["shopscan"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_scan_flags() {
        let cli = Cli::try_parse_from(["shopscan", "scan", "--full", "-o", "shops.json"]).unwrap();
        match cli.command {
            Some(Command::Scan { full, output }) => {
                assert!(full);
                assert_eq!(output, Some(PathBuf::from("shops.json")));
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "shopscan",
            "cache",
            "show",
            "--cache",
            "other.json",
            "--process",
            "Test.exe",
        ])
        .unwrap();
        assert_eq!(cli.cache, PathBuf::from("other.json"));
        assert_eq!(cli.process, "Test.exe");
        assert!(matches!(
            cli.command,
            Some(Command::Cache {
                action: CacheAction::Show
            })
        ));
    }
}
