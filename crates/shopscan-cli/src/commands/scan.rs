//! Scan command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use shopscan::{MemoryReader, ScannerConfig, ShopScanner, shops_to_json};

use crate::display::TerminalObserver;

/// Run the scan command
pub fn run(config: &ScannerConfig, full: bool, output: Option<&Path>) -> Result<()> {
    let process = super::open_process(config)?;
    eprintln!("Found {} (PID: {})", process.name, process.pid);

    let mut scanner = ShopScanner::new(MemoryReader::new(&process), config);
    let mut observer = TerminalObserver::new();
    let shops = scanner.find_all_shops(!full, &mut observer);

    if observer.shown() == 0 {
        eprintln!("No shops found. Open a shop in game and scan again.");
    }

    if let Some(path) = output {
        let json = shops_to_json(&shops)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Saved {} shop(s) to {}", shops.len(), path.display());
    }

    Ok(())
}
