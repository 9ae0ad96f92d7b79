//! Regions command implementation.

use anyhow::Result;
use shopscan::{MemoryReader, RegionCache, ScannerConfig, ShopScanner};

/// Run the regions command
pub fn run(config: &ScannerConfig) -> Result<()> {
    let process = super::open_process(config)?;
    let scanner = ShopScanner::with_cache(
        MemoryReader::new(&process),
        config,
        RegionCache::empty(&config.cache_path),
    );

    let regions = scanner.enumerate_regions();
    let mut total = 0u64;
    for region in &regions {
        println!("0x{:012X}  {:>10} bytes", region.base, region.size);
        total += region.size;
    }

    println!();
    println!(
        "{} region(s), {:.1} MiB total",
        regions.len(),
        total as f64 / (1024.0 * 1024.0)
    );
    Ok(())
}
