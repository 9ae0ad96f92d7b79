//! Cache command implementation.

use anyhow::{Context, Result};
use shopscan::{RegionCache, ScannerConfig};

/// Print the learned regions
pub fn show(config: &ScannerConfig) -> Result<()> {
    let cache = RegionCache::load(&config.cache_path);
    if cache.is_empty() {
        println!("No learned regions in {}", cache.path().display());
        return Ok(());
    }

    println!("Learned regions ({}):", cache.path().display());
    for region in cache.regions() {
        println!("  0x{:012X}  {} bytes", region.base, region.size);
    }
    Ok(())
}

/// Delete the cache file
pub fn clear(config: &ScannerConfig) -> Result<()> {
    let mut cache = RegionCache::empty(&config.cache_path);
    cache
        .remove_file()
        .with_context(|| format!("Failed to remove {}", cache.path().display()))?;
    println!("Cleared {}", cache.path().display());
    Ok(())
}
