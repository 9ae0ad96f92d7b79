//! Shop scanning over a foreign process.
//!
//! A scan first retries the regions that held shops last time (fast path).
//! If none of them yields a shop, every candidate region in the address space
//! is scanned (slow path) and the regions that held shops are written back to
//! the region cache for next time.
//!
//! ## Example
//!
//! ```ignore
//! use shopscan::{MemoryReader, NoopObserver, ProcessHandle, ScannerConfig, ShopScanner};
//!
//! let config = ScannerConfig::default();
//! let process = ProcessHandle::find_by_name(&config.process_name)?;
//! let mut scanner = ShopScanner::new(MemoryReader::new(&process), &config);
//! let shops = scanner.find_all_shops(true, &mut NoopObserver);
//! ```

mod cache;
mod observer;

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::config::ScannerConfig;
use crate::process::{
    Layout, MemoryAccessor, MemoryRegion, QueryRegions, ReadMemory, RegionFilter, RegionWalker,
};
use crate::shop::{ShopRecord, candidate_offsets, confirm_shop, decode_shop};

pub use cache::RegionCache;
pub use observer::{NoopObserver, ScanCallbacks, ScanObserver};

/// Outcome of scanning one region
#[derive(Debug, Clone, Default)]
pub struct RegionScan {
    /// Every confirmed shop address, decoded or not
    pub addresses: Vec<u64>,
    /// Shops that decoded completely, in address order
    pub shops: Vec<ShopRecord>,
}

impl RegionScan {
    /// The region held at least one confirmed shop
    pub fn is_fruitful(&self) -> bool {
        !self.addresses.is_empty()
    }
}

/// Scans a process for shops and remembers where it found them
pub struct ShopScanner<R> {
    accessor: MemoryAccessor<R>,
    layout: Layout,
    filter: RegionFilter,
    cache: RegionCache,
}

impl<R: ReadMemory + QueryRegions> ShopScanner<R> {
    /// Create a scanner; the region cache is read once here
    pub fn new(reader: R, config: &ScannerConfig) -> Self {
        Self::with_cache(reader, config, RegionCache::load(&config.cache_path))
    }

    /// Create a scanner with an already loaded cache
    pub fn with_cache(reader: R, config: &ScannerConfig, cache: RegionCache) -> Self {
        debug!(
            "Scanner ready: {} learned region(s) from {}",
            cache.regions().len(),
            cache.path().display()
        );
        Self {
            accessor: MemoryAccessor::new(reader),
            layout: config.layout,
            filter: config.region_filter.clone(),
            cache,
        }
    }

    pub fn accessor(&self) -> &MemoryAccessor<R> {
        &self.accessor
    }

    pub fn reader(&self) -> &R {
        self.accessor.reader()
    }

    /// Regions that held shops in the last successful full scan
    pub fn learned_regions(&self) -> &[MemoryRegion] {
        self.cache.regions()
    }

    /// Drop the learned regions for this session; the cache file is untouched
    pub fn forget_learned_regions(&mut self) {
        self.cache.clear();
    }

    /// Every region a full scan would visit
    pub fn enumerate_regions(&self) -> Vec<MemoryRegion> {
        RegionWalker::new(&self.accessor, self.filter.clone()).collect()
    }

    /// Find every shop in the process.
    ///
    /// With `use_learned`, learned regions are tried first and the full scan is
    /// skipped if any of them holds a shop that decodes. Learned regions whose
    /// size the region filter rejects are skipped without being read. Shops are handed to `observer` as
    /// soon as they are decoded; the returned list holds the same shops in
    /// discovery order.
    pub fn find_all_shops(
        &mut self,
        use_learned: bool,
        observer: &mut dyn ScanObserver,
    ) -> Vec<ShopRecord> {
        report(observer, "Starting scan...");
        self.accessor.clear_pointer_cache();

        let mut seen = HashSet::new();

        if use_learned && !self.cache.is_empty() {
            let shops = self.scan_learned(&mut seen, observer);
            if !shops.is_empty() {
                report(
                    observer,
                    &format!("Found {} shop(s) in saved regions", shops.len()),
                );
                return shops;
            }
            report(observer, "No shops in saved regions, doing full scan...");
            seen.clear();
        }

        let regions = self.enumerate_regions();
        report(
            observer,
            &format!("Scanning {} memory regions...", regions.len()),
        );
        observer.progress(0, regions.len());

        let mut shops = Vec::new();
        let mut fruitful = Vec::new();
        for (index, region) in regions.iter().enumerate() {
            let scan = self.scan_region_dedup(*region, &mut seen, observer);
            if scan.is_fruitful() {
                report(
                    observer,
                    &format!(
                        "Found {} shop(s) in region 0x{:X}",
                        scan.addresses.len(),
                        region.base
                    ),
                );
                fruitful.push(*region);
            }
            shops.extend(scan.shops);
            observer.progress(index + 1, regions.len());
        }

        if !fruitful.is_empty() {
            let count = fruitful.len();
            match self.cache.replace(fruitful) {
                Ok(()) => report(
                    observer,
                    &format!("Saved {} region(s) for fast scanning", count),
                ),
                Err(e) => {
                    warn!(
                        "Failed to save learned regions to {}: {}",
                        self.cache.path().display(),
                        e
                    );
                    observer.status(&format!("Failed to save learned regions: {}", e));
                }
            }
        }

        report(
            observer,
            &format!("Scan complete! Found {} shop(s)", seen.len()),
        );
        shops
    }

    fn scan_learned(
        &self,
        seen: &mut HashSet<u64>,
        observer: &mut dyn ScanObserver,
    ) -> Vec<ShopRecord> {
        let regions = self.cache.regions().to_vec();
        report(
            observer,
            &format!("Using {} saved region(s)", regions.len()),
        );

        let mut shops = Vec::new();
        for (index, region) in regions.iter().enumerate() {
            if !self.filter.accepts_size(region.size) {
                report(
                    observer,
                    &format!(
                        "Saved region 0x{:X} invalid: size {:#x} out of range",
                        region.base, region.size
                    ),
                );
                observer.progress(index + 1, regions.len());
                continue;
            }
            match self.accessor.reader().read_bytes(region.base, 8) {
                Ok(_) => {
                    let scan = self.scan_region_dedup(*region, seen, observer);
                    shops.extend(scan.shops);
                }
                Err(e) => report(
                    observer,
                    &format!("Saved region 0x{:X} invalid: {}", region.base, e),
                ),
            }
            observer.progress(index + 1, regions.len());
        }
        shops
    }

    /// Scan one region on its own.
    ///
    /// Decoded shops are delivered to `observer` in ascending address order.
    /// The pointer cache is not cleared.
    pub fn scan_region(
        &self,
        region: MemoryRegion,
        observer: &mut dyn ScanObserver,
    ) -> RegionScan {
        self.scan_region_dedup(region, &mut HashSet::new(), observer)
    }

    fn scan_region_dedup(
        &self,
        region: MemoryRegion,
        seen: &mut HashSet<u64>,
        observer: &mut dyn ScanObserver,
    ) -> RegionScan {
        let mut result = RegionScan::default();

        let Ok(size) = usize::try_from(region.size) else {
            return result;
        };
        let Some(buffer) = self.accessor.read_bytes(region.base, size) else {
            debug!("Region 0x{:X} ({:#x} bytes) unreadable", region.base, size);
            return result;
        };

        for offset in candidate_offsets(&buffer, &self.layout.shop) {
            let address = region.base + offset as u64;
            if seen.contains(&address) || !confirm_shop(&self.accessor, address, &self.layout) {
                continue;
            }
            seen.insert(address);
            result.addresses.push(address);
            debug!("Shop #{} at 0x{:X}", result.addresses.len(), address);

            match decode_shop(&self.accessor, address, &self.layout) {
                Some(shop) => {
                    observer.shop_found(&shop);
                    result.shops.push(shop);
                }
                None => debug!("Shop at 0x{:X} confirmed but failed to decode", address),
            }
        }

        result
    }
}

fn report(observer: &mut dyn ScanObserver, message: &str) {
    info!("{}", message);
    observer.status(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{MockMemoryBuilder, MockMemoryReader, MockShop};
    use tempfile::tempdir;

    #[derive(Default)]
    struct Recorder {
        shops: Vec<u64>,
        progress: Vec<(usize, usize)>,
        status: Vec<String>,
    }

    impl ScanObserver for Recorder {
        fn shop_found(&mut self, shop: &ShopRecord) {
            self.shops.push(shop.address);
        }

        fn progress(&mut self, current: usize, total: usize) {
            self.progress.push((current, total));
        }

        fn status(&mut self, message: &str) {
            self.status.push(message.to_string());
        }
    }

    fn scanner(reader: MockMemoryReader) -> ShopScanner<MockMemoryReader> {
        ShopScanner::with_cache(
            reader,
            &ScannerConfig::default(),
            RegionCache::empty("unused.json"),
        )
    }

    #[test]
    fn test_scan_region_delivers_in_address_order() {
        let reader = MockMemoryBuilder::new()
            .region(0x10_0000, 0x20000)
            .shop(0x10_8000, &MockShop::standard(2, ["d", "e", "f"], [4, 5, 6]))
            .shop(0x10_0100, &MockShop::standard(1, ["a", "b", "c"], [1, 2, 3]))
            .build();
        let scanner = scanner(reader);
        let mut recorder = Recorder::default();

        let scan = scanner.scan_region(MemoryRegion::new(0x10_0000, 0x20000), &mut recorder);
        assert_eq!(scan.addresses, vec![0x10_0100, 0x10_8000]);
        assert_eq!(recorder.shops, vec![0x10_0100, 0x10_8000]);
        assert_eq!(scan.shops[1].items[0].name, "d");
    }

    #[test]
    fn test_undecodable_shop_counts_but_is_not_delivered() {
        let mut builder = MockMemoryBuilder::new().region(0x10_0000, 0x20000);
        let planted = builder.plant_shop(
            0x10_0100,
            &MockShop::standard(1, ["a", "b", "c"], [1, 2, 3]),
        );
        // first item pointer now leads to unmapped memory
        builder.put_bytes(
            Layout::MEGABONK.list.element_address(planted.items_storage, 0, 8),
            &0x7100_0000u64.to_le_bytes(),
        );
        let scanner = scanner(builder.build());
        let mut recorder = Recorder::default();

        let scan = scanner.scan_region(MemoryRegion::new(0x10_0000, 0x20000), &mut recorder);
        assert!(scan.is_fruitful());
        assert!(scan.shops.is_empty());
        assert!(recorder.shops.is_empty());
    }

    #[test]
    fn test_unreadable_region_yields_nothing() {
        let scanner = scanner(MockMemoryBuilder::new().build());
        let scan = scanner.scan_region(MemoryRegion::new(0x10_0000, 0x20000), &mut NoopObserver);
        assert!(!scan.is_fruitful());
    }

    #[test]
    fn test_slow_path_progress_and_status() {
        let reader = MockMemoryBuilder::new()
            .region(0x10_0000, 0x20000)
            .region(0x20_0000, 0x20000)
            .shop(0x20_0100, &MockShop::standard(3, ["a", "b", "c"], [1, 2, 3]))
            .build();
        let dir = tempdir().unwrap();
        let config = ScannerConfig::builder()
            .cache_path(dir.path().join("cache.json"))
            .build();
        let mut scanner = ShopScanner::new(reader, &config);
        let mut recorder = Recorder::default();

        let shops = scanner.find_all_shops(true, &mut recorder);
        assert_eq!(shops.len(), 1);
        assert_eq!(recorder.progress, vec![(0, 2), (1, 2), (2, 2)]);
        assert_eq!(recorder.status.first().map(String::as_str), Some("Starting scan..."));
        assert!(recorder.status.contains(&"Found 1 shop(s) in region 0x200000".to_string()));
        assert_eq!(
            recorder.status.last().map(String::as_str),
            Some("Scan complete! Found 1 shop(s)")
        );
        assert_eq!(scanner.learned_regions(), &[MemoryRegion::new(0x20_0000, 0x20000)]);
    }

    #[test]
    fn test_save_failure_is_reported_not_raised() {
        let reader = MockMemoryBuilder::new()
            .region(0x10_0000, 0x20000)
            .shop(0x10_0100, &MockShop::standard(0, ["a", "b", "c"], [1, 2, 3]))
            .build();
        let dir = tempdir().unwrap();
        let config = ScannerConfig::builder()
            .cache_path(dir.path().join("missing").join("cache.json"))
            .build();
        let mut scanner = ShopScanner::new(reader, &config);
        let mut recorder = Recorder::default();

        let shops = scanner.find_all_shops(false, &mut recorder);
        assert_eq!(shops.len(), 1);
        assert!(
            recorder
                .status
                .iter()
                .any(|s| s.starts_with("Failed to save learned regions"))
        );
        assert_eq!(scanner.learned_regions().len(), 1);
    }

    #[test]
    fn test_invalid_saved_region_is_skipped() {
        let reader = MockMemoryBuilder::new()
            .region(0x10_0000, 0x20000)
            .shop(0x10_0100, &MockShop::standard(0, ["a", "b", "c"], [1, 2, 3]))
            .build();
        let cache = RegionCache::with_regions(
            "unused.json",
            vec![
                MemoryRegion::new(0x900_0000, 0x20000),
                MemoryRegion::new(0x10_0000, 0x20000),
            ],
        );
        let mut scanner = ShopScanner::with_cache(reader, &ScannerConfig::default(), cache);
        let mut recorder = Recorder::default();

        let shops = scanner.find_all_shops(true, &mut recorder);
        assert_eq!(shops.len(), 1);
        assert!(
            recorder
                .status
                .iter()
                .any(|s| s.starts_with("Saved region 0x9000000 invalid"))
        );
        assert_eq!(recorder.progress, vec![(1, 2), (2, 2)]);
        assert_eq!(scanner.reader().query_count(), 0);
    }

    #[test]
    fn test_oversized_saved_region_is_not_read() {
        let reader = MockMemoryBuilder::new()
            .region(0x10_0000, 0x20000)
            .shop(0x10_0100, &MockShop::standard(0, ["a", "b", "c"], [1, 2, 3]))
            .build();
        let cache = RegionCache::with_regions(
            "unused.json",
            vec![
                MemoryRegion::new(0x10_0000, 1 << 40),
                MemoryRegion::new(0x10_0000, 0x20000),
            ],
        );
        let mut scanner = ShopScanner::with_cache(reader, &ScannerConfig::default(), cache);
        let mut recorder = Recorder::default();

        let shops = scanner.find_all_shops(true, &mut recorder);
        assert_eq!(shops.len(), 1);
        assert!(recorder.status.contains(
            &"Saved region 0x100000 invalid: size 0x10000000000 out of range".to_string()
        ));
        assert_eq!(recorder.progress, vec![(1, 2), (2, 2)]);
        // only the test read and bulk read of the valid entry touch its base
        assert_eq!(scanner.reader().reads_at(0x10_0000), 2);
    }

    #[test]
    fn test_undecodable_saved_shop_falls_through() {
        let mut builder = MockMemoryBuilder::new()
            .region(0x10_0000, 0x20000)
            .region(0x20_0000, 0x20000)
            .shop(0x20_0100, &MockShop::standard(2, ["d", "e", "f"], [4, 5, 6]));
        let planted = builder.plant_shop(
            0x10_0100,
            &MockShop::standard(1, ["a", "b", "c"], [1, 2, 3]),
        );
        builder.put_bytes(
            Layout::MEGABONK.list.element_address(planted.items_storage, 0, 8),
            &0x7100_0000u64.to_le_bytes(),
        );
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        RegionCache::save_to_path(&[MemoryRegion::new(0x10_0000, 0x20000)], &path).unwrap();
        let config = ScannerConfig::builder().cache_path(&path).build();
        let mut scanner = ShopScanner::new(builder.build(), &config);
        let mut recorder = Recorder::default();

        let shops = scanner.find_all_shops(true, &mut recorder);
        assert_eq!(recorder.shops, vec![0x20_0100]);
        assert_eq!(shops.len(), 1);
        assert!(
            recorder
                .status
                .contains(&"No shops in saved regions, doing full scan...".to_string())
        );
        assert!(scanner.reader().query_count() > 0);
        assert!(scanner.learned_regions().contains(&MemoryRegion::new(0x20_0000, 0x20000)));
    }

    #[test]
    fn test_scanner_uses_configured_layout() {
        let reader = MockMemoryBuilder::new()
            .region(0x10_0000, 0x20000)
            .shop(0x10_0100, &MockShop::standard(1, ["a", "b", "c"], [1, 2, 3]))
            .build();
        let mut layout = Layout::MEGABONK;
        layout.string.max_length = 1;
        let config = ScannerConfig::builder().layout(layout).build();
        let scanner = ShopScanner::with_cache(reader, &config, RegionCache::empty("unused.json"));

        let scan = scanner.scan_region(MemoryRegion::new(0x10_0000, 0x20000), &mut NoopObserver);
        assert_eq!(scan.shops[0].items[0].name, "a");
        assert_eq!(scan.shops[0].items[0].description, crate::shop::NO_DESCRIPTION);
    }

    #[test]
    fn test_forget_learned_regions() {
        let cache = RegionCache::with_regions(
            "unused.json",
            vec![MemoryRegion::new(0x10_0000, 0x20000)],
        );
        let mut scanner =
            ShopScanner::with_cache(MockMemoryBuilder::new().build(), &ScannerConfig::default(), cache);
        assert_eq!(scanner.learned_regions().len(), 1);
        scanner.forget_learned_regions();
        assert!(scanner.learned_regions().is_empty());
    }
}
