//! Virtual address space walking.

use serde::{Deserialize, Serialize};

pub const MEM_COMMIT: u32 = 0x1000;
pub const MEM_FREE: u32 = 0x10000;
pub const MEM_PRIVATE: u32 = 0x20000;
pub const MEM_MAPPED: u32 = 0x40000;
pub const MEM_IMAGE: u32 = 0x100_0000;

pub const PAGE_NOACCESS: u32 = 0x01;
pub const PAGE_READONLY: u32 = 0x02;
pub const PAGE_READWRITE: u32 = 0x04;
pub const PAGE_EXECUTE_READWRITE: u32 = 0x40;

/// End of the canonical 48-bit user address space
pub const MAX_USER_ADDRESS: u64 = 0x7FFF_FFFF_FFFF;

/// A contiguous span of the foreign address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryRegion {
    pub base: u64,
    pub size: u64,
}

impl MemoryRegion {
    pub fn new(base: u64, size: u64) -> Self {
        Self { base, size }
    }

    pub fn end(&self) -> u64 {
        self.base.saturating_add(self.size)
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.base && address < self.end()
    }
}

/// Raw region metadata as reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionInfo {
    pub base: u64,
    pub size: u64,
    /// MEM_COMMIT / MEM_RESERVE / MEM_FREE
    pub state: u32,
    /// PAGE_* protection of the committed pages
    pub protect: u32,
    /// MEM_PRIVATE / MEM_MAPPED / MEM_IMAGE
    pub kind: u32,
}

impl RegionInfo {
    pub fn region(&self) -> MemoryRegion {
        MemoryRegion::new(self.base, self.size)
    }
}

/// Source of region metadata for a foreign process
pub trait QueryRegions {
    /// Describe the region containing `address`, or `None` once the address
    /// space is exhausted or the query fails.
    fn query_region(&self, address: u64) -> Option<RegionInfo>;
}

impl<Q: QueryRegions + ?Sized> QueryRegions for &Q {
    fn query_region(&self, address: u64) -> Option<RegionInfo> {
        (**self).query_region(address)
    }
}

/// Which regions are worth a bulk read.
///
/// Managed heap segments are committed private read-write pages; mapped files
/// and loaded images never hold the objects we are after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionFilter {
    /// Exclusive lower size bound
    pub min_size: u64,
    /// Exclusive upper size bound
    pub max_size: u64,
    /// Accepted protections (exact match, so guard pages are excluded)
    pub protections: Vec<u32>,
}

impl Default for RegionFilter {
    fn default() -> Self {
        Self {
            min_size: 0x10000,
            max_size: 0x200_0000,
            protections: vec![PAGE_READWRITE, PAGE_EXECUTE_READWRITE],
        }
    }
}

impl RegionFilter {
    pub fn matches(&self, info: &RegionInfo) -> bool {
        info.state == MEM_COMMIT
            && info.kind == MEM_PRIVATE
            && self.protections.contains(&info.protect)
            && self.accepts_size(info.size)
    }

    /// Size within the exclusive bounds
    pub fn accepts_size(&self, size: u64) -> bool {
        size > self.min_size && size < self.max_size
    }
}

/// Lazy walk over the address space, yielding regions that pass the filter.
///
/// Starts at address 0 and always advances past the region just returned by
/// the query, matching or not. Stops at the end of user space, when the query
/// fails, or when a region fails to move the cursor forward.
pub struct RegionWalker<'a, Q: QueryRegions + ?Sized> {
    source: &'a Q,
    filter: RegionFilter,
    cursor: u64,
    finished: bool,
}

impl<'a, Q: QueryRegions + ?Sized> RegionWalker<'a, Q> {
    pub fn new(source: &'a Q, filter: RegionFilter) -> Self {
        Self {
            source,
            filter,
            cursor: 0,
            finished: false,
        }
    }
}

impl<Q: QueryRegions + ?Sized> Iterator for RegionWalker<'_, Q> {
    type Item = MemoryRegion;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            if self.cursor >= MAX_USER_ADDRESS {
                self.finished = true;
                break;
            }

            let Some(info) = self.source.query_region(self.cursor) else {
                self.finished = true;
                break;
            };

            match info.base.checked_add(info.size) {
                Some(end) if info.size > 0 && end > self.cursor => self.cursor = end,
                _ => {
                    self.finished = true;
                    break;
                }
            }

            if self.filter.matches(&info) {
                return Some(info.region());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::MockMemoryBuilder;

    fn info(base: u64, size: u64, protect: u32, kind: u32) -> RegionInfo {
        RegionInfo {
            base,
            size,
            state: MEM_COMMIT,
            protect,
            kind,
        }
    }

    #[test]
    fn test_filter_accepts_private_read_write() {
        let filter = RegionFilter::default();
        assert!(filter.matches(&info(0x10000, 0x20000, PAGE_READWRITE, MEM_PRIVATE)));
        assert!(filter.matches(&info(0x10000, 0x20000, PAGE_EXECUTE_READWRITE, MEM_PRIVATE)));
    }

    #[test]
    fn test_filter_rejects_wrong_attributes() {
        let filter = RegionFilter::default();
        assert!(!filter.matches(&info(0x10000, 0x20000, PAGE_READONLY, MEM_PRIVATE)));
        assert!(!filter.matches(&info(0x10000, 0x20000, PAGE_READWRITE, MEM_IMAGE)));
        assert!(!filter.matches(&info(0x10000, 0x20000, PAGE_READWRITE, MEM_MAPPED)));
        // guard page variant is not an exact match
        assert!(!filter.matches(&info(0x10000, 0x20000, PAGE_READWRITE | 0x100, MEM_PRIVATE)));

        let mut reserved = info(0x10000, 0x20000, PAGE_READWRITE, MEM_PRIVATE);
        // MEM_RESERVE
        reserved.state = 0x2000;
        assert!(!filter.matches(&reserved));
    }

    #[test]
    fn test_filter_size_bounds_are_exclusive() {
        let filter = RegionFilter::default();
        assert!(!filter.matches(&info(0, 0x10000, PAGE_READWRITE, MEM_PRIVATE)));
        assert!(filter.matches(&info(0, 0x11000, PAGE_READWRITE, MEM_PRIVATE)));
        assert!(filter.matches(&info(0, 0x1FF_F000, PAGE_READWRITE, MEM_PRIVATE)));
        assert!(!filter.matches(&info(0, 0x200_0000, PAGE_READWRITE, MEM_PRIVATE)));
        assert!(!filter.accepts_size(1 << 40));
    }

    #[test]
    fn test_walker_yields_matching_regions_in_order() {
        let reader = MockMemoryBuilder::new()
            .region(0x10_0000, 0x20000)
            .region_with(0x20_0000, 0x20000, PAGE_READONLY, MEM_PRIVATE)
            .region(0x30_0000, 0x11000)
            .region(0x40_0000, 0x1000)
            .build();

        let regions: Vec<_> = RegionWalker::new(&reader, RegionFilter::default()).collect();
        assert_eq!(
            regions,
            vec![
                MemoryRegion::new(0x10_0000, 0x20000),
                MemoryRegion::new(0x30_0000, 0x11000),
            ]
        );
    }

    #[test]
    fn test_walker_is_restartable() {
        let reader = MockMemoryBuilder::new().region(0x10_0000, 0x20000).build();

        let first: Vec<_> = RegionWalker::new(&reader, RegionFilter::default()).collect();
        let second: Vec<_> = RegionWalker::new(&reader, RegionFilter::default()).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_walker_empty_address_space() {
        let reader = MockMemoryBuilder::new().build();
        assert_eq!(RegionWalker::new(&reader, RegionFilter::default()).count(), 0);
    }

    struct Stuck;

    impl QueryRegions for Stuck {
        fn query_region(&self, _address: u64) -> Option<RegionInfo> {
            Some(RegionInfo {
                base: 0,
                size: 0,
                state: MEM_COMMIT,
                protect: PAGE_READWRITE,
                kind: MEM_PRIVATE,
            })
        }
    }

    #[test]
    fn test_walker_stops_on_zero_sized_region() {
        assert_eq!(RegionWalker::new(&Stuck, RegionFilter::default()).count(), 0);
    }

    #[test]
    fn test_memory_region_contains() {
        let region = MemoryRegion::new(0x1000, 0x100);
        assert!(region.contains(0x1000));
        assert!(region.contains(0x10FF));
        assert!(!region.contains(0x1100));
        assert_eq!(region.end(), 0x1100);
    }
}
