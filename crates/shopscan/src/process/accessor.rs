//! Fault-tolerant reads on top of a `ReadMemory` implementation.
//!
//! The scanner reads memory it knows nothing about, so individual reads fail
//! all the time. Every accessor method turns a failure into "no value"
//! (`None`, or the null pointer for pointer reads) instead of an error.

use std::cell::RefCell;
use std::collections::HashMap;

use super::reader::ReadMemory;
use super::region::{QueryRegions, RegionInfo};

/// Result of reading a single byte that is expected to hold a bool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagRead {
    /// Raw byte, `None` if the read failed
    pub raw: Option<u8>,
}

impl FlagRead {
    /// The byte was readable and is 0 or 1
    pub fn is_plausible(&self) -> bool {
        matches!(self.raw, Some(0 | 1))
    }

    /// Interpret any non-zero byte as true
    pub fn value(&self) -> Option<bool> {
        self.raw.map(|b| b != 0)
    }
}

/// Reader wrapper owning the per-scan pointer cache.
///
/// Pointer reads are memoized by address until `clear_pointer_cache` is
/// called; failed pointer reads are memoized as 0.
pub struct MemoryAccessor<R> {
    reader: R,
    pointers: RefCell<HashMap<u64, u64>>,
}

impl<R: ReadMemory> MemoryAccessor<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pointers: RefCell::new(HashMap::new()),
        }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn clear_pointer_cache(&self) {
        self.pointers.borrow_mut().clear();
    }

    pub fn cached_pointers(&self) -> usize {
        self.pointers.borrow().len()
    }

    pub fn read_bytes(&self, address: u64, size: usize) -> Option<Vec<u8>> {
        self.reader.read_bytes(address, size).ok()
    }

    pub fn read_u8(&self, address: u64) -> Option<u8> {
        self.reader.read_u8(address).ok()
    }

    pub fn read_i32(&self, address: u64) -> Option<i32> {
        self.reader.read_i32(address).ok()
    }

    pub fn read_i64(&self, address: u64) -> Option<i64> {
        self.reader.read_i64(address).ok()
    }

    pub fn read_flag(&self, address: u64) -> FlagRead {
        FlagRead {
            raw: self.read_u8(address),
        }
    }

    /// Read a 64-bit pointer through the cache. Unreadable means null.
    pub fn read_pointer(&self, address: u64) -> u64 {
        if let Some(&cached) = self.pointers.borrow().get(&address) {
            return cached;
        }
        let value = self.reader.read_u64(address).unwrap_or(0);
        self.pointers.borrow_mut().insert(address, value);
        value
    }
}

impl<R: QueryRegions> QueryRegions for MemoryAccessor<R> {
    fn query_region(&self, address: u64) -> Option<RegionInfo> {
        self.reader.query_region(address)
    }
}
