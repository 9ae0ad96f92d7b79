//! In-memory stand-in for a foreign process.
//!
//! `MockMemoryBuilder` lays out a sparse 64-bit address space page by page,
//! registers regions for the walker, and can plant complete shop object graphs
//! using the MegaBonk layout. `MockMemoryReader` counts every read and region
//! query so tests can assert on round trips.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

use super::layout::Layout;
use super::reader::ReadMemory;
use super::region::{
    MEM_COMMIT, MEM_FREE, MEM_PRIVATE, PAGE_NOACCESS, PAGE_READWRITE, QueryRegions, RegionInfo,
};

const PAGE_SIZE: u64 = 0x1000;

/// Default start of the bump allocator used for planted heap objects
pub const MOCK_HEAP_BASE: u64 = 0x5000_0000;

fn page_of(address: u64) -> u64 {
    address & !(PAGE_SIZE - 1)
}

/// Item fields to plant
#[derive(Debug, Clone)]
pub struct MockItem {
    pub name: Option<String>,
    /// Long description. The layout overlaps this pointer with the upper half
    /// of the name pointer, so planting both leaves the description unreadable.
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub rarity: i32,
    pub max_amount: i32,
    pub in_pool: u8,
}

impl MockItem {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            description: None,
            short_description: Some(format!("{} description", name)),
            rarity: 1,
            max_amount: 5,
            in_pool: 1,
        }
    }
}

/// Shop fields to plant
#[derive(Debug, Clone)]
pub struct MockShop {
    pub rarity: i32,
    pub done: u8,
    pub items: Vec<MockItem>,
    pub prices: Vec<i32>,
}

impl MockShop {
    /// A well-formed shop with three items
    pub fn standard(rarity: i32, names: [&str; 3], prices: [i32; 3]) -> Self {
        Self {
            rarity,
            done: 0,
            items: names.iter().map(|n| MockItem::named(n)).collect(),
            prices: prices.to_vec(),
        }
    }
}

/// Addresses of the objects created by `MockMemoryBuilder::plant_shop`
#[derive(Debug, Clone)]
pub struct PlantedShop {
    pub address: u64,
    pub items_list: u64,
    pub items_storage: u64,
    pub prices_list: u64,
    pub prices_storage: u64,
    pub items: Vec<u64>,
}

#[derive(Debug, Clone)]
pub struct MockMemoryBuilder {
    pages: BTreeMap<u64, Vec<u8>>,
    regions: Vec<RegionInfo>,
    heap_cursor: u64,
    layout: Layout,
}

impl Default for MockMemoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self {
            pages: BTreeMap::new(),
            regions: Vec::new(),
            heap_cursor: MOCK_HEAP_BASE,
            layout: Layout::MEGABONK,
        }
    }

    /// Committed private read-write region, zero-filled
    pub fn region(self, base: u64, size: u64) -> Self {
        self.region_with(base, size, PAGE_READWRITE, MEM_PRIVATE)
    }

    /// Region with explicit protection and type; its pages are still readable
    pub fn region_with(mut self, base: u64, size: u64, protect: u32, kind: u32) -> Self {
        self.add_region(base, size, protect, kind);
        self
    }

    pub fn add_region(&mut self, base: u64, size: u64, protect: u32, kind: u32) {
        self.map(base, size as usize);
        self.regions.push(RegionInfo {
            base,
            size,
            state: MEM_COMMIT,
            protect,
            kind,
        });
        self.regions.sort_by_key(|r| r.base);
    }

    fn map(&mut self, address: u64, size: usize) {
        if size == 0 {
            return;
        }
        let last = address + size as u64 - 1;
        let mut page = page_of(address);
        while page <= last {
            self.pages
                .entry(page)
                .or_insert_with(|| vec![0u8; PAGE_SIZE as usize]);
            page += PAGE_SIZE;
        }
    }

    pub fn put_bytes(&mut self, address: u64, bytes: &[u8]) {
        self.map(address, bytes.len());
        for (i, byte) in bytes.iter().enumerate() {
            let addr = address + i as u64;
            if let Some(page) = self.pages.get_mut(&page_of(addr)) {
                page[(addr - page_of(addr)) as usize] = *byte;
            }
        }
    }

    pub fn write_bytes(mut self, address: u64, bytes: &[u8]) -> Self {
        self.put_bytes(address, bytes);
        self
    }

    pub fn write_u8(self, address: u64, value: u8) -> Self {
        self.write_bytes(address, &[value])
    }

    pub fn write_i32(self, address: u64, value: i32) -> Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn write_u64(self, address: u64, value: u64) -> Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    /// Reserve `size` bytes of heap outside every registered region
    pub fn alloc(&mut self, size: u64) -> u64 {
        let address = self.heap_cursor;
        self.heap_cursor = (self.heap_cursor + size + 0xF) & !0xF;
        self.map(address, size as usize);
        address
    }

    /// Write a managed string object and return its address
    pub fn put_managed_string(&mut self, value: &str) -> u64 {
        let units: Vec<u8> = value.encode_utf16().flat_map(u16::to_le_bytes).collect();
        let string = self.layout.string;
        let address = self.alloc(string.chars + units.len() as u64);
        self.put_bytes(address + string.length, &((units.len() / 2) as i32).to_le_bytes());
        self.put_bytes(address + string.chars, &units);
        address
    }

    fn put_list(&mut self, count: usize, stride: u64) -> (u64, u64) {
        let list = self.layout.list;
        let list_address = self.alloc(list.count + 8);
        let storage = self.alloc(list.first_element + count as u64 * stride);
        self.put_bytes(list_address + list.storage, &storage.to_le_bytes());
        self.put_bytes(list_address + list.count, &(count as i32).to_le_bytes());
        (list_address, storage)
    }

    fn put_item(&mut self, item: &MockItem) -> u64 {
        let layout = self.layout.item;
        let address = self.alloc(layout.max_amount + 8);

        self.put_bytes(address + layout.in_pool, &[item.in_pool]);
        if let Some(ref text) = item.description {
            let ptr = self.put_managed_string(text);
            self.put_bytes(address + layout.description, &ptr.to_le_bytes());
        }
        if let Some(ref text) = item.name {
            let ptr = self.put_managed_string(text);
            self.put_bytes(address + layout.name, &ptr.to_le_bytes());
        }
        if let Some(ref text) = item.short_description {
            let ptr = self.put_managed_string(text);
            self.put_bytes(address + layout.short_description, &ptr.to_le_bytes());
        }
        self.put_bytes(address + layout.rarity, &item.rarity.to_le_bytes());
        self.put_bytes(address + layout.max_amount, &item.max_amount.to_le_bytes());
        address
    }

    /// Plant a shop object at `address` with its lists, items and strings on the heap
    pub fn plant_shop(&mut self, address: u64, shop: &MockShop) -> PlantedShop {
        let layout = self.layout;

        let (items_list, items_storage) =
            self.put_list(shop.items.len(), layout.shop.item_stride);
        let mut items = Vec::with_capacity(shop.items.len());
        for (index, item) in shop.items.iter().enumerate() {
            let item_address = self.put_item(item);
            let slot = layout
                .list
                .element_address(items_storage, index, layout.shop.item_stride);
            self.put_bytes(slot, &item_address.to_le_bytes());
            items.push(item_address);
        }

        let (prices_list, prices_storage) =
            self.put_list(shop.prices.len(), layout.shop.price_stride);
        for (index, price) in shop.prices.iter().enumerate() {
            let slot = layout
                .list
                .element_address(prices_storage, index, layout.shop.price_stride);
            self.put_bytes(slot, &price.to_le_bytes());
        }

        let reserved = self.alloc(0x10);
        self.put_bytes(address + layout.shop.rarity, &shop.rarity.to_le_bytes());
        self.put_bytes(address + layout.shop.items, &items_list.to_le_bytes());
        self.put_bytes(address + layout.shop.prices, &prices_list.to_le_bytes());
        self.put_bytes(address + layout.shop.reserved_pointer, &reserved.to_le_bytes());
        self.put_bytes(address + layout.shop.done, &[shop.done]);

        PlantedShop {
            address,
            items_list,
            items_storage,
            prices_list,
            prices_storage,
            items,
        }
    }

    pub fn shop(mut self, address: u64, shop: &MockShop) -> Self {
        self.plant_shop(address, shop);
        self
    }

    pub fn build(self) -> MockMemoryReader {
        MockMemoryReader {
            pages: self.pages,
            regions: self.regions,
            reads: Cell::new(0),
            queries: Cell::new(0),
            read_log: RefCell::new(Vec::new()),
        }
    }
}

/// Sparse in-memory address space implementing the reader traits
#[derive(Debug)]
pub struct MockMemoryReader {
    pages: BTreeMap<u64, Vec<u8>>,
    regions: Vec<RegionInfo>,
    reads: Cell<usize>,
    queries: Cell<usize>,
    read_log: RefCell<Vec<(u64, usize)>>,
}

impl MockMemoryReader {
    /// Total `read_bytes` calls, successful or not
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    /// Number of reads that started at `address`
    pub fn reads_at(&self, address: u64) -> usize {
        self.read_log
            .borrow()
            .iter()
            .filter(|(addr, _)| *addr == address)
            .count()
    }

    /// Total region queries
    pub fn query_count(&self) -> usize {
        self.queries.get()
    }

    pub fn reset_counters(&self) {
        self.reads.set(0);
        self.queries.set(0);
        self.read_log.borrow_mut().clear();
    }
}

impl ReadMemory for MockMemoryReader {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.reads.set(self.reads.get() + 1);
        self.read_log.borrow_mut().push((address, size));

        let end = address
            .checked_add(size as u64)
            .ok_or_else(|| Error::read_failed(address, "address overflow"))?;
        let mut out = Vec::with_capacity(size);
        let mut cursor = address;
        while cursor < end {
            let page_base = page_of(cursor);
            let page = self
                .pages
                .get(&page_base)
                .ok_or_else(|| Error::read_failed(address, "unmapped page"))?;
            let start = (cursor - page_base) as usize;
            let take = ((end - cursor) as usize).min(PAGE_SIZE as usize - start);
            out.extend_from_slice(&page[start..start + take]);
            cursor += take as u64;
        }
        Ok(out)
    }
}

impl QueryRegions for MockMemoryReader {
    fn query_region(&self, address: u64) -> Option<RegionInfo> {
        self.queries.set(self.queries.get() + 1);

        if let Some(region) = self
            .regions
            .iter()
            .find(|r| address >= r.base && address < r.base + r.size)
        {
            return Some(*region);
        }

        // Gap up to the next registered region is reported as free space
        let next = self.regions.iter().find(|r| r.base > address)?;
        let base = page_of(address);
        Some(RegionInfo {
            base,
            size: next.base - base,
            state: MEM_FREE,
            protect: PAGE_NOACCESS,
            kind: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_spanning_pages() {
        let reader = MockMemoryBuilder::new()
            .region(0x10000, 0x2000)
            .write_bytes(0x10FFE, &[1, 2, 3, 4])
            .build();

        assert_eq!(reader.read_bytes(0x10FFE, 4).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(reader.read_count(), 1);
    }

    #[test]
    fn test_read_past_mapping_fails() {
        let reader = MockMemoryBuilder::new().region(0x10000, 0x1000).build();
        assert!(reader.read_bytes(0x10FFC, 8).is_err());
        assert_eq!(reader.reads_at(0x10FFC), 1);
    }

    #[test]
    fn test_query_reports_gaps_as_free() {
        let reader = MockMemoryBuilder::new().region(0x20000, 0x1000).build();

        let gap = reader.query_region(0).unwrap();
        assert_eq!(gap.state, MEM_FREE);
        assert_eq!(gap.base + gap.size, 0x20000);

        let region = reader.query_region(0x20800).unwrap();
        assert_eq!(region.base, 0x20000);
        assert!(reader.query_region(0x21000).is_none());
    }

    #[test]
    fn test_plant_shop_wires_lists() {
        let mut builder = MockMemoryBuilder::new().region(0x10_0000, 0x20000);
        let planted = builder.plant_shop(
            0x10_0100,
            &MockShop::standard(2, ["Sword", "Shield", "Boots"], [10, 20, 30]),
        );
        let reader = builder.build();
        let list = Layout::MEGABONK.list;

        assert_eq!(reader.read_u64(0x10_0100 + 0x98).unwrap(), planted.items_list);
        assert_eq!(
            reader.read_u64(planted.items_list + list.storage).unwrap(),
            planted.items_storage
        );
        assert_eq!(reader.read_i32(planted.items_list + list.count).unwrap(), 3);
        assert_eq!(
            reader.read_i32(planted.prices_storage + list.first_element + 4).unwrap(),
            20
        );
    }
}
