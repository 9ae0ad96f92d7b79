//! Decoding of shop, item, list and string objects from the game heap.

use crate::process::layout::{ItemLayout, ListLayout, StringLayout};
use crate::process::{Layout, MemoryAccessor, ReadMemory, decode_utf16le};

use super::record::{ItemRecord, NO_DESCRIPTION, ShopRecord, UNKNOWN_ITEM_NAME};

/// Header of a managed generic list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListHeader {
    /// Backing array pointer (0 if unreadable)
    pub storage: u64,
    /// Element count (0 if unreadable)
    pub count: i32,
}

impl ListHeader {
    pub fn len(&self) -> usize {
        self.count.max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count <= 0
    }
}

/// Read a list header; a null list or unreadable fields give an empty header
pub fn read_list<R: ReadMemory>(
    accessor: &MemoryAccessor<R>,
    list_ptr: u64,
    layout: &ListLayout,
) -> ListHeader {
    if list_ptr == 0 {
        return ListHeader::default();
    }
    ListHeader {
        storage: accessor.read_pointer(list_ptr.wrapping_add(layout.storage)),
        count: accessor.read_i32(list_ptr.wrapping_add(layout.count)).unwrap_or(0),
    }
}

/// Read a managed string object.
///
/// `string_ptr` comes straight from foreign memory, so field addresses wrap
/// instead of overflowing; a wrapped address simply fails to read. Lengths outside `1..=max_length` are rejected before the character data is
/// read. Malformed UTF-16 is replaced, not rejected.
pub fn read_managed_string<R: ReadMemory>(
    accessor: &MemoryAccessor<R>,
    string_ptr: u64,
    layout: &StringLayout,
) -> Option<String> {
    if string_ptr == 0 {
        return None;
    }
    let length = accessor.read_i32(string_ptr.wrapping_add(layout.length))?;
    if length <= 0 || length > layout.max_length {
        return None;
    }
    let bytes = accessor.read_bytes(string_ptr.wrapping_add(layout.chars), length as usize * 2)?;
    Some(decode_utf16le(&bytes))
}

fn read_text<R: ReadMemory>(
    accessor: &MemoryAccessor<R>,
    string_ptr: u64,
    layout: &StringLayout,
) -> Option<String> {
    read_managed_string(accessor, string_ptr, layout).filter(|s| !s.is_empty())
}

/// Decode one item object.
///
/// Returns `None` only for a null pointer or an unreadable in-pool flag;
/// strings and integers fall back to placeholders or "unknown".
pub fn decode_item<R: ReadMemory>(
    accessor: &MemoryAccessor<R>,
    item_ptr: u64,
    layout: &ItemLayout,
    strings: &StringLayout,
) -> Option<ItemRecord> {
    if item_ptr == 0 {
        return None;
    }

    let in_pool = accessor.read_flag(item_ptr.wrapping_add(layout.in_pool)).value()?;
    let name_ptr = accessor.read_pointer(item_ptr.wrapping_add(layout.name));
    let description_ptr = accessor.read_pointer(item_ptr.wrapping_add(layout.description));
    let short_ptr = accessor.read_pointer(item_ptr.wrapping_add(layout.short_description));
    let rarity = accessor
        .read_i32(item_ptr.wrapping_add(layout.rarity))
        .filter(|r| (0..=3).contains(r));
    let max_amount = accessor.read_i32(item_ptr.wrapping_add(layout.max_amount));

    let name = read_text(accessor, name_ptr, strings).unwrap_or_else(|| UNKNOWN_ITEM_NAME.to_string());
    let description = read_text(accessor, short_ptr, strings)
        .or_else(|| read_text(accessor, description_ptr, strings))
        .unwrap_or_else(|| NO_DESCRIPTION.to_string());

    Some(ItemRecord {
        name,
        description,
        rarity,
        max_amount,
        in_pool,
    })
}

/// Decode a complete shop at `address`.
///
/// All-or-nothing: a null pointer, failed read, wrong item count or bad item
/// drops the whole shop. Individual prices that can't be read become 0.
pub fn decode_shop<R: ReadMemory>(
    accessor: &MemoryAccessor<R>,
    address: u64,
    layout: &Layout,
) -> Option<ShopRecord> {
    let shop = &layout.shop;

    let items_list = accessor.read_pointer(address.wrapping_add(shop.items));
    let prices_list = accessor.read_pointer(address.wrapping_add(shop.prices));
    if items_list == 0 || prices_list == 0 {
        return None;
    }

    let items_header = read_list(accessor, items_list, &layout.list);
    if items_header.storage == 0 || items_header.len() != shop.item_count {
        return None;
    }

    let prices_header = read_list(accessor, prices_list, &layout.list);
    if prices_header.storage == 0 {
        return None;
    }
    let prices = (0..prices_header.len().min(items_header.len()))
        .map(|i| {
            let slot = layout
                .list
                .element_address(prices_header.storage, i, shop.price_stride);
            accessor.read_i32(slot).unwrap_or(0)
        })
        .collect();

    let mut items = Vec::with_capacity(items_header.len());
    for i in 0..items_header.len() {
        let slot = layout
            .list
            .element_address(items_header.storage, i, shop.item_stride);
        let item_ptr = accessor.read_pointer(slot);
        items.push(decode_item(accessor, item_ptr, &layout.item, &layout.string)?);
    }

    let done = accessor.read_flag(address.wrapping_add(shop.done)).value()?;
    let rarity = accessor
        .read_i32(address.wrapping_add(shop.rarity))
        .filter(|r| (0..=3).contains(r))?;

    Some(ShopRecord {
        address,
        rarity,
        done,
        items,
        prices,
    })
}
