//! Shop candidate validation.
//!
//! Two tiers: `quick_validate` works on a region buffer that has already been
//! copied out of the process and runs at every aligned offset, so it must not
//! touch the process. `confirm_shop` only runs on survivors and follows the
//! list pointers with live reads.

use crate::process::layout::ShopLayout;
use crate::process::{ByteBuffer, Layout, MemoryAccessor, ReadMemory, is_plausible_pointer};

use super::decoder::read_list;

/// Check the fixed shop fields at `offset` in `buffer`.
///
/// Buffer layout relative to `offset`:
/// - 0x90: rarity (i32, 0-3)
/// - 0x98: items list pointer
/// - 0xA0: prices list pointer
/// - 0xA8: pointer of unknown purpose
/// - 0xB8: done flag (0 or 1)
pub fn quick_validate(buffer: &[u8], offset: usize, layout: &ShopLayout) -> bool {
    let buf = ByteBuffer::new(buffer);
    let at = |field: u64| offset.checked_add(field as usize);

    let rarity = at(layout.rarity).and_then(|o| buf.i32_at(o));
    if !matches!(rarity, Some(0..=3)) {
        return false;
    }

    for field in [layout.items, layout.prices, layout.reserved_pointer] {
        match at(field).and_then(|o| buf.u64_at(o)) {
            Some(ptr) if is_plausible_pointer(ptr) => {}
            _ => return false,
        }
    }

    matches!(at(layout.done).and_then(|o| buf.u8_at(o)), Some(0 | 1))
}

/// Offsets in `buffer` the scanner feeds to `quick_validate`
pub fn scan_offsets(len: usize, layout: &ShopLayout) -> impl Iterator<Item = usize> {
    (0..len.saturating_sub(layout.extent)).step_by(layout.alignment.max(1))
}

/// Every offset in `buffer` that passes the pre-filter, in ascending order
pub fn candidate_offsets(buffer: &[u8], layout: &ShopLayout) -> Vec<usize> {
    scan_offsets(buffer.len(), layout)
        .filter(|&offset| quick_validate(buffer, offset, layout))
        .collect()
}

/// Confirm a shop at `address` with live reads.
///
/// Both lists must hold exactly `item_count` elements and have plausible
/// backing arrays.
pub fn confirm_shop<R: ReadMemory>(
    accessor: &MemoryAccessor<R>,
    address: u64,
    layout: &Layout,
) -> bool {
    let shop = &layout.shop;

    let Some(rarity) = accessor.read_i32(address.wrapping_add(shop.rarity)) else {
        return false;
    };
    if !(0..=3).contains(&rarity) {
        return false;
    }

    let items_ptr = accessor.read_pointer(address.wrapping_add(shop.items));
    if !is_plausible_pointer(items_ptr) {
        return false;
    }

    let prices_ptr = accessor.read_pointer(address.wrapping_add(shop.prices));
    if !is_plausible_pointer(prices_ptr) {
        return false;
    }

    if !accessor.read_flag(address.wrapping_add(shop.done)).is_plausible() {
        return false;
    }

    let items = read_list(accessor, items_ptr, &layout.list);
    let prices = read_list(accessor, prices_ptr, &layout.list);

    let expected = shop.item_count as i32;
    if items.count != expected || prices.count != expected {
        return false;
    }

    is_plausible_pointer(items.storage) && is_plausible_pointer(prices.storage)
}
