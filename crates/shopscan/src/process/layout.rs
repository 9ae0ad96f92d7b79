//! Memory layout constants for the game's managed shop structures
//!
//! Every offset the scanner relies on lives in one table so a game update only
//! requires editing this file. The values were taken by hand from a single
//! build; nothing here is discovered at runtime.

/// Lower bound (exclusive) of values accepted as heap pointers
pub const MIN_PLAUSIBLE_POINTER: u64 = 0x10000;
/// Upper bound (exclusive) of values accepted as heap pointers (48-bit user space)
pub const MAX_PLAUSIBLE_POINTER: u64 = 0x7FFF_FFFF_FFFF;

/// Heuristic "could this be a heap address" check.
///
/// Passing this says nothing about whether the address is actually mapped.
pub fn is_plausible_pointer(value: u64) -> bool {
    value > MIN_PLAUSIBLE_POINTER && value < MAX_PLAUSIBLE_POINTER
}

/// Shop object layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopLayout {
    /// Shop rarity (i32, 0-3)
    pub rarity: u64,
    /// Pointer to the item list
    pub items: u64,
    /// Pointer to the price list
    pub prices: u64,
    /// Pointer-looking field checked by the pre-filter only; meaning unknown
    pub reserved_pointer: u64,
    /// Completion flag (single byte, 0 or 1)
    pub done: u64,
    /// Bytes a candidate must have available after its start in a region buffer
    pub extent: usize,
    /// Candidate alignment within a region
    pub alignment: usize,
    /// Number of items (and prices) every shop carries
    pub item_count: usize,
    /// Size of one element in the item list storage (object pointer)
    pub item_stride: u64,
    /// Size of one element in the price list storage (i32)
    pub price_stride: u64,
}

/// Item object layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemLayout {
    /// Whether the item is still in the pool (single byte)
    pub in_pool: u64,
    /// Pointer to the object the item name is read from
    pub name: u64,
    /// Pointer to the long description string
    pub description: u64,
    /// Pointer to the short description string
    pub short_description: u64,
    /// Item rarity (i32)
    pub rarity: u64,
    /// Maximum stack amount (i32)
    pub max_amount: u64,
}

/// Managed generic list layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLayout {
    /// Pointer to the backing array
    pub storage: u64,
    /// Element count (i32)
    pub count: u64,
    /// Offset of element 0 inside the backing array
    pub first_element: u64,
}

impl ListLayout {
    /// Address of element `index` in a backing array of `stride`-sized elements
    pub fn element_address(&self, storage: u64, index: usize, stride: u64) -> u64 {
        storage
            .wrapping_add(self.first_element)
            .wrapping_add(index as u64 * stride)
    }
}

/// Managed string layout: i32 length followed by UTF-16LE code units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringLayout {
    /// Length in UTF-16 code units (i32)
    pub length: u64,
    /// First code unit
    pub chars: u64,
    /// Longest string the decoder will read
    pub max_length: i32,
}

/// Complete offset table consumed by the decoder and the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub shop: ShopLayout,
    pub item: ItemLayout,
    pub list: ListLayout,
    pub string: StringLayout,
}

impl Layout {
    /// MegaBonk (x64, managed runtime) layout
    pub const MEGABONK: Layout = Layout {
        shop: ShopLayout {
            rarity: 0x90,
            items: 0x98,
            prices: 0xA0,
            reserved_pointer: 0xA8,
            done: 0xB8,
            extent: 0xC0,
            alignment: 8,
            item_count: 3,
            item_stride: 8,
            price_stride: 4,
        },
        item: ItemLayout {
            in_pool: 0x50,
            name: 0x54,
            description: 0x58,
            short_description: 0x60,
            rarity: 0x70,
            max_amount: 0x80,
        },
        list: ListLayout {
            storage: 0x10,
            count: 0x18,
            first_element: 0x20,
        },
        string: StringLayout {
            length: 0x10,
            chars: 0x14,
            max_length: 500,
        },
    };
}

impl Default for Layout {
    fn default() -> Self {
        Self::MEGABONK
    }
}
