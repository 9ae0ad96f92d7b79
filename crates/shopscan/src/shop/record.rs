use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr, IntoStaticStr};

/// Name used when an item's name string cannot be decoded
pub const UNKNOWN_ITEM_NAME: &str = "Unknown Item";
/// Description used when neither description string can be decoded
pub const NO_DESCRIPTION: &str = "No description";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    FromRepr,
    IntoStaticStr,
    Display,
)]
#[repr(u8)]
pub enum Rarity {
    #[strum(serialize = "Common")]
    Common = 0,
    #[strum(serialize = "Rare")]
    Rare = 1,
    #[strum(serialize = "Epic")]
    Epic = 2,
    #[strum(serialize = "Legendary")]
    Legendary = 3,
}

impl Rarity {
    /// Map a raw in-memory value; anything outside 0-3 is unknown
    pub fn from_raw(value: i32) -> Option<Self> {
        u8::try_from(value).ok().and_then(Self::from_repr)
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Common => "●",
            Self::Rare => "●●",
            Self::Epic => "●●●",
            Self::Legendary => "★",
        }
    }

    /// Display colour as RGB
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Self::Common => (0x9E, 0x9E, 0x9E),
            Self::Rare => (0x41, 0x69, 0xE1),
            Self::Epic => (0x93, 0x70, 0xDB),
            Self::Legendary => (0xFF, 0xD7, 0x00),
        }
    }

    /// Display colour as `#RRGGBB`
    pub fn color_code(&self) -> String {
        let (r, g, b) = self.rgb();
        format!("#{:02X}{:02X}{:02X}", r, g, b)
    }
}

/// Symbol for a raw rarity value, `?` when unknown
pub fn rarity_symbol(raw: Option<i32>) -> &'static str {
    raw.and_then(Rarity::from_raw)
        .map(|r| r.symbol())
        .unwrap_or("?")
}

/// One item offered by a shop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub name: String,
    pub description: String,
    /// 0-3, `None` if unreadable or out of range
    pub rarity: Option<i32>,
    pub max_amount: Option<i32>,
    pub in_pool: bool,
}

impl ItemRecord {
    pub fn rarity_tier(&self) -> Option<Rarity> {
        self.rarity.and_then(Rarity::from_raw)
    }
}

/// A decoded shop.
///
/// `items` always holds exactly three entries; `prices` is index-aligned with
/// `items` and may be shorter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopRecord {
    /// Address of the shop object in the game process (only valid for this run)
    pub address: u64,
    pub rarity: i32,
    pub done: bool,
    pub items: Vec<ItemRecord>,
    pub prices: Vec<i32>,
}

impl ShopRecord {
    pub fn rarity_tier(&self) -> Option<Rarity> {
        Rarity::from_raw(self.rarity)
    }

    /// Price of the item at `index`, 0 when the price list is shorter
    pub fn price(&self, index: usize) -> i32 {
        self.prices.get(index).copied().unwrap_or(0)
    }

    /// Items paired with their prices
    pub fn offers(&self) -> impl Iterator<Item = (&ItemRecord, i32)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (item, self.price(i)))
    }
}
