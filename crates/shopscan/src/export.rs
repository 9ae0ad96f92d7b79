//! JSON export of decoded shops

use serde::Serialize;

use crate::shop::{ShopRecord, rarity_symbol};

/// Item entry in the export
#[derive(Debug, Clone, Serialize)]
pub struct ItemJson<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub rarity: Option<i32>,
    pub rarity_name: Option<&'static str>,
    pub max_amount: Option<i32>,
    pub in_pool: bool,
    pub price: i32,
}

/// Shop entry in the export
#[derive(Debug, Clone, Serialize)]
pub struct ShopJson<'a> {
    pub address: String,
    pub rarity: i32,
    pub rarity_name: Option<&'static str>,
    pub symbol: &'static str,
    pub done: bool,
    pub items: Vec<ItemJson<'a>>,
}

impl<'a> From<&'a ShopRecord> for ShopJson<'a> {
    fn from(shop: &'a ShopRecord) -> Self {
        ShopJson {
            address: format!("0x{:X}", shop.address),
            rarity: shop.rarity,
            rarity_name: shop.rarity_tier().map(|r| r.name()),
            symbol: rarity_symbol(Some(shop.rarity)),
            done: shop.done,
            items: shop
                .offers()
                .map(|(item, price)| ItemJson {
                    name: &item.name,
                    description: &item.description,
                    rarity: item.rarity,
                    rarity_name: item.rarity_tier().map(|r| r.name()),
                    max_amount: item.max_amount,
                    in_pool: item.in_pool,
                    price,
                })
                .collect(),
        }
    }
}

/// Pretty-printed JSON array of shops, prices folded into their items
pub fn shops_to_json(shops: &[ShopRecord]) -> serde_json::Result<String> {
    let entries: Vec<ShopJson<'_>> = shops.iter().map(ShopJson::from).collect();
    serde_json::to_string_pretty(&entries)
}
