//! Shop scanner for MegaBonk.
//!
//! Reads the memory of a running `MegaBonk.exe`, finds the game's shop
//! objects by pattern and pointer validation, and decodes their items, prices
//! and state. Regions that held shops are remembered in a small JSON file so
//! later scans can skip the full address space walk.
//!
//! The process layer (`ProcessHandle`, `MemoryReader`) only talks to a real
//! process on Windows. Everything above it works against the `ReadMemory` and
//! `QueryRegions` traits.

pub mod config;
pub mod error;
pub mod export;
pub mod prelude;
pub mod process;
pub mod scan;
pub mod shop;

pub use config::{ScannerConfig, ScannerConfigBuilder};
pub use error::{Error, Result};
pub use export::shops_to_json;
pub use process::{
    Layout, MemoryReader, MemoryRegion, ProcessHandle, QueryRegions, ReadMemory, RegionFilter,
};
pub use scan::{
    NoopObserver, RegionCache, RegionScan, ScanCallbacks, ScanObserver, ShopScanner,
};
pub use shop::{ItemRecord, Rarity, ShopRecord};
