//! Prelude module for convenient imports
//!
//! ```ignore
//! use shopscan::prelude::*;
//! ```

// Scanner
pub use crate::config::ScannerConfig;
pub use crate::scan::{NoopObserver, ScanCallbacks, ScanObserver, ShopScanner};

// Process access
pub use crate::process::{MemoryReader, ProcessHandle, QueryRegions, ReadMemory};

// Records
pub use crate::shop::{ItemRecord, Rarity, ShopRecord};

// Error handling
pub use crate::error::{Error, Result};
