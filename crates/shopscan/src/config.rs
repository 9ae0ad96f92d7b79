//! Scanner configuration.
//!
//! ```ignore
//! use shopscan::ScannerConfig;
//!
//! let config = ScannerConfig::builder()
//!     .process_name("MegaBonk.exe")
//!     .cache_path("regions.json")
//!     .build();
//! ```

use std::path::PathBuf;

use crate::process::{Layout, RegionFilter};

/// Default target executable
pub const DEFAULT_PROCESS_NAME: &str = "MegaBonk.exe";
/// Default region cache file, relative to the working directory
pub const DEFAULT_CACHE_FILE: &str = "shop_scanner_config.json";

/// Configuration for a `ShopScanner`
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Executable name of the target process
    pub process_name: String,
    /// Where learned regions are persisted
    pub cache_path: PathBuf,
    /// Object layout used by the validator and decoder
    pub layout: Layout,
    /// Region filter for full scans
    pub region_filter: RegionFilter,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            process_name: DEFAULT_PROCESS_NAME.to_string(),
            cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            layout: Layout::MEGABONK,
            region_filter: RegionFilter::default(),
        }
    }
}

impl ScannerConfig {
    /// Create a new configuration builder
    pub fn builder() -> ScannerConfigBuilder {
        ScannerConfigBuilder::default()
    }
}

/// Builder for ScannerConfig
#[derive(Debug, Clone, Default)]
pub struct ScannerConfigBuilder {
    process_name: Option<String>,
    cache_path: Option<PathBuf>,
    layout: Option<Layout>,
    region_filter: Option<RegionFilter>,
}

impl ScannerConfigBuilder {
    /// Set the target executable name
    pub fn process_name<S: Into<String>>(mut self, name: S) -> Self {
        self.process_name = Some(name.into());
        self
    }

    /// Set the region cache path
    pub fn cache_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Use a different offset table, e.g. for another game build
    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Override the region filter used by full scans
    pub fn region_filter(mut self, filter: RegionFilter) -> Self {
        self.region_filter = Some(filter);
        self
    }

    /// Build the configuration
    pub fn build(self) -> ScannerConfig {
        let default = ScannerConfig::default();
        ScannerConfig {
            process_name: self.process_name.unwrap_or(default.process_name),
            cache_path: self.cache_path.unwrap_or(default.cache_path),
            layout: self.layout.unwrap_or(default.layout),
            region_filter: self.region_filter.unwrap_or(default.region_filter),
        }
    }
}
