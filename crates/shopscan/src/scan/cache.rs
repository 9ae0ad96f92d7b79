//! Learned region cache
//!
//! Remembers which regions held shops during the last full scan so the next
//! scan can try them before walking the whole address space. The file is a
//! bare JSON array of `{"base": .., "size": ..}` objects.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::process::MemoryRegion;

/// Regions loaded from (and written back to) a cache file
#[derive(Debug, Clone)]
pub struct RegionCache {
    path: PathBuf,
    regions: Vec<MemoryRegion>,
}

impl RegionCache {
    /// Empty cache bound to `path`; nothing is read
    pub fn empty<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            regions: Vec::new(),
        }
    }

    /// Cache bound to `path` holding `regions`; nothing is read or written
    pub fn with_regions<P: Into<PathBuf>>(path: P, regions: Vec<MemoryRegion>) -> Self {
        Self {
            path: path.into(),
            regions,
        }
    }

    /// Load the cache at `path`. A missing or malformed file yields an empty cache.
    pub fn load<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let regions = Self::load_from_path(&path).unwrap_or_default();
        Self { path, regions }
    }

    /// Read regions from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Option<Vec<MemoryRegion>> {
        let path = path.as_ref();

        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                debug!("Region cache not found or unreadable: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<Vec<MemoryRegion>>(&content) {
            Ok(regions) => {
                debug!("Loaded {} learned region(s) from {}", regions.len(), path.display());
                Some(regions)
            }
            Err(e) => {
                warn!("Failed to parse region cache: {}", e);
                None
            }
        }
    }

    /// Write regions to a specific path
    pub fn save_to_path<P: AsRef<Path>>(regions: &[MemoryRegion], path: P) -> Result<()> {
        let content = serde_json::to_string(regions)?;

        fs::write(&path, content)?;
        info!(
            "Saved {} region(s) to {}",
            regions.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Replace the cached regions and persist them.
    ///
    /// The in-memory set is updated even when the write fails.
    pub fn replace(&mut self, regions: Vec<MemoryRegion>) -> Result<()> {
        self.regions = regions;
        Self::save_to_path(&self.regions, &self.path)
    }

    /// Forget the in-memory regions; the file is left as is
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// Delete the cache file. A file that doesn't exist counts as removed.
    pub fn remove_file(&mut self) -> Result<()> {
        self.regions.clear();
        match fs::remove_file(&self.path).map_err(Error::from) {
            Err(e) if !e.is_not_found() => Err(e),
            _ => Ok(()),
        }
    }

    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, tempdir};

    #[test]
    fn test_cache_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();

        let mut cache = RegionCache::empty(&path);
        cache
            .replace(vec![
                MemoryRegion::new(0x1A0_0000, 0x40000),
                MemoryRegion::new(0x2B0_0000, 0x80000),
            ])
            .unwrap();

        let loaded = RegionCache::load(&path);
        assert_eq!(loaded.regions(), cache.regions());
    }

    #[test]
    fn test_file_format() {
        let temp_file = NamedTempFile::new().unwrap();
        RegionCache::save_to_path(&[MemoryRegion::new(4096, 65536)], temp_file.path()).unwrap();

        let raw = fs::read_to_string(temp_file.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!([{ "base": 4096, "size": 65536 }]));
    }

    #[test]
    fn test_reads_foreign_writer_output() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(
            temp_file.path(),
            r#"[{"base": 2199023255552, "size": 131072}, {"size": 65537, "base": 1048576}]"#,
        )
        .unwrap();

        let cache = RegionCache::load(temp_file.path());
        assert_eq!(
            cache.regions(),
            &[
                MemoryRegion::new(0x200_0000_0000, 0x20000),
                MemoryRegion::new(0x10_0000, 0x10001),
            ]
        );
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let cache = RegionCache::load(dir.path().join("nope.json"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_malformed_file_is_empty() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "{ not json").unwrap();
        assert!(RegionCache::load(temp_file.path()).is_empty());

        fs::write(temp_file.path(), r#"{"base": 1, "size": 2}"#).unwrap();
        assert!(RegionCache::load(temp_file.path()).is_empty());
    }

    #[test]
    fn test_failed_write_still_updates_memory() {
        let dir = tempdir().unwrap();
        let mut cache = RegionCache::empty(dir.path().join("missing").join("cache.json"));

        let result = cache.replace(vec![MemoryRegion::new(0x10_0000, 0x20000)]);
        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(cache.regions().len(), 1);
    }

    #[test]
    fn test_remove_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let mut cache = RegionCache::empty(&path);
        cache.replace(vec![MemoryRegion::new(0x10_0000, 0x20000)]).unwrap();

        cache.remove_file().unwrap();
        assert!(!path.exists());
        assert!(cache.is_empty());
        // second removal is a no-op
        cache.remove_file().unwrap();
    }
}
