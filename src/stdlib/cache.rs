use super::StdlibDeclarations;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Binary cache for stdlib declarations
#[derive(Serialize, Deserialize, Debug)]
pub struct SignatureCache {
    /// HiFriend version that wrote the cache
    pub version: String,
    pub declarations: StdlibDeclarations,
    /// Cache creation timestamp
    pub timestamp: SystemTime,
}

impl SignatureCache {
    pub fn new(declarations: StdlibDeclarations) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            declarations,
            timestamp: SystemTime::now(),
        }
    }

    /// Get cache file path
    pub fn cache_path() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .context("Failed to get cache directory")?
            .join("hifriend");

        Ok(cache_dir.join("stdlib_cache.bin"))
    }

    /// Load cache from disk
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::cache_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read cache from {}", path.display()))?;

        bincode::deserialize(&bytes).context("Failed to deserialize cache")
    }

    /// Save cache to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::cache_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create cache directory")?;
        }
        let bytes = bincode::serialize(self).context("Failed to serialize cache")?;

        fs::write(path, bytes)
            .with_context(|| format!("Failed to write cache to {}", path.display()))?;

        Ok(())
    }

    /// Check if cache is valid
    pub fn is_valid(&self, current_version: &str) -> bool {
        self.version == current_version
    }

    /// Remove the cache file; a missing file is not an error
    pub fn clear() -> Result<bool> {
        Self::clear_at(&Self::cache_path()?)
    }

    pub fn clear_at(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove cache at {}", path.display()))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("stdlib_cache.bin");

        let cache = SignatureCache::new(StdlibDeclarations::core());
        cache.save_to(&path).unwrap();

        let loaded = SignatureCache::load_from(&path).unwrap();
        assert!(loaded.is_valid(env!("CARGO_PKG_VERSION")));
        assert!(!loaded.is_valid("0.0.0-old"));
        assert_eq!(loaded.declarations, cache.declarations);
    }

    #[test]
    fn test_clear_at() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stdlib_cache.bin");

        assert!(!SignatureCache::clear_at(&path).unwrap());
        SignatureCache::new(StdlibDeclarations::default())
            .save_to(&path)
            .unwrap();
        assert!(SignatureCache::clear_at(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SignatureCache::load_from(&dir.path().join("absent.bin")).is_err());
    }
}
