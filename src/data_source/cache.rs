//! Caching component
//!
//! Committed transactions and resources read at a fixed ledger version never
//! change, so raw response bodies can be kept on disk and replayed.

use crate::Result;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;

/// Data Source Cache
#[derive(Debug, Clone)]
pub struct DataSourceCache {
    cache_dir: PathBuf,
    ttl: Duration,
}

impl DataSourceCache {
    /// Create a new cache instance
    pub fn new(ttl: Duration, cache_dir: Option<PathBuf>) -> Self {
        let cache_dir = cache_dir.unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("aptos-flow")
        });

        Self { cache_dir, ttl }
    }

    pub fn transaction_key(id: &str) -> String {
        format!("tx_{}", id)
    }

    pub fn resource_key(address: &str, resource_type: &str, version: u64) -> String {
        let type_slug: String = resource_type
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("res_{}_{}_{}", address, type_slug, version)
    }

    /// Get cache file path
    fn get_cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Check if cache is valid
    async fn is_cache_valid(&self, path: &Path) -> bool {
        match fs::metadata(path).await {
            Ok(metadata) => match metadata.modified() {
                Ok(modified) => SystemTime::now()
                    .duration_since(modified)
                    .map(|elapsed| elapsed < self.ttl)
                    .unwrap_or(false),
                Err(_) => false,
            },
            Err(_) => false,
        }
    }

    /// Ensure cache directory exists
    async fn ensure_cache_dir(&self) -> Result<()> {
        if !self.cache_dir.exists() {
            fs::create_dir_all(&self.cache_dir)
                .await
                .map_err(crate::Error::Io)?;
        }
        Ok(())
    }

    /// Get raw text content from cache
    pub async fn get_text(&self, key: &str) -> Option<String> {
        let path = self.get_cache_path(key);
        if self.is_cache_valid(&path).await {
            match fs::read_to_string(&path).await {
                Ok(content) => {
                    tracing::debug!("Cache hit for key {}", key);
                    return Some(content);
                }
                Err(e) => tracing::warn!("Failed to read cached text: {}", e),
            }
        }
        None
    }

    /// Save raw text content to cache
    pub async fn save_text(&self, key: &str, content: &str) {
        if let Err(e) = self.ensure_cache_dir().await {
            tracing::warn!("Failed to create cache directory: {}", e);
            return;
        }

        let path = self.get_cache_path(key);
        if let Err(e) = fs::write(&path, content).await {
            tracing::warn!("Failed to write text to cache: {}", e);
        }
    }
}
