//! Video info caching

use crate::error::Result;
use crate::types::CacheEntry;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::fs;

/// Generate cache key from a URL
pub fn get_cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.trim().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// File-backed cache of JSON entries with a TTL
pub struct InfoCache {
    dir: PathBuf,
    ttl: u64,
}

impl InfoCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: u64) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Get cached data if valid
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Option<T> {
        let path = self.path(&get_cache_key(url));

        let content = fs::read_to_string(&path).await.ok()?;
        let Ok(entry) = serde_json::from_str::<CacheEntry<T>>(&content) else {
            tracing::debug!(path = %path.display(), "discarding unreadable cache entry");
            let _ = fs::remove_file(&path).await;
            return None;
        };

        // Check if expired
        let now = Utc::now().timestamp();
        if now - entry.timestamp > entry.ttl as i64 {
            let _ = fs::remove_file(&path).await;
            return None;
        }

        tracing::debug!(url, "cache hit");
        Some(entry.data)
    }

    /// Set cache data
    pub async fn set<T: Serialize>(&self, url: &str, data: &T) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let entry = CacheEntry {
            data,
            timestamp: Utc::now().timestamp(),
            ttl: self.ttl,
        };

        let content = serde_json::to_string(&entry)?;
        fs::write(self.path(&get_cache_key(url)), content).await?;
        Ok(())
    }

    /// Clear all cache
    pub async fn clear(&self) -> Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VideoInfo;

    fn sample() -> VideoInfo {
        VideoInfo {
            title: Some("clip".into()),
            thumbnail: None,
            resolutions: vec!["Best".into(), "720p".into()],
        }
    }

    #[test]
    fn test_cache_key_is_stable_hex() {
        let key = get_cache_key("https://youtu.be/abc");
        assert_eq!(key.len(), 64);
        assert_eq!(key, get_cache_key("  https://youtu.be/abc "));
        assert_ne!(key, get_cache_key("https://youtu.be/abd"));
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = InfoCache::new(tmp.path().join("info"), 3600);

        assert!(cache.get::<VideoInfo>("https://youtu.be/abc").await.is_none());
        cache.set("https://youtu.be/abc", &sample()).await.unwrap();
        assert_eq!(cache.get::<VideoInfo>("https://youtu.be/abc").await, Some(sample()));
    }

    #[tokio::test]
    async fn test_expired_entries_are_removed() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = InfoCache::new(tmp.path(), 3600);

        let stale = CacheEntry {
            data: sample(),
            timestamp: Utc::now().timestamp() - 7200,
            ttl: 3600,
        };
        let path = cache.path(&get_cache_key("https://youtu.be/old"));
        std::fs::write(&path, serde_json::to_string(&stale).unwrap()).unwrap();

        assert!(cache.get::<VideoInfo>("https://youtu.be/old").await.is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = InfoCache::new(tmp.path(), 3600);
        let path = cache.path(&get_cache_key("https://youtu.be/bad"));
        std::fs::write(&path, "{not json").unwrap();

        assert!(cache.get::<VideoInfo>("https://youtu.be/bad").await.is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("info");
        let cache = InfoCache::new(&dir, 3600);

        cache.set("https://youtu.be/abc", &sample()).await.unwrap();
        cache.clear().await.unwrap();
        assert!(!dir.exists());

        // Clearing twice is fine
        cache.clear().await.unwrap();
    }
}
