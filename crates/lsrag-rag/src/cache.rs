//! Durable query to answer cache

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lsrag_core::{Error, Result};
use tokio::fs;

/// File name of the cache inside the cache directory
pub const CACHE_FILE_NAME: &str = "response_cache.json";

/// Write-through cache of answers keyed by the verbatim query
///
/// The whole map lives in memory and is rewritten to disk after every put.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    entries: BTreeMap<String, String>,
    file_path: PathBuf,
}

impl ResponseCache {
    /// Open the cache file, starting empty if it does not exist
    pub fn open(file_path: impl Into<PathBuf>) -> Self {
        let mut cache = Self {
            entries: BTreeMap::new(),
            file_path: file_path.into(),
        };

        if cache.file_path.exists() {
            match cache.load_sync() {
                Ok(()) => tracing::info!("Loaded {} cached responses", cache.entries.len()),
                Err(e) => tracing::warn!("Failed to load response cache: {}", e),
            }
        }

        cache
    }

    /// Open `response_cache.json` inside `cache_dir`
    pub fn in_dir(cache_dir: impl AsRef<Path>) -> Self {
        Self::open(cache_dir.as_ref().join(CACHE_FILE_NAME))
    }

    fn load_sync(&mut self) -> Result<()> {
        let content = std::fs::read_to_string(&self.file_path)?;
        self.entries = serde_json::from_str(&content)?;
        Ok(())
    }

    pub fn get(&self, query: &str) -> Option<&str> {
        self.entries.get(query).map(String::as_str)
    }

    /// Insert or overwrite an answer and rewrite the cache file
    ///
    /// On a write failure the in-memory entry is kept and
    /// `Error::CachePersist` is returned.
    pub async fn put(&mut self, query: impl Into<String>, answer: impl Into<String>) -> Result<()> {
        self.entries.insert(query.into(), answer.into());
        self.save()
            .await
            .map_err(|e| Error::CachePersist(format!("{}: {}", self.file_path.display(), e)))
    }

    async fn save(&self) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Rename over the target so a torn write never replaces the last good file
        let json = serde_json::to_string_pretty(&self.entries)?;
        let staging = self.staging_path();
        if let Err(e) = fs::write(&staging, json).await {
            let _ = fs::remove_file(&staging).await;
            return Err(e.into());
        }
        fs::rename(&staging, &self.file_path).await?;

        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .file_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| CACHE_FILE_NAME.into());
        name.push(".tmp");
        self.file_path.with_file_name(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_round_trip_across_instances() {
        let dir = TempDir::new().unwrap();
        let mut cache = ResponseCache::in_dir(dir.path());
        assert!(cache.is_empty());

        cache
            .put("When is the demo on AI agents?", "Thursday at 14:30")
            .await
            .unwrap();
        assert_eq!(cache.get("When is the demo on AI agents?"), Some("Thursday at 14:30"));

        let reloaded = ResponseCache::in_dir(dir.path());
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get("When is the demo on AI agents?"), Some("Thursday at 14:30"));
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let mut cache = ResponseCache::in_dir(dir.path());

        cache.put("q", "a").await.unwrap();
        cache.put("q", "b").await.unwrap();

        assert_eq!(cache.get("q"), Some("b"));
        assert_eq!(cache.len(), 1);
        assert_eq!(ResponseCache::in_dir(dir.path()).get("q"), Some("b"));
    }

    #[tokio::test]
    async fn test_keys_are_case_sensitive() {
        let dir = TempDir::new().unwrap();
        let mut cache = ResponseCache::in_dir(dir.path());

        cache.put("Capital of France", "Paris").await.unwrap();
        assert_eq!(cache.get("capital of France"), None);
    }

    #[tokio::test]
    async fn test_creates_missing_cache_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("demo_cache");
        let mut cache = ResponseCache::in_dir(&nested);

        cache.put("q", "a").await.unwrap();
        assert!(nested.join(CACHE_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_memory_entry() {
        let dir = TempDir::new().unwrap();
        // A regular file where the cache directory should be
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "").unwrap();
        let mut cache = ResponseCache::in_dir(&blocker);

        let err = cache.put("q", "a").await.unwrap_err();
        assert!(matches!(err, Error::CachePersist(_)));
        assert_eq!(cache.get("q"), Some("a"));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let mut cache = ResponseCache::in_dir(dir.path());
        cache.put("q1", "a1").await.unwrap();

        // Block the staging file so the next write cannot complete
        let staging = dir.path().join(format!("{}.tmp", CACHE_FILE_NAME));
        std::fs::create_dir(&staging).unwrap();

        let err = cache.put("q2", "a2").await.unwrap_err();
        assert!(matches!(err, Error::CachePersist(_)));

        let reopened = ResponseCache::in_dir(dir.path());
        assert_eq!(reopened.get("q1"), Some("a1"));
        assert_eq!(reopened.get("q2"), None);
    }

    #[tokio::test]
    async fn test_torn_staging_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut cache = ResponseCache::in_dir(dir.path());
        cache.put("q1", "a1").await.unwrap();
        cache.put("q2", "a2").await.unwrap();

        // A crash mid-write leaves only a truncated staging file behind
        let staging = dir.path().join(format!("{}.tmp", CACHE_FILE_NAME));
        std::fs::write(&staging, "{\n  \"q1\": \"a").unwrap();

        let reopened = ResponseCache::in_dir(dir.path());
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get("q1"), Some("a1"));

        let mut cache = reopened;
        cache.put("q3", "a3").await.unwrap();
        assert!(!staging.exists());
        assert_eq!(ResponseCache::in_dir(dir.path()).get("q3"), Some("a3"));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILE_NAME);
        std::fs::write(&path, "not json").unwrap();

        let cache = ResponseCache::open(&path);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_unusual_strings_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut cache = ResponseCache::in_dir(dir.path());
        let query = "line one\nline \"two\"\t ünïcødé ";

        cache.put(query, "").await.unwrap();
        cache.put("", "empty key").await.unwrap();

        let reloaded = ResponseCache::in_dir(dir.path());
        assert_eq!(reloaded.get(query), Some(""));
        assert_eq!(reloaded.get(""), Some("empty key"));
    }
}
