use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};

use super::variant::FeedVariant;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to write cache file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove cache file '{path}': {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rendered feeds on disk, one file per [`FeedVariant`].
///
/// An entry is served for as long as its file exists, unless a TTL is
/// configured, in which case entries older than the TTL count as missing.
/// Writes go through a temp file and a rename so readers never observe a
/// partial file. Each variant has an in-process lock that a publisher holds
/// across check-render-write, so concurrent misses rebuild once.
#[derive(Debug)]
pub struct FeedCache {
    dir: PathBuf,
    ttl: Option<Duration>,
    locks: [Mutex<()>; 3],
}

impl FeedCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Option<Duration>) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            locks: [Mutex::new(()), Mutex::new(()), Mutex::new(())],
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, variant: FeedVariant) -> PathBuf {
        self.dir.join(variant.cache_file())
    }

    /// Serializes publishers of the same variant within this process.
    pub async fn lock(&self, variant: FeedVariant) -> MutexGuard<'_, ()> {
        self.locks[variant.index()].lock().await
    }

    /// Cached bytes, or `None` on a miss (absent, expired, or unreadable).
    pub async fn get(&self, variant: FeedVariant) -> Option<Vec<u8>> {
        let path = self.path(variant);

        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot stat cache file, treating as miss");
                return None;
            }
        };

        if let Some(ttl) = self.ttl {
            let age = meta
                .modified()
                .ok()
                .and_then(|mtime| SystemTime::now().duration_since(mtime).ok())
                .unwrap_or_default();
            if age > ttl {
                tracing::debug!(variant = %variant, age_secs = age.as_secs(), "Cache entry expired");
                return None;
            }
        }

        match tokio::fs::read(&path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot read cache file, treating as miss");
                None
            }
        }
    }

    /// Replaces the cached bytes for `variant` atomically.
    pub async fn put(&self, variant: FeedVariant, bytes: &[u8]) -> Result<(), CacheError> {
        let path = self.path(variant);
        let write_err = |source| CacheError::Write {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(write_err)?;

        // SEC-009: Randomized temp filename to prevent TOCTOU race conditions
        let random_suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let temp_path = path.with_extension(format!("tmp.{:016x}", random_suffix));

        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&temp_path)
                .await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&temp_path, &path).await
        }
        .await;

        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(write_err(e));
        }

        tracing::debug!(variant = %variant, bytes = bytes.len(), "Cache entry written");
        Ok(())
    }

    /// Deletes the entry for `variant`. Returns whether a file was removed.
    pub async fn clear(&self, variant: FeedVariant) -> Result<bool, CacheError> {
        let path = self.path(variant);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CacheError::Remove { path, source }),
        }
    }

    pub async fn clear_all(&self) -> Result<usize, CacheError> {
        let mut removed = 0;
        for variant in FeedVariant::ALL {
            if self.clear(variant).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_miss_then_hit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::new(dir.path(), None);

        assert!(cache.get(FeedVariant::Rss20).await.is_none());
        cache.put(FeedVariant::Rss20, b"<rss/>").await.unwrap();
        assert_eq!(cache.get(FeedVariant::Rss20).await.as_deref(), Some(&b"<rss/>"[..]));
        assert!(cache.get(FeedVariant::Rss10).await.is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::new(dir.path(), None);

        cache.put(FeedVariant::Html, b"old").await.unwrap();
        cache.put(FeedVariant::Html, b"new").await.unwrap();
        assert_eq!(cache.get(FeedVariant::Html).await.as_deref(), Some(&b"new"[..]));

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_put_creates_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::new(dir.path().join("nested/feeds"), None);
        cache.put(FeedVariant::Rss10, b"x").await.unwrap();
        assert!(cache.path(FeedVariant::Rss10).exists());
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::new(dir.path(), Some(Duration::from_secs(60)));
        cache.put(FeedVariant::Rss20, b"fresh").await.unwrap();
        assert!(cache.get(FeedVariant::Rss20).await.is_some());

        let file = std::fs::File::options()
            .write(true)
            .open(cache.path(FeedVariant::Rss20))
            .unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(120))
            .unwrap();
        assert!(cache.get(FeedVariant::Rss20).await.is_none());
    }

    #[tokio::test]
    async fn test_no_ttl_never_expires() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::new(dir.path(), None);
        cache.put(FeedVariant::Html, b"old").await.unwrap();

        let file = std::fs::File::options()
            .write(true)
            .open(cache.path(FeedVariant::Html))
            .unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH).unwrap();
        assert!(cache.get(FeedVariant::Html).await.is_some());
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FeedCache::new(dir.path(), None);
        cache.put(FeedVariant::Rss10, b"a").await.unwrap();
        cache.put(FeedVariant::Html, b"b").await.unwrap();

        assert!(cache.clear(FeedVariant::Rss10).await.unwrap());
        assert!(!cache.clear(FeedVariant::Rss10).await.unwrap());
        assert_eq!(cache.clear_all().await.unwrap(), 1);
        assert!(cache.get(FeedVariant::Html).await.is_none());
    }

    #[tokio::test]
    async fn test_write_failure_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let cache = FeedCache::new(&blocker, None);
        let err = cache.put(FeedVariant::Rss20, b"x").await.unwrap_err();
        assert!(matches!(err, CacheError::Write { .. }));
    }
}
