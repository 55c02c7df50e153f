//! Output directory handling for artifacts.

use async_trait::async_trait;
use std::io;
use std::path::Path;

/// Where artifacts are written
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Remove `dir` and everything below it; a missing directory is fine
    async fn clear(&self, dir: &Path) -> io::Result<()>;

    /// Create `dir` and any missing parents
    async fn ensure_dir(&self, dir: &Path) -> io::Result<()>;

    /// Write `contents` to `path`, replacing any existing file
    async fn write(&self, path: &Path, contents: Vec<u8>) -> io::Result<()>;
}

/// Local filesystem store backed by `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsAssetStore;

#[async_trait]
impl AssetStore for FsAssetStore {
    async fn clear(&self, dir: &Path) -> io::Result<()> {
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn ensure_dir(&self, dir: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(dir).await
    }

    async fn write(&self, path: &Path, contents: Vec<u8>) -> io::Result<()> {
        tokio::fs::write(path, contents).await
    }
}
