//! Directory-backed cache: key `k` lives in `<dir>/k.json`.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::instrument;

use super::{PersistentCache, validate_key};
use crate::error::CacheError;

/// Durable cache storing one file per key.
///
/// Writes go to a uniquely named temporary sibling file that is then renamed
/// over the target, so a reader sees either the old blob or the new one,
/// never a partial write. Concurrent writers never share a temporary file,
/// and a failed write removes its own.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Use `dir` as the cache directory. It is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, CacheError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl PersistentCache for FileCache {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, value), fields(dir = %self.dir.display(), bytes = value.len()))]
    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let path = self.path_for(key)?;
        let dir = self.dir.clone();
        let value = value.to_owned();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &path, value.as_bytes()))
            .await
            .map_err(|e| CacheError::Io(std::io::Error::other(e)))?
    }
}

/// Write `bytes` to a fresh temp file in `dir`, then rename it to `path`.
///
/// On any failure the temp file is dropped, which deletes it.
fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
