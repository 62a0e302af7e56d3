use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const CACHE_FILE_PREFIX: &str = "cache-";
pub const CACHE_FILE_EXT: &str = "jpg";

/// Single-file frame cache handed to image decoders.
///
/// Each accepted frame overwrites `<dir>/cache-<session>.jpg`; the
/// returned path is the decode-ready handle for the renderer.
#[derive(Debug, Clone)]
pub struct FrameCache {
    path: PathBuf,
}

impl FrameCache {
    pub fn new(dir: impl AsRef<Path>, session_id: u64) -> Self {
        let path = dir
            .as_ref()
            .join(format!("{CACHE_FILE_PREFIX}{session_id}.{CACHE_FILE_EXT}"));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the cached frame with `payload`.
    pub fn write_frame(&self, payload: &[u8]) -> Result<&Path> {
        fs::write(&self.path, payload)?;
        Ok(&self.path)
    }

    /// Delete the cache file. A file that is already gone is not an error.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "frame cache removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_file_after_session() {
        let cache = FrameCache::new("/tmp", 77);
        assert_eq!(cache.path(), Path::new("/tmp/cache-77.jpg"));
    }

    #[test]
    fn write_overwrites_and_remove_is_idempotent() {
        let dir = std::env::temp_dir();
        let cache = FrameCache::new(&dir, u64::from(std::process::id()) + 1_000_000);

        cache.write_frame(b"first").unwrap();
        let path = cache.write_frame(b"second").unwrap().to_path_buf();
        assert_eq!(fs::read(&path).unwrap(), b"second");

        cache.remove().unwrap();
        assert!(!path.exists());
        cache.remove().unwrap();
    }
}
