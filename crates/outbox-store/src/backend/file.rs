//! File-per-key backend
//!
//! Each key is stored as `<dir>/<escaped key>.json`. Writes go to a
//! temporary sibling first and are renamed into place, so a crash mid-write
//! leaves the previous document intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use outbox_core::{BackendError, KeyValueBackend};

/// Directory-backed implementation of [`KeyValueBackend`]
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open (creating if needed) a backend rooted at `dir`
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, BackendError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        info!(path = %dir.display(), "File backend opened");
        Ok(Self { dir })
    }

    /// Root directory of this backend
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(key)))
    }
}

/// Map a key to a portable file name; other bytes become `%XX`
fn sanitize(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-') {
            name.push(char::from(byte));
        } else {
            name.push_str(&format!("%{byte:02X}"));
        }
    }
    name
}

#[async_trait]
impl KeyValueBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), BackendError> {
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.tmp", sanitize(key)));

        tokio::fs::write(&tmp, value.as_bytes()).await.map_err(|e| {
            if e.kind() == ErrorKind::StorageFull {
                BackendError::QuotaExceeded
            } else {
                e.into()
            }
        })?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), bytes = value.len(), "Wrote key");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), BackendError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::open(dir.path()).await.unwrap();

        assert_eq!(backend.get("AIOffline_1_example.com").await.unwrap(), None);
        backend
            .set("AIOffline_1_example.com", "{}".to_string())
            .await
            .unwrap();
        assert_eq!(
            backend.get("AIOffline_1_example.com").await.unwrap(),
            Some("{}".to_string())
        );
        assert!(backend.path_for("AIOffline_1_example.com").exists());

        backend.remove("AIOffline_1_example.com").await.unwrap();
        assert_eq!(backend.get("AIOffline_1_example.com").await.unwrap(), None);
        backend.remove("AIOffline_1_example.com").await.unwrap();
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let backend = FileBackend::open(dir.path()).await.unwrap();
            backend.set("k", "persisted".to_string()).await.unwrap();
        }
        let backend = FileBackend::open(dir.path()).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some("persisted".to_string()));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("AIOffline_1_example.com"), "AIOffline_1_example.com");
        assert_eq!(sanitize("AIOffline_1_dc.services.com:443"), "AIOffline_1_dc.services.com%3A443");
        assert_eq!(sanitize("../etc"), "..%2Fetc");
        assert_eq!(sanitize("50%"), "50%25");
        assert_eq!(sanitize("h\u{e9}"), "h%C3%A9");
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_share_a_file() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::open(dir.path()).await.unwrap();
        let keys = [
            "AIOffline_1_host:8080",
            "AIOffline_1_host/8080",
            "AIOffline_1_host%3A8080",
        ];

        for key in keys {
            backend.set(key, key.to_string()).await.unwrap();
        }
        for key in keys {
            assert_eq!(backend.get(key).await.unwrap().as_deref(), Some(key));
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), keys.len());
    }
}
