//! Filesystem backend: one sharded file per session, replaced atomically on every write.

use crate::builder::FileStoreBuilder;
use crate::error::{StoreError, StoreErrorExt};
use crate::id::SessionId;
use crate::store::SessionStore;
use crate::{layout, maintenance};
use std::io::ErrorKind;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// The internal shared state of a [`FileStore`] instance.
#[allow(unreachable_pub)]
#[derive(Debug)]
pub struct FileStoreInner {
    /// The canonicalized directory all records live under.
    pub(crate) root: PathBuf,
    /// How long a record stays readable after its last write.
    pub(crate) lifetime: Duration,
    /// A unique counter used to generate temporary file names.
    pub(crate) tmp_counter: AtomicU64,
}

/// A thread-safe, file-backed [`SessionStore`].
///
/// Records are laid out as `<root>/<id[0..2]>/<id[2..4]>/<id>.sess` and written with an
/// atomic swap (unique temp file, `fsync`, `rename`), so a crash mid-write leaves the previous
/// record intact. Expiry follows the file modification time.
///
/// The handle is reference-counted and cheap to clone.
///
/// # Example
///
/// ```rust
/// use keepsake_store::{FileStore, SessionId, SessionStore, StoreError};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), StoreError> {
///     # let tmp = tempfile::tempdir().unwrap();
///     # let root = tmp.path().join("sessions");
///     let store = FileStore::builder().root(&root).create(true).connect().await?;
///
///     let id = SessionId::new("abc123")?;
///     store.write(&id, b"opaque blob").await?;
///     assert_eq!(store.read(&id).await?.as_deref(), Some(&b"opaque blob"[..]));
///
///     store.destroy(&id).await?;
///     assert!(store.read(&id).await?.is_none());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    pub(crate) inner: Arc<FileStoreInner>,
}

impl Deref for FileStore {
    type Target = FileStoreInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FileStore {
    #[must_use = "The store is not opened until you call .connect()"]
    pub fn builder() -> FileStoreBuilder {
        FileStoreBuilder::new()
    }

    /// The canonical root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// The configured record lifetime.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        self.inner.lifetime
    }

    /// Physical path of the record for `id`. The file may not exist.
    #[must_use]
    pub fn resolve(&self, id: &SessionId) -> PathBuf {
        layout::record_path(&self.root, id)
    }

    /// Removes temp files abandoned by interrupted writes.
    pub async fn purge_tmp(&self) {
        maintenance::purge_tmp(&self.root).await;
    }

    async fn read_record(&self, id: &SessionId) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.resolve(id);

        let meta = match fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(StoreError::Io {
                    source: err,
                    context: Some(format!("Stat failed: {}", path.display()).into()),
                });
            },
        };

        if let Ok(modified) = meta.modified()
            && maintenance::is_expired(modified, SystemTime::now(), self.lifetime)
        {
            debug!(session = %id, "Session record expired");
            return Ok(None);
        }

        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::Io {
                source: err,
                context: Some(format!("Read failed: {}", path.display()).into()),
            }),
        }
    }

    async fn write_record(&self, id: &SessionId, blob: &[u8]) -> Result<(), StoreError> {
        let resolved = self.resolve(id);

        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)
                .await
                .context(format!("Failed to create shards for {}", resolved.display()))?;
        }

        let temp = unique_tmp_path(&resolved, &self.tmp_counter);

        {
            let mut file = fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&temp)
                .await
                .context(format!("Temp creation failed: {}", temp.display()))?;
            file.write_all(blob).await.context("Write failed")?;
            file.sync_all().await.context("Hardware sync failed")?;
        }

        if let Err(err) = fs::rename(&temp, &resolved).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&resolved)
                    .await
                    .context(format!("Failed to replace existing record: {}", resolved.display()))?;
                fs::rename(&temp, &resolved).await.context(format!(
                    "Atomic swap failed: {} -> {}",
                    temp.display(),
                    resolved.display()
                ))?;
            } else {
                let _ = fs::remove_file(&temp).await;
                return Err(StoreError::Io {
                    source: err,
                    context: Some(
                        format!("Atomic swap failed: {} -> {}", temp.display(), resolved.display())
                            .into(),
                    ),
                });
            }
        }

        if let Some(parent) = resolved.parent() {
            Self::sync_dir(parent).await;
        }

        debug!(session = %id, bytes = blob.len(), "Session record saved atomically");
        Ok(())
    }

    async fn destroy_record(&self, id: &SessionId) -> Result<(), StoreError> {
        let resolved = self.resolve(id);
        match fs::remove_file(&resolved).await {
            Ok(()) => debug!(session = %id, "Session record destroyed"),
            Err(err) if err.kind() == ErrorKind::NotFound => {},
            Err(err) => {
                return Err(StoreError::Io {
                    source: err,
                    context: Some(format!("Failed to delete: {}", resolved.display()).into()),
                });
            },
        }
        Ok(())
    }

    async fn sync_dir(path: &Path) {
        match fs::File::open(path).await {
            Ok(dir) => {
                if let Err(err) = dir.sync_all().await {
                    tracing::warn!(path = %path.display(), error = %err, "Directory sync failed");
                }
            },
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Directory open failed");
            },
        }
    }
}

impl SessionStore for FileStore {
    async fn read(&self, id: &SessionId) -> Result<Option<Vec<u8>>, StoreError> {
        self.read_record(id).await
    }

    async fn write(&self, id: &SessionId, blob: &[u8]) -> Result<(), StoreError> {
        self.write_record(id, blob).await
    }

    async fn destroy(&self, id: &SessionId) -> Result<(), StoreError> {
        self.destroy_record(id).await
    }

    async fn gc(&self, max_lifetime: Duration) -> Result<usize, StoreError> {
        let root = self.root.clone();
        let now = SystemTime::now();

        let removed =
            tokio::task::spawn_blocking(move || maintenance::sweep_expired(&root, now, max_lifetime))
                .await
                .map_err(|e| StoreError::Io {
                    source: std::io::Error::other(e.to_string()),
                    context: Some("Session gc task failed".into()),
                })?;

        if removed > 0 {
            info!(removed, "Expired session records collected");
        }
        Ok(removed)
    }
}

fn unique_tmp_path(target: &Path, counter: &AtomicU64) -> PathBuf {
    let counter = counter.fetch_add(1, Ordering::Relaxed);
    let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("session");
    let tmp_name = format!("{file_name}{}{counter}", layout::TMP_MARKER);
    target.with_file_name(tmp_name)
}
