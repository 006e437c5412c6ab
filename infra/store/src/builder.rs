use crate::error::{StoreError, StoreErrorExt};
use crate::file::{FileStore, FileStoreInner};
use private::Sealed;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Duration;
use tokio::fs;
use tracing::info;

/// Default record lifetime: 24 minutes.
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(24 * 60);

#[derive(Debug, Clone)]
struct FileStoreConfig {
    create: bool,
    lifetime: Duration,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self { create: true, lifetime: DEFAULT_LIFETIME }
    }
}

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}

/// A builder for a [`FileStore`].
#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct FileStoreBuilder<S: Sealed = NoRoot> {
    state: S,
    config: FileStoreConfig,
}

#[allow(private_bounds)]
impl<S: Sealed> FileStoreBuilder<S> {
    #[must_use = "Sets whether the root directory is created if it does not exist"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.config.create = enable;
        self
    }

    /// Records older than `lifetime` read as absent.
    #[must_use = "Sets how long a record stays readable after its last write"]
    pub const fn lifetime(mut self, lifetime: Duration) -> Self {
        self.config.lifetime = lifetime;
        self
    }

    fn transition<N: Sealed>(self, state: N) -> FileStoreBuilder<N> {
        FileStoreBuilder { state, config: self.config }
    }
}

impl FileStoreBuilder<NoRoot> {
    #[must_use = "Creates a new file store builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the directory session records are saved under"]
    pub fn root(self, path: impl Into<PathBuf>) -> FileStoreBuilder<WithRoot> {
        self.transition(WithRoot(path.into()))
    }
}

impl FileStoreBuilder<WithRoot> {
    /// Consumes the configuration and opens the store.
    ///
    /// Boot sequence:
    /// 1. Creates the root directory if `create(true)` was set.
    /// 2. Resolves the root to its canonical physical path.
    /// 3. Verifies the root is a writable directory with a scratch file.
    /// 4. Removes stale temp files left by interrupted writes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfiguration`] if the root does not exist (and
    /// `create` is false), is not a directory, or is not writable.
    /// Returns [`StoreError::Io`] if the root cannot be created.
    pub async fn connect(self) -> Result<FileStore, StoreError> {
        let root = &self.state.0;

        if self.config.create {
            fs::create_dir_all(root)
                .await
                .context(format!("Failed to bootstrap session root: {}", root.display()))?;
            info!(path = %root.display(), "Bootstrapped session root directory");
        }

        let canonical = fs::canonicalize(root).await.map_err(|e| {
            StoreError::InvalidConfiguration {
                message: format!("Session root is not accessible: {}", root.display()).into(),
                context: Some(e.to_string().into()),
            }
        })?;

        ensure_writable(&canonical).await?;

        let store = FileStore {
            inner: Arc::new(FileStoreInner {
                root: canonical,
                lifetime: self.config.lifetime,
                tmp_counter: AtomicU64::new(1),
            }),
        };

        store.purge_tmp().await;

        Ok(store)
    }
}

async fn ensure_writable(root: &std::path::Path) -> Result<(), StoreError> {
    let not_writable = |e: std::io::Error| StoreError::InvalidConfiguration {
        message: format!("Session root is not a writable directory: {}", root.display()).into(),
        context: Some(e.to_string().into()),
    };

    let meta = fs::metadata(root).await.map_err(not_writable)?;
    if !meta.is_dir() {
        return Err(StoreError::InvalidConfiguration {
            message: format!("Session root is not a directory: {}", root.display()).into(),
            context: None,
        });
    }

    let scratch = root.join(format!(".keepsake-scratch.{}", std::process::id()));
    fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&scratch)
        .await
        .map_err(not_writable)?;
    fs::remove_file(&scratch).await.map_err(not_writable)?;

    Ok(())
}
