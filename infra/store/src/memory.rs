use crate::builder::DEFAULT_LIFETIME;
use crate::error::StoreError;
use crate::id::SessionId;
use crate::store::SessionStore;
use moka::sync::Cache;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const DEFAULT_CAPACITY: u64 = 100_000;

#[derive(Clone)]
struct Record {
    blob: Arc<[u8]>,
    written: Instant,
}

/// An in-process [`SessionStore`] backed by a `moka` cache.
///
/// Entries expire `lifetime` after their last write. Contents vanish with the process,
/// which makes this store a fit for tests and single-process hosts.
#[derive(Clone)]
pub struct MemoryStore {
    cache: Cache<SessionId, Record>,
    lifetime: Duration,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.cache.entry_count())
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_LIFETIME)
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new(lifetime: Duration) -> Self {
        Self::with_capacity(lifetime, DEFAULT_CAPACITY)
    }

    /// Bounds the store to `max_entries` sessions; the least recently used are evicted first.
    #[must_use]
    pub fn with_capacity(lifetime: Duration, max_entries: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_entries).time_to_live(lifetime).build();
        Self { cache, lifetime }
    }

    /// Number of live sessions, after flushing pending expirations.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemoryStore {
    async fn read(&self, id: &SessionId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.cache.get(id).map(|record| record.blob.to_vec()))
    }

    async fn write(&self, id: &SessionId, blob: &[u8]) -> Result<(), StoreError> {
        self.cache.insert(id.clone(), Record { blob: Arc::from(blob), written: Instant::now() });
        debug!(session = %id, bytes = blob.len(), "Session record cached");
        Ok(())
    }

    async fn destroy(&self, id: &SessionId) -> Result<(), StoreError> {
        self.cache.invalidate(id);
        Ok(())
    }

    async fn gc(&self, max_lifetime: Duration) -> Result<usize, StoreError> {
        let expired: Vec<Arc<SessionId>> = self
            .cache
            .iter()
            .filter(|(_, record)| record.written.elapsed() > max_lifetime)
            .map(|(id, _)| id)
            .collect();

        for id in &expired {
            self.cache.invalidate(id.as_ref());
        }
        self.cache.run_pending_tasks();

        if !expired.is_empty() {
            info!(removed = expired.len(), "Expired session records collected");
        }
        Ok(expired.len())
    }
}
