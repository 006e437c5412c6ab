use crate::error::StoreError;
use crate::id::SessionId;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Byte-oriented persistence for session blobs.
///
/// A store never looks inside a blob: what goes into [`SessionStore::write`] comes back
/// out of [`SessionStore::read`] byte for byte. Writers of the same id are not
/// coordinated; the last write wins.
pub trait SessionStore: Send + Sync {
    /// Returns the bytes last written under `id`, or `None` if absent or expired.
    fn read(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, StoreError>> + Send;

    /// Persists `blob` under `id`, replacing any prior value.
    fn write(&self, id: &SessionId, blob: &[u8])
    -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes the record for `id`. Absent ids are not an error.
    fn destroy(&self, id: &SessionId) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes every record last written more than `max_lifetime` ago.
    ///
    /// Returns the number of removed records.
    fn gc(&self, max_lifetime: Duration) -> impl Future<Output = Result<usize, StoreError>> + Send;
}

impl<S: SessionStore> SessionStore for Arc<S> {
    async fn read(&self, id: &SessionId) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).read(id).await
    }

    async fn write(&self, id: &SessionId, blob: &[u8]) -> Result<(), StoreError> {
        (**self).write(id, blob).await
    }

    async fn destroy(&self, id: &SessionId) -> Result<(), StoreError> {
        (**self).destroy(id).await
    }

    async fn gc(&self, max_lifetime: Duration) -> Result<usize, StoreError> {
        (**self).gc(max_lifetime).await
    }
}
