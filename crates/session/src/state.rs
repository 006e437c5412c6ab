use crate::accessor::Accessor;
use crate::error::SessionError;
use parking_lot::{Mutex, MutexGuard};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// The decrypted working set of one session: string keys to JSON values.
pub type Payload = Map<String, Value>;

/// A shared handle to one session's payload.
///
/// Cloning the handle never copies the payload; every clone, and every [`Accessor`] created
/// from it, addresses the same tree. The lock only guards memory safety: two accessors
/// mutating the same keys are not coordinated beyond "last write wins".
#[derive(Clone, Default)]
pub struct SessionState {
    inner: Arc<Mutex<Payload>>,
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState").field("keys", &self.inner.lock().len()).finish()
    }
}

impl SessionState {
    /// An empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already decoded payload.
    #[must_use]
    pub fn from_payload(payload: Payload) -> Self {
        Self { inner: Arc::new(Mutex::new(payload)) }
    }

    /// Parses a serialized payload. Empty input yields an empty payload.
    ///
    /// # Errors
    /// Returns [`SessionError::Serialization`] if `bytes` is not a JSON object.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SessionError> {
        if bytes.trim_ascii().is_empty() {
            return Ok(Self::new());
        }
        Ok(Self::from_payload(serde_json::from_slice(bytes)?))
    }

    /// Serializes the whole payload as compact JSON.
    ///
    /// # Errors
    /// Returns [`SessionError::Serialization`] if a value cannot be encoded.
    pub fn to_vec(&self) -> Result<Vec<u8>, SessionError> {
        Ok(serde_json::to_vec(&*self.lock())?)
    }

    /// A deep copy of the current payload.
    #[must_use]
    pub fn snapshot(&self) -> Payload {
        self.lock().clone()
    }

    /// Swaps in `payload` and returns the previous contents.
    pub fn replace(&self, payload: Payload) -> Payload {
        std::mem::replace(&mut *self.lock(), payload)
    }

    /// `true` if the payload holds no top-level entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of top-level entries (namespaces in the usual layout).
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if both handles point at the same payload.
    #[must_use]
    pub fn same_state(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// An accessor bound to the default namespace.
    #[must_use]
    pub fn accessor(&self) -> Accessor {
        Accessor::new(self)
    }

    /// An accessor bound to namespace `name`, created empty if absent.
    #[must_use]
    pub fn namespace(&self, name: impl Into<String>) -> Accessor {
        Accessor::with_namespace(self, name)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Payload> {
        self.inner.lock()
    }
}

impl From<Payload> for SessionState {
    fn from(payload: Payload) -> Self {
        Self::from_payload(payload)
    }
}
