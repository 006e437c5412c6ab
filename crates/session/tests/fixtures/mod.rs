use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use keepsake_session::{CipherMode, Payload, SessionHandler, SessionId};
use keepsake_store::{MemoryStore, SessionStore, StoreError};
use serde_json::Value;
use std::time::Duration;

pub const SECRET: &str = "s3cret";

/// # Panics
/// * If `raw` is not a valid session id.
#[must_use]
pub fn sid(raw: &str) -> SessionId {
    SessionId::new(raw).expect("fixture id must be valid")
}

/// An encrypting handler over a fresh in-memory store.
/// # Panics
/// * If the handler cannot be built.
#[must_use]
pub fn setup_handler(mode: CipherMode) -> SessionHandler<MemoryStore> {
    SessionHandler::builder()
        .store(MemoryStore::default())
        .encryption_key(SECRET)
        .mode(mode)
        .build()
        .expect("Handler setup failed")
}

/// # Panics
/// * If `value` is not a JSON object.
#[must_use]
pub fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture payload must be an object, got {other}"),
    }
}

/// Flips one bit of the decoded byte at `index` of a base64 blob.
/// # Panics
/// * If `blob` is not base64.
#[must_use]
pub fn flip_decoded_byte(blob: &[u8], index: usize) -> Vec<u8> {
    let mut raw = STANDARD.decode(blob).expect("stored blob must be base64");
    raw[index] ^= 0x01;
    STANDARD.encode(raw).into_bytes()
}

/// A store whose every operation fails with an I/O error.
#[derive(Debug, Default)]
pub struct FailingStore;

fn unavailable() -> StoreError {
    StoreError::Io {
        source: std::io::Error::other("backend unavailable"),
        context: Some("failing fixture".into()),
    }
}

impl SessionStore for FailingStore {
    async fn read(&self, _id: &SessionId) -> Result<Option<Vec<u8>>, StoreError> {
        Err(unavailable())
    }

    async fn write(&self, _id: &SessionId, _blob: &[u8]) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn destroy(&self, _id: &SessionId) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn gc(&self, _max_lifetime: Duration) -> Result<usize, StoreError> {
        Err(unavailable())
    }
}
