//! Encrypted session handler: decrypt on read, encrypt on write.

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::state::SessionState;
use keepsake_codec::{CipherMode, Codec};
use keepsake_store::{DEFAULT_LIFETIME, SessionId, SessionStore};
use private::Sealed;
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// How [`SessionHandler::load`] obtained its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadOutcome {
    /// Nothing stored under the id: a cold start.
    Fresh,
    /// Stored data decrypted and decoded.
    Restored,
    /// Stored data could not be decrypted or decoded and was dropped.
    Discarded,
}

/// A payload together with how it was obtained.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub state: SessionState,
    pub outcome: LoadOutcome,
}

impl Loaded {
    fn empty(outcome: LoadOutcome) -> Self {
        Self { state: SessionState::new(), outcome }
    }
}

/// Hex SHA-256 of a client value (e.g., a `User-Agent`), suitable as a key fingerprint.
#[must_use]
pub fn fingerprint(client: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(client.as_ref()))
}

#[allow(unreachable_pub)]
#[derive(Debug)]
pub struct HandlerInner<S> {
    store: S,
    codec: Option<Codec>,
    lifetime: Duration,
    decrypt_failures: AtomicU64,
}

/// Composes a [`Codec`] with a [`SessionStore`].
///
/// * Reading an absent id yields an empty payload.
/// * Reading data that fails to decrypt or decode yields an empty payload too. The failure is
///   logged at `warn` level (never with key material) and counted in
///   [`SessionHandler::decrypt_failures`].
/// * Store failures are returned as [`SessionError::Backend`] and never retried.
///
/// Without an encryption key the serialized payload is stored as-is.
///
/// The handle is reference-counted and cheap to clone.
///
/// ### Example
/// ```rust
/// use keepsake_session::{SessionHandler, SessionState};
/// use keepsake_store::{MemoryStore, SessionId};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let handler = SessionHandler::builder()
///     .store(MemoryStore::default())
///     .encryption_key("s3cret")
///     .build()?;
///
/// let id = SessionId::new("abc")?;
/// let state = handler.read(&id).await?;
/// state.accessor().set("user.id", json!(42));
/// handler.write(&id, &state).await?;
///
/// let again = handler.read(&id).await?;
/// assert_eq!(again.accessor().get("user.id"), Some(json!(42)));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SessionHandler<S> {
    inner: Arc<HandlerInner<S>>,
}

impl<S> Clone for SessionHandler<S> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<S> Deref for SessionHandler<S> {
    type Target = HandlerInner<S>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl SessionHandler<()> {
    #[must_use = "The handler is not usable until you call .build()"]
    pub fn builder() -> SessionHandlerBuilder {
        SessionHandlerBuilder::new()
    }
}

impl<S: SessionStore> SessionHandler<S> {
    /// Builds a handler from a loaded [`SessionConfig`].
    ///
    /// `client` is the value hashed into the key fingerprint when
    /// `bind_user_agent` is enabled.
    ///
    /// # Errors
    /// Returns [`SessionError::Configuration`] if the configuration is invalid.
    pub fn from_config(
        store: S,
        config: &SessionConfig,
        client: Option<&str>,
    ) -> Result<Self, SessionError> {
        config.validate()?;

        let mut builder =
            SessionHandler::builder().store(store).mode(config.cipher).lifetime(config.lifetime());
        if let Some(key) = &config.encryption_key {
            builder = builder.encryption_key(key);
        }
        if config.bind_user_agent {
            builder = builder.fingerprint(fingerprint(client.unwrap_or_default()));
        }
        builder.build()
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns `true` if payloads are encrypted before they reach the store.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.codec.is_some()
    }

    #[must_use]
    pub fn mode(&self) -> Option<CipherMode> {
        self.codec.as_ref().map(Codec::mode)
    }

    /// Number of stored payloads discarded because they could not be decrypted or decoded.
    #[must_use]
    pub fn decrypt_failures(&self) -> u64 {
        self.decrypt_failures.load(Ordering::Relaxed)
    }

    /// Loads the payload for `id`, treating undecryptable data as an empty session.
    ///
    /// # Errors
    /// Returns [`SessionError::Backend`] if the store read fails.
    pub async fn read(&self, id: &SessionId) -> Result<SessionState, SessionError> {
        Ok(self.load(id).await?.state)
    }

    /// Like [`SessionHandler::read`], but reports whether the session was fresh, restored,
    /// or discarded.
    ///
    /// # Errors
    /// Returns [`SessionError::Backend`] if the store read fails.
    pub async fn load(&self, id: &SessionId) -> Result<Loaded, SessionError> {
        let Some(raw) = self.store.read(id).await? else {
            debug!(session = %id, "No stored session data");
            return Ok(Loaded::empty(LoadOutcome::Fresh));
        };

        if raw.trim_ascii().is_empty() {
            return Ok(Loaded::empty(LoadOutcome::Fresh));
        }

        match self.decode(&raw) {
            Ok(state) => Ok(Loaded { state, outcome: LoadOutcome::Restored }),
            Err(err) => {
                self.decrypt_failures.fetch_add(1, Ordering::Relaxed);
                warn!(session = %id, error = %err, "Discarding session data that cannot be decrypted");
                Ok(Loaded::empty(LoadOutcome::Discarded))
            },
        }
    }

    /// Serializes, encrypts (if a key is configured) and stores the payload.
    ///
    /// # Errors
    /// * [`SessionError::Serialization`] If the payload cannot be encoded.
    /// * [`SessionError::Codec`] If encryption fails.
    /// * [`SessionError::Backend`] If the store write fails.
    pub async fn write(&self, id: &SessionId, state: &SessionState) -> Result<(), SessionError> {
        let plain = Zeroizing::new(state.to_vec()?);

        let blob = match &self.codec {
            Some(codec) => codec.encrypt(plain.as_slice())?.into_bytes(),
            None => plain.to_vec(),
        };

        self.store.write(id, &blob).await?;
        debug!(session = %id, bytes = blob.len(), "Session data written");
        Ok(())
    }

    /// Removes the stored record for `id`.
    ///
    /// # Errors
    /// Returns [`SessionError::Backend`] if the store fails.
    pub async fn destroy(&self, id: &SessionId) -> Result<(), SessionError> {
        self.store.destroy(id).await?;
        Ok(())
    }

    /// Removes records older than the configured lifetime.
    ///
    /// # Errors
    /// Returns [`SessionError::Backend`] if the store fails.
    pub async fn gc(&self) -> Result<usize, SessionError> {
        Ok(self.store.gc(self.lifetime).await?)
    }

    fn decode(&self, raw: &[u8]) -> Result<SessionState, SessionError> {
        match &self.codec {
            Some(codec) => {
                let plain = Zeroizing::new(codec.decrypt(raw)?);
                SessionState::from_slice(&plain)
            },
            None => SessionState::from_slice(raw),
        }
    }
}

#[derive(Debug, Default)]
pub struct NoStore;
#[derive(Debug)]
pub struct WithStore<S>(S);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoStore {}
impl<S> Sealed for WithStore<S> {}

/// A builder for a [`SessionHandler`].
///
/// Key bytes are held in zeroizing buffers until they are handed to the codec.
#[allow(private_bounds)]
pub struct SessionHandlerBuilder<T: Sealed = NoStore> {
    state: T,
    key: Option<Zeroizing<Vec<u8>>>,
    fingerprint: Option<Zeroizing<Vec<u8>>>,
    mode: CipherMode,
    lifetime: Duration,
}

#[allow(private_bounds)]
impl<T: Sealed> fmt::Debug for SessionHandlerBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandlerBuilder")
            .field("encrypted", &self.key.is_some())
            .field("fingerprinted", &self.fingerprint.is_some())
            .field("mode", &self.mode)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl Default for SessionHandlerBuilder {
    fn default() -> Self {
        Self {
            state: NoStore,
            key: None,
            fingerprint: None,
            mode: CipherMode::default(),
            lifetime: DEFAULT_LIFETIME,
        }
    }
}

impl SessionHandlerBuilder<NoStore> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn store<S: SessionStore>(self, store: S) -> SessionHandlerBuilder<WithStore<S>> {
        SessionHandlerBuilder {
            state: WithStore(store),
            key: self.key,
            fingerprint: self.fingerprint,
            mode: self.mode,
            lifetime: self.lifetime,
        }
    }
}

#[allow(private_bounds)]
impl<T: Sealed> SessionHandlerBuilder<T> {
    /// Enables encryption with `key`. Without a key, payloads are stored unencrypted.
    #[must_use]
    pub fn encryption_key(mut self, key: impl AsRef<[u8]>) -> Self {
        self.key = Some(Zeroizing::new(key.as_ref().to_vec()));
        self
    }

    /// Binds stored data to a client context; see [`fingerprint`].
    #[must_use]
    pub fn fingerprint(mut self, fingerprint: impl AsRef<[u8]>) -> Self {
        self.fingerprint = Some(Zeroizing::new(fingerprint.as_ref().to_vec()));
        self
    }

    #[must_use]
    pub const fn mode(mut self, mode: CipherMode) -> Self {
        self.mode = mode;
        self
    }

    /// Age after which [`SessionHandler::gc`] removes records.
    #[must_use]
    pub const fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }
}

impl<S: SessionStore> SessionHandlerBuilder<WithStore<S>> {
    /// Finalizes the handler.
    ///
    /// # Errors
    /// Returns [`SessionError::Configuration`] if the key is empty, a fingerprint is given
    /// without a key, or no secure random source is available.
    pub fn build(self) -> Result<SessionHandler<S>, SessionError> {
        let codec = match (&self.key, &self.fingerprint) {
            (None, None) => None,
            (None, Some(_)) => {
                return Err(SessionError::Configuration {
                    message: "A fingerprint requires an encryption key".into(),
                    context: None,
                });
            },
            (Some(key), fingerprint) => {
                let mut builder = Codec::builder().secret(key.as_slice()).mode(self.mode);
                if let Some(fingerprint) = fingerprint {
                    builder = builder.fingerprint(fingerprint.as_slice());
                }
                Some(builder.build().map_err(|e| SessionError::Configuration {
                    message: e.to_string().into(),
                    context: Some("Encryption key".into()),
                })?)
            },
        };

        Ok(SessionHandler {
            inner: Arc::new(HandlerInner {
                store: self.state.0,
                codec,
                lifetime: self.lifetime,
                decrypt_failures: AtomicU64::new(0),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsake_store::MemoryStore;

    #[test]
    fn fingerprint_is_hex_sha256() {
        assert_eq!(
            fingerprint("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn empty_key_is_a_configuration_error() {
        let result = SessionHandler::builder().store(MemoryStore::default()).encryption_key("").build();
        assert!(matches!(result, Err(SessionError::Configuration { .. })));
    }

    #[test]
    fn fingerprint_without_key_is_rejected() {
        let result = SessionHandler::builder().store(MemoryStore::default()).fingerprint("ua").build();
        assert!(matches!(result, Err(SessionError::Configuration { .. })));
    }

    #[test]
    fn no_key_means_plain_storage() {
        let handler = SessionHandler::builder().store(MemoryStore::default()).build().unwrap();

        assert!(!handler.is_encrypted());
        assert_eq!(handler.mode(), None);
    }

    #[test]
    fn mode_is_forwarded_to_codec() {
        let handler = SessionHandler::builder()
            .store(MemoryStore::default())
            .encryption_key("k")
            .mode(CipherMode::Authenticated)
            .build()
            .unwrap();

        assert_eq!(handler.mode(), Some(CipherMode::Authenticated));
    }
}
