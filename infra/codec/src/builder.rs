use crate::engine::{Codec, CodecInner};
use crate::error::CodecError;
use crate::types::{CipherMode, Secret};
use private::Sealed;
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Debug, Default, ZeroizeOnDrop)]
pub struct NoSecret;
#[derive(Debug, Zeroize, ZeroizeOnDrop)]
pub struct WithSecret {
    secret: Vec<u8>,
    fingerprint: Option<Vec<u8>>,
}

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoSecret {}
impl Sealed for WithSecret {}

/// A builder for a [`Codec`].
///
/// Implements `ZeroizeOnDrop` so raw secret bytes are cleared as soon as the builder goes away.
#[allow(private_bounds)]
#[derive(Debug, Zeroize, ZeroizeOnDrop)]
pub struct CodecBuilder<S: Sealed + ZeroizeOnDrop = NoSecret> {
    #[zeroize(skip)]
    mode: CipherMode,
    state: S,
}

impl Default for CodecBuilder {
    fn default() -> Self {
        Self { mode: CipherMode::default(), state: NoSecret }
    }
}

impl CodecBuilder {
    /// Creates a new builder in [`CipherMode::Cbc`].
    #[must_use = "Builder must be given a secret before use"]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the encryption secret.
    ///
    /// The secret is used as-is; its strength is the caller's responsibility.
    #[must_use]
    pub fn secret(self, secret: impl AsRef<[u8]>) -> CodecBuilder<WithSecret> {
        CodecBuilder {
            mode: self.mode,
            state: WithSecret { secret: secret.as_ref().to_vec(), fingerprint: None },
        }
    }
}

#[allow(private_bounds)]
impl<S: Sealed + ZeroizeOnDrop> CodecBuilder<S> {
    /// Selects the block cipher construction.
    #[must_use]
    pub const fn mode(mut self, mode: CipherMode) -> Self {
        self.mode = mode;
        self
    }
}

impl CodecBuilder<WithSecret> {
    /// Appends a request-context value (e.g., a client fingerprint) to the secret.
    ///
    /// Blobs written under one fingerprint fail to decrypt under any other.
    #[must_use]
    pub fn fingerprint(mut self, fingerprint: impl AsRef<[u8]>) -> Self {
        self.state.fingerprint = Some(fingerprint.as_ref().to_vec());
        self
    }

    /// Finalizes construction and zeroes the builder.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidConfiguration`] if the secret is empty or the
    /// system RNG cannot produce salts.
    pub fn build(mut self) -> Result<Codec, CodecError> {
        let secret = Secret::new(&self.state.secret, self.state.fingerprint.as_deref());
        self.zeroize();

        if secret.is_empty() {
            return Err(CodecError::InvalidConfiguration {
                message: "Encryption secret must not be empty".into(),
                context: None,
            });
        }

        let mut sample = [0u8; 1];
        getrandom::fill(&mut sample).map_err(|e| CodecError::InvalidConfiguration {
            message: "System RNG unavailable".into(),
            context: Some(e.to_string().into()),
        })?;

        Ok(Codec { inner: Arc::new(CodecInner { secret, mode: self.mode }) })
    }
}
