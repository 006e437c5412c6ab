use crate::error::CodecError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop};

// --- Blob format constants ---

/// Random salt prefixed to every blob.
pub const SALT_LEN: usize = 16;

/// AES-256 key length taken from the salted digest.
pub(crate) const KEY_LEN: usize = 32;

/// CBC initialization vector length taken from the salted digest.
pub(crate) const IV_LEN: usize = 16;

/// GCM nonce length (96-bit), a prefix of the IV bytes.
pub(crate) const NONCE_LEN: usize = 12;

/// GCM tag length (128-bit).
pub(crate) const TAG_LEN: usize = 16;

/// AES block length.
pub(crate) const BLOCK_LEN: usize = 16;

// --- Modes ---

/// Block cipher construction used for session blobs.
///
/// Both modes share the salt prefix and the `SHA-512(secret ++ salt)` derivation:
///
/// ```text
/// Cbc:            base64( SALT(16) | AES-256-CBC/PKCS#7 CIPHERTEXT(16·n) )
/// Authenticated:  base64( SALT(16) | AES-256-GCM CIPHERTEXT(N) | TAG(16) )
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CipherMode {
    /// Confidentiality only. Compatible with existing stored sessions.
    #[default]
    Cbc,
    /// Confidentiality and integrity; any modification fails to decrypt.
    Authenticated,
}

impl CipherMode {
    /// Smallest decoded blob (after the salt) this mode can produce.
    pub(crate) const fn min_body_len(self) -> usize {
        match self {
            Self::Cbc => BLOCK_LEN,
            Self::Authenticated => TAG_LEN,
        }
    }
}

// --- Envelope ---

/// A decoded blob split into its public salt and the cipher output.
///
/// ```text
/// [SALT(16)][BODY(N)]
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Envelope {
    data: Vec<u8>,
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope").field("len", &self.data.len()).finish_non_exhaustive()
    }
}

impl Envelope {
    /// Decodes base64 text into an envelope.
    ///
    /// Surrounding ASCII whitespace is ignored, so blobs read from text files decode as-is.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidPayload`] if the text is not base64 or decodes to fewer
    /// than [`SALT_LEN`] bytes.
    pub fn decode(blob: impl AsRef<[u8]>) -> Result<Self, CodecError> {
        let text = blob.as_ref().trim_ascii();
        let data = STANDARD.decode(text).map_err(|e| CodecError::InvalidPayload {
            message: "Blob is not valid base64".into(),
            context: Some(e.to_string().into()),
        })?;

        if data.len() < SALT_LEN {
            return Err(CodecError::InvalidPayload {
                message: format!(
                    "Blob too short ({} bytes). Expected at least {SALT_LEN} bytes",
                    data.len()
                )
                .into(),
                context: None,
            });
        }

        Ok(Self { data })
    }

    pub(crate) fn assemble(salt: &[u8; SALT_LEN], body: &[u8]) -> Self {
        let mut data = Vec::with_capacity(SALT_LEN + body.len());
        data.extend_from_slice(salt);
        data.extend_from_slice(body);
        Self { data }
    }

    /// Encodes the envelope as standard, padded base64.
    #[must_use]
    pub fn encode(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// The public salt prefix.
    #[must_use]
    pub fn salt(&self) -> &[u8] {
        &self.data[..SALT_LEN]
    }

    /// Everything after the salt: ciphertext, plus the tag in authenticated mode.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.data[SALT_LEN..]
    }

    /// Total decoded length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

// --- Key material ---

/// Caller secret, wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub(crate) struct Secret(Vec<u8>);

impl Secret {
    pub(crate) fn new(secret: &[u8], fingerprint: Option<&[u8]>) -> Self {
        let extra = fingerprint.unwrap_or_default();
        let mut bytes = Vec::with_capacity(secret.len() + extra.len());
        bytes.extend_from_slice(secret);
        bytes.extend_from_slice(extra);
        Self(bytes)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Derives the per-blob key and IV: `D = SHA-512(secret ++ salt)`, key = `D[0..32]`,
    /// IV = `D[32..48]`.
    pub(crate) fn derive(&self, salt: &[u8]) -> DerivedKey {
        let mut hasher = Sha512::new();
        hasher.update(&self.0);
        hasher.update(salt);
        let mut digest = hasher.finalize();

        let mut derived = DerivedKey { key: [0u8; KEY_LEN], iv: [0u8; IV_LEN] };
        derived.key.copy_from_slice(&digest[..KEY_LEN]);
        derived.iv.copy_from_slice(&digest[KEY_LEN..KEY_LEN + IV_LEN]);
        digest.as_mut_slice().zeroize();

        derived
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

#[derive(Zeroize, ZeroizeOnDrop)]
pub(crate) struct DerivedKey {
    pub(crate) key: [u8; KEY_LEN],
    pub(crate) iv: [u8; IV_LEN],
}

impl DerivedKey {
    pub(crate) fn nonce(&self) -> &[u8] {
        &self.iv[..NONCE_LEN]
    }
}
