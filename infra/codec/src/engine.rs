use aead::inout::InOutBuf;
use aead::{AeadInOut, KeyInit, Nonce};
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes_gcm::Aes256Gcm;
use getrandom::fill;
use std::sync::Arc;

use crate::builder::CodecBuilder;
use crate::error::CodecError;
use crate::types::{BLOCK_LEN, CipherMode, DerivedKey, Envelope, SALT_LEN, Secret, TAG_LEN};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

#[allow(unreachable_pub)]
#[derive(Debug)]
pub struct CodecInner {
    pub(crate) secret: Secret,
    pub(crate) mode: CipherMode,
}

/// The session payload encryption codec.
///
/// Every [`Codec::encrypt`] call draws a fresh 16-byte salt, derives a one-off key and IV
/// from `SHA-512(secret ++ salt)` and emits `base64(salt ++ ciphertext)`. The blob carries
/// everything except the secret, so [`Codec::decrypt`] needs only the blob.
///
/// `Codec` wraps its state in an [`Arc`] and is cheap to clone across tasks.
///
/// ### Example
/// ```rust
/// use keepsake_codec::{Codec, CodecError};
///
/// # fn main() -> Result<(), CodecError> {
/// let codec = Codec::new("s3cret")?;
///
/// let blob = codec.encrypt(br#"{"user":{"id":42}}"#)?;
/// assert_eq!(codec.decrypt(&blob)?, br#"{"user":{"id":42}}"#);
///
/// // Fresh salt on every call.
/// assert_ne!(blob, codec.encrypt(br#"{"user":{"id":42}}"#)?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Codec {
    pub(crate) inner: Arc<CodecInner>,
}

impl Codec {
    /// Returns a new [`CodecBuilder`].
    #[must_use]
    pub fn builder() -> CodecBuilder {
        CodecBuilder::new()
    }

    /// Builds a [`CipherMode::Cbc`] codec for `secret`.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidConfiguration`] if the secret is empty.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, CodecError> {
        Self::builder().secret(secret).build()
    }

    /// The block cipher construction this codec writes and expects.
    #[must_use]
    pub fn mode(&self) -> CipherMode {
        self.inner.mode
    }

    /// Encrypts `plaintext` (possibly empty) into printable base64 text.
    ///
    /// # Errors
    /// Returns [`CodecError::Encryption`] if no salt can be drawn or the cipher rejects
    /// the derived key.
    pub fn encrypt(&self, plaintext: impl AsRef<[u8]>) -> Result<String, CodecError> {
        let salt = Self::next_salt()?;
        let derived = self.inner.secret.derive(&salt);

        let body = match self.inner.mode {
            CipherMode::Cbc => Self::seal_cbc(&derived, plaintext.as_ref())?,
            CipherMode::Authenticated => Self::seal_gcm(&derived, plaintext.as_ref())?,
        };

        Ok(Envelope::assemble(&salt, &body).encode())
    }

    /// Decrypts a blob produced by [`Codec::encrypt`] with the same secret and mode.
    ///
    /// # Errors
    /// * [`CodecError::InvalidPayload`] If the blob is not base64 or shorter than the salt.
    /// * [`CodecError::Decryption`] If the key is wrong or the ciphertext was modified.
    pub fn decrypt(&self, blob: impl AsRef<[u8]>) -> Result<Vec<u8>, CodecError> {
        let envelope = Envelope::decode(blob)?;
        self.open(&envelope)
    }

    /// Decrypts an already decoded [`Envelope`].
    ///
    /// # Errors
    /// Same failure modes as [`Codec::decrypt`], minus base64 decoding.
    pub fn open(&self, envelope: &Envelope) -> Result<Vec<u8>, CodecError> {
        let mode = self.inner.mode;
        if envelope.body().len() < mode.min_body_len() {
            return Err(CodecError::Decryption {
                message: "Ciphertext too short".into(),
                context: Some(format!("mode={mode:?}").into()),
            });
        }

        let derived = self.inner.secret.derive(envelope.salt());

        match mode {
            CipherMode::Cbc => Self::open_cbc(&derived, envelope.body()),
            CipherMode::Authenticated => Self::open_gcm(&derived, envelope.body()),
        }
    }

    fn next_salt() -> Result<[u8; SALT_LEN], CodecError> {
        let mut salt = [0u8; SALT_LEN];
        fill(&mut salt).map_err(|e| CodecError::Encryption {
            message: "System RNG unavailable for salt generation".into(),
            context: Some(e.to_string().into()),
        })?;
        Ok(salt)
    }

    fn seal_cbc(derived: &DerivedKey, plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
        let cipher = Aes256CbcEnc::new_from_slices(&derived.key, &derived.iv).map_err(|_| {
            CodecError::Encryption { message: "Invalid derived key length".into(), context: None }
        })?;
        Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
    }

    fn open_cbc(derived: &DerivedKey, body: &[u8]) -> Result<Vec<u8>, CodecError> {
        if body.len() % BLOCK_LEN != 0 {
            return Err(CodecError::Decryption {
                message: "Ciphertext is not block aligned".into(),
                context: Some(format!("len={}", body.len()).into()),
            });
        }

        let cipher = Aes256CbcDec::new_from_slices(&derived.key, &derived.iv).map_err(|_| {
            CodecError::Decryption { message: "Invalid derived key length".into(), context: None }
        })?;

        cipher.decrypt_padded_vec_mut::<Pkcs7>(body).map_err(|_| CodecError::Decryption {
            message: "Decryption failed".into(),
            context: Some("Invalid padding".into()),
        })
    }

    fn seal_gcm(derived: &DerivedKey, plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
        let cipher = Aes256Gcm::new_from_slice(&derived.key).map_err(|_| {
            CodecError::Encryption { message: "Invalid derived key length".into(), context: None }
        })?;
        let nonce: Nonce<Aes256Gcm> = derived.nonce().try_into().map_err(|_| {
            CodecError::Encryption { message: "Invalid nonce length".into(), context: None }
        })?;

        let mut buf = Vec::with_capacity(plaintext.len() + TAG_LEN);
        buf.extend_from_slice(plaintext);

        let tag = cipher
            .encrypt_inout_detached(&nonce, &[], InOutBuf::from(&mut buf[..]))
            .map_err(|_| CodecError::Encryption {
                message: "Encryption failed".into(),
                context: Some("AEAD encryption failed".into()),
            })?;

        buf.extend_from_slice(tag.as_slice());
        Ok(buf)
    }

    fn open_gcm(derived: &DerivedKey, body: &[u8]) -> Result<Vec<u8>, CodecError> {
        let cipher = Aes256Gcm::new_from_slice(&derived.key).map_err(|_| {
            CodecError::Decryption { message: "Invalid derived key length".into(), context: None }
        })?;
        let nonce: Nonce<Aes256Gcm> = derived.nonce().try_into().map_err(|_| {
            CodecError::Decryption { message: "Invalid nonce length".into(), context: None }
        })?;

        let (ciphertext, tag_slice) = body.split_at(body.len() - TAG_LEN);
        let tag = tag_slice.try_into().map_err(|_| CodecError::Decryption {
            message: "Invalid tag length".into(),
            context: None,
        })?;

        let mut buf = ciphertext.to_vec();
        cipher.decrypt_inout_detached(&nonce, &[], InOutBuf::from(&mut buf[..]), &tag).map_err(
            |_| CodecError::Decryption {
                message: "Decryption failed".into(),
                context: Some("AEAD authentication failed".into()),
            },
        )?;

        Ok(buf)
    }
}

/// Encrypts `plaintext` with a one-off [`CipherMode::Cbc`] codec.
///
/// # Errors
/// See [`Codec::new`] and [`Codec::encrypt`].
pub fn encrypt(plaintext: impl AsRef<[u8]>, secret: impl AsRef<[u8]>) -> Result<String, CodecError> {
    Codec::new(secret)?.encrypt(plaintext)
}

/// Decrypts `blob` with a one-off [`CipherMode::Cbc`] codec.
///
/// # Errors
/// See [`Codec::new`] and [`Codec::decrypt`].
pub fn decrypt(blob: impl AsRef<[u8]>, secret: impl AsRef<[u8]>) -> Result<Vec<u8>, CodecError> {
    Codec::new(secret)?.decrypt(blob)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(mode: CipherMode) -> Codec {
        Codec::builder().secret("unit-secret").mode(mode).build().expect("codec should build")
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        let result = Codec::new("");
        assert!(matches!(result, Err(CodecError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_salt_sequence() {
        let s1 = Codec::next_salt().unwrap();
        let s2 = Codec::next_salt().unwrap();

        assert_ne!(s1, s2);
    }

    #[test]
    fn test_cbc_blob_layout() {
        let codec = codec(CipherMode::Cbc);
        let blob = codec.encrypt(b"0123456789").unwrap();
        let envelope = Envelope::decode(&blob).unwrap();

        assert_eq!(envelope.salt().len(), SALT_LEN);
        assert_eq!(envelope.body().len(), BLOCK_LEN, "10 bytes pad to one block");
    }

    #[test]
    fn test_cbc_full_block_gets_extra_padding_block() {
        let codec = codec(CipherMode::Cbc);
        let blob = codec.encrypt([7u8; BLOCK_LEN]).unwrap();

        assert_eq!(Envelope::decode(&blob).unwrap().body().len(), 2 * BLOCK_LEN);
    }

    #[test]
    fn test_gcm_blob_layout() {
        let codec = codec(CipherMode::Authenticated);
        let blob = codec.encrypt(b"0123456789").unwrap();

        assert_eq!(Envelope::decode(&blob).unwrap().body().len(), 10 + TAG_LEN);
    }

    #[test]
    fn test_empty_plaintext_roundtrip_in_both_modes() {
        for mode in [CipherMode::Cbc, CipherMode::Authenticated] {
            let codec = codec(mode);
            let blob = codec.encrypt(b"").unwrap();
            assert!(codec.decrypt(&blob).unwrap().is_empty());
        }
    }

    #[test]
    fn test_derivation_is_deterministic_per_salt() {
        let secret = Secret::new(b"unit-secret", None);
        let salt = [3u8; SALT_LEN];

        let a = secret.derive(&salt);
        let b = secret.derive(&salt);
        let c = secret.derive(&[4u8; SALT_LEN]);

        assert_eq!(a.key, b.key);
        assert_eq!(a.iv, b.iv);
        assert_ne!(a.key, c.key);
    }

    #[test]
    fn test_unaligned_cbc_body_is_a_decryption_error() {
        let codec = codec(CipherMode::Cbc);
        let envelope = Envelope::assemble(&[0u8; SALT_LEN], &[1u8; BLOCK_LEN + 3]);

        let result = codec.open(&envelope);
        assert!(matches!(result, Err(CodecError::Decryption { .. })));
    }

    #[test]
    fn test_modes_do_not_cross_decrypt() {
        let cbc = codec(CipherMode::Cbc);
        let gcm = codec(CipherMode::Authenticated);

        let blob = cbc.encrypt(b"cross-mode payload").unwrap();
        assert!(gcm.decrypt(&blob).is_err());
    }
}
