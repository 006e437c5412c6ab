//! # Codec Errors
//!
//! This module defines the [`CodecError`] enum returned by every codec operation.
//! Messages never carry secret or derived key material.

use std::borrow::Cow;

/// A specialized [`CodecError`] enum for codec failures.
#[keepsake_derive::keepsake_error]
pub enum CodecError {
    /// The codec cannot be constructed: empty secret or no usable system RNG.
    #[error("Invalid codec configuration{}: {message}", format_context(.context))]
    InvalidConfiguration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Failure while producing a blob.
    #[error("Encryption error{}: {message}", format_context(.context))]
    Encryption { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The blob is not valid base64 or is shorter than its salt prefix.
    #[error("Invalid payload{}: {message}", format_context(.context))]
    InvalidPayload { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The blob could not be decrypted.
    ///
    /// Wrong secret, changed fingerprint, or corrupted ciphertext all end here.
    #[error("Decryption error{}: {message}", format_context(.context))]
    Decryption { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl CodecError {
    /// Returns `true` for the "cannot decrypt" family: malformed blobs and cipher failures.
    #[must_use]
    pub const fn is_decryption_failure(&self) -> bool {
        matches!(self, Self::InvalidPayload { .. } | Self::Decryption { .. })
    }
}
