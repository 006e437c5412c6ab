//! # Session Errors
//!
//! [`SessionError`] separates the three outcomes a host must tell apart: invalid setup,
//! a failing backend, and payload problems. Undecryptable stored data is not an error at
//! all; see [`crate::LoadOutcome::Discarded`].

use keepsake_codec::CodecError;
use keepsake_store::StoreError;
use std::borrow::Cow;

/// A specialized [`SessionError`] enum for the session layer.
#[keepsake_derive::keepsake_error]
pub enum SessionError {
    /// Invalid settings; the handler must not be used.
    #[error("Invalid session configuration{}: {message}", format_context(.context))]
    Configuration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The store could not be read or written. Never retried here.
    #[error("Session backend failure{}: {source}", format_context(.context))]
    Backend { source: StoreError, context: Option<Cow<'static, str>> },

    #[error("Session encryption failure{}: {source}", format_context(.context))]
    Codec { source: CodecError, context: Option<Cow<'static, str>> },

    #[error("Session serialization failure{}: {source}", format_context(.context))]
    Serialization { source: serde_json::Error, context: Option<Cow<'static, str>> },

    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

impl SessionError {
    /// Returns `true` if the failure came from the session store.
    #[must_use]
    pub const fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }
}
