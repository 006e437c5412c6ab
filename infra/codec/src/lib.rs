//! Per-record encryption codec for session payloads.
//!
//! The codec turns plaintext bytes into printable text that carries its own salt, so the
//! only thing a reader needs besides the blob is the secret it was written with.
//!
//! ## Blob Format
//!
//! ```text
//! base64( [SALT(16)][CIPHERTEXT(16·n)] )
//! ```
//!
//! * `SALT` is drawn from the system RNG on every call and never reused.
//! * Key and IV come from `D = SHA-512(secret ++ salt)`: key = `D[0..32]`, IV = `D[32..48]`.
//! * `CIPHERTEXT` is AES-256-CBC with PKCS#7 padding.
//!
//! This layout is the persisted contract: offline tooling must produce and accept it as-is.
//!
//! ## Integrity
//!
//! [`CipherMode::Cbc`] provides confidentiality only. A modified blob either fails the padding
//! check or decrypts to different bytes; it never decrypts back to the original plaintext.
//! [`CipherMode::Authenticated`] swaps the cipher for AES-256-GCM under the same derivation
//! (nonce = `D[32..44]`) and appends a 16-byte tag, so any modification is rejected.
//!
//! ## Example
//!
//! ```rust
//! use keepsake_codec::{CipherMode, Codec, CodecError};
//!
//! # fn main() -> Result<(), CodecError> {
//! let codec = Codec::builder()
//!     .secret("s3cret")
//!     .fingerprint("client-fingerprint")
//!     .mode(CipherMode::Authenticated)
//!     .build()?;
//!
//! let blob = codec.encrypt(b"payload")?;
//! assert_eq!(codec.decrypt(&blob)?, b"payload");
//! # Ok(())
//! # }
//! ```

mod builder;
mod engine;
mod error;
mod types;

pub use builder::CodecBuilder;
pub use engine::{Codec, decrypt, encrypt};
pub use error::{CodecError, CodecErrorExt};
pub use types::{CipherMode, Envelope, SALT_LEN};
