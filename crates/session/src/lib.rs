//! # Keepsake Session
//!
//! Encrypted, namespaced session state on top of `keepsake-codec` and `keepsake-store`.
//!
//! - **[`SessionHandler`]** loads a session payload by id (decrypting it) and writes it back
//!   (encrypting it). Undecryptable data is discarded as an empty session, never an error.
//! - **[`SessionState`]** is the explicit, shared handle to one decrypted payload.
//! - **[`Accessor`]** is a dotted-path view bound by reference to one namespace of that
//!   payload. Accessors bound to the same namespace see each other's writes immediately.
//!
//! ## Example
//!
//! ```rust
//! use keepsake_session::{LoadOutcome, SessionHandler};
//! use keepsake_store::{MemoryStore, SessionId};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = SessionHandler::builder()
//!     .store(MemoryStore::default())
//!     .encryption_key("s3cret")
//!     .build()?;
//! let id = SessionId::new("abc")?;
//!
//! let loaded = handler.load(&id).await?;
//! assert_eq!(loaded.outcome, LoadOutcome::Fresh);
//!
//! let mut cart = loaded.state.namespace("cart");
//! cart.add("items", json!([]));
//! cart.add("items", json!({ "sku": "A-1", "qty": 2 }));
//! handler.write(&id, &loaded.state).await?;
//!
//! let restored = handler.load(&id).await?;
//! assert_eq!(restored.outcome, LoadOutcome::Restored);
//! assert_eq!(restored.state.namespace("cart").get("items.0.qty"), Some(json!(2)));
//! # Ok(())
//! # }
//! ```

mod accessor;
mod config;
mod error;
mod handler;
mod path;
mod state;

pub use accessor::{Accessor, Binding, DEFAULT_NAMESPACE, Scope};
pub use crate::config::{ENV_PREFIX, SessionConfig, load_config, load_config_with_env};
pub use error::{SessionError, SessionErrorExt};
pub use handler::{LoadOutcome, Loaded, SessionHandler, SessionHandlerBuilder, fingerprint};
pub use keepsake_codec::CipherMode;
pub use keepsake_store::SessionId;
pub use state::{Payload, SessionState};
