//! Byte-level persistence for encrypted session blobs.
//!
//! The [`SessionStore`] trait is the only contract the session layer depends on: read the
//! bytes last written under an id, replace them, destroy them, and collect expired records.
//! Two backends ship with the crate:
//!
//! - **[`FileStore`]**: one file per session under a sharded directory tree, written with an
//!   atomic swap (unique temp file + `fsync` + `rename`), expiring by modification time.
//!   Orphaned temp files are purged when the store is opened.
//! - **[`MemoryStore`]**: an in-process `moka` cache with a time-to-live.
//!
//! Session ids are validated by [`SessionId`] before they reach any backend, so an id can
//! never address a path outside the store root.
//!
//! # Examples
//!
//! ```rust
//! use keepsake_store::{MemoryStore, SessionId, SessionStore, StoreError};
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), StoreError> {
//!     let store = MemoryStore::new(Duration::from_secs(60));
//!     let id: SessionId = "abc".parse()?;
//!
//!     assert!(store.read(&id).await?.is_none());
//!     store.write(&id, b"blob").await?;
//!     assert_eq!(store.read(&id).await?, Some(b"blob".to_vec()));
//!     Ok(())
//! }
//! ```

mod builder;
mod error;
mod file;
mod id;
mod layout;
mod maintenance;
mod memory;
mod store;

pub use builder::{DEFAULT_LIFETIME, FileStoreBuilder};
pub use error::{StoreError, StoreErrorExt};
pub use file::FileStore;
pub use id::{MAX_SESSION_ID_LEN, SessionId};
pub use memory::MemoryStore;
pub use store::SessionStore;
