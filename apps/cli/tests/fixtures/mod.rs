#![allow(dead_code)]

use assert_cmd::Command;
use keepsake_session::{SessionHandler, SessionState};
use keepsake_store::{FileStore, SessionId};
use serde_json::Value;
use tempfile::TempDir;

pub const KEY: &str = "cli-s3cret";

/// The `keepsake` binary with a clean logging environment.
pub fn keepsake() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_keepsake"));
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Writes `payload` under `id` into a fresh session directory, encrypted with `key`.
pub async fn seed_session(id: &str, key: Option<&str>, payload: Value) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::builder().root(dir.path()).connect().await.unwrap();

    let mut builder = SessionHandler::builder().store(store);
    if let Some(key) = key {
        builder = builder.encryption_key(key);
    }
    let handler = builder.build().unwrap();

    let Value::Object(map) = payload else { panic!("payload must be an object") };
    handler.write(&SessionId::new(id).unwrap(), &SessionState::from_payload(map)).await.unwrap();

    dir
}
