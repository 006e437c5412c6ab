use keepsake_store::{FileStore, SessionId};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Opens a file store rooted in a fresh temp directory.
/// # Panics
/// * If the temp directory or the store cannot be created.
pub async fn setup_file_store(lifetime: Duration) -> (TempDir, FileStore) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let store = FileStore::builder()
        .root(temp.path().join("sessions"))
        .lifetime(lifetime)
        .connect()
        .await
        .expect("Failed to open file store");
    (temp, store)
}

/// # Panics
/// * If `raw` is not a valid session id.
#[must_use]
pub fn sid(raw: &str) -> SessionId {
    SessionId::new(raw).expect("fixture id must be valid")
}

/// Moves the modification time of `path` `age` into the past.
/// # Panics
/// * If the file cannot be opened or touched.
pub fn backdate(path: &Path, age: Duration) {
    let file = std::fs::File::options().write(true).open(path).expect("Failed to open record");
    file.set_modified(SystemTime::now() - age).expect("Failed to set mtime");
}
