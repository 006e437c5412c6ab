use crate::layout;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{error, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Temp files younger than this may still belong to an in-flight write.
const TMP_GRACE: Duration = Duration::from_secs(300);

pub(crate) async fn purge_tmp(root: &Path) {
    let root = root.to_path_buf();
    let now = SystemTime::now();

    match tokio::task::spawn_blocking(move || {
        sweep(&root, |entry| layout::is_tmp(entry.path()) && is_older(entry, now, TMP_GRACE))
    })
    .await
    {
        Ok((removed, failed)) if removed > 0 || failed > 0 => {
            info!(removed, failed, "Cleaned up temporary files");
        },
        Err(e) => {
            error!(error = %e, "Temp file cleanup task panicked");
        },
        _ => {},
    }
}

/// Removes every committed record whose modification time is older than `max_lifetime`.
pub(crate) fn sweep_expired(root: &Path, now: SystemTime, max_lifetime: Duration) -> usize {
    let (removed, failed) = sweep(root, |entry| {
        layout::is_record(entry.path()) && is_older(entry, now, max_lifetime)
    });

    if failed > 0 {
        warn!(failed, "Some expired session records could not be removed");
    }
    removed
}

/// Walks `root` bottom-up, deletes matching files and prunes emptied shard directories.
fn sweep(root: &Path, matches: impl Fn(&DirEntry) -> bool) -> (usize, usize) {
    let mut removed = 0;
    let mut failed = 0;

    WalkDir::new(root)
        .contents_first(true)
        .into_iter()
        .flatten()
        .filter(|e| e.path() != root)
        .for_each(|entry| {
            let path = entry.path();

            if entry.file_type().is_file() {
                if matches(&entry) {
                    match std::fs::remove_file(path) {
                        Ok(()) => removed += 1,
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "Failed to remove file");
                            failed += 1;
                        },
                    }
                }
            } else if entry.file_type().is_dir() {
                // Fails harmlessly while the shard still holds records.
                let _ = std::fs::remove_dir(path);
            }
        });

    (removed, failed)
}

pub(crate) fn is_expired(modified: SystemTime, now: SystemTime, lifetime: Duration) -> bool {
    now.duration_since(modified).is_ok_and(|age| age > lifetime)
}

fn is_older(entry: &DirEntry, now: SystemTime, threshold: Duration) -> bool {
    entry
        .metadata()
        .ok()
        .and_then(|m| m.modified().ok())
        .is_none_or(|modified| is_expired(modified, now, threshold))
}
