use crate::id::SessionId;
use std::path::{Path, PathBuf};

/// Extension of committed session records.
pub(crate) const RECORD_EXT: &str = "sess";

/// Marker embedded in the name of in-flight temp files.
pub(crate) const TMP_MARKER: &str = ".kstmp.";

/// Maps a session id to its sharded record path: `<root>/<id[0..2]>/<id[2..4]>/<id>.sess`.
///
/// Ids shorter than four characters land directly under the root. [`SessionId`]
/// validation guarantees the result stays inside `root`.
pub(crate) fn record_path(root: &Path, id: &SessionId) -> PathBuf {
    let id = id.as_str();
    let mut path = root.to_path_buf();

    if id.len() >= 4 {
        path.push(&id[0..2]);
        path.push(&id[2..4]);
    }
    path.push(format!("{id}.{RECORD_EXT}"));

    path
}

pub(crate) fn is_record(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == RECORD_EXT)
        && path.file_name().and_then(|n| n.to_str()).is_some_and(|n| !n.contains(TMP_MARKER))
}

pub(crate) fn is_tmp(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.contains(TMP_MARKER))
}
