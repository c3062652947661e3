//! Collision-free output naming.
//!
//! Uniqueness is best-effort: the name is checked here and created later by
//! the receiver, so another process may claim it in between.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Returns a path that does not exist on disk.
///
/// `desired` is returned unchanged when free. Otherwise `desired(0)`,
/// `desired(1)`, ... are tried in order and the first free candidate is
/// returned. A path ending in a separator names a folder, not a file, and
/// is returned as is. Nothing is created or modified.
pub fn resolve(desired: &Path) -> PathBuf {
    if names_folder(desired) || !is_taken(desired) {
        return desired.to_path_buf();
    }

    let mut index: u64 = 0;
    loop {
        let candidate = suffixed(desired, index);
        if !is_taken(&candidate) {
            debug!(
                desired = %desired.display(),
                resolved = %candidate.display(),
                "destination exists, using suffixed name"
            );
            return candidate;
        }
        index += 1;
    }
}

/// Appends `(index)` to the full path, after any extension.
pub fn suffixed(path: &Path, index: u64) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!("({index})"));
    PathBuf::from(name)
}

/// Follows symlinks: a dangling link leaves the name free.
fn is_taken(path: &Path) -> bool {
    path.exists()
}

fn names_folder(path: &Path) -> bool {
    path.as_os_str()
        .as_encoded_bytes()
        .last()
        .is_some_and(|&b| std::path::is_separator(b as char))
}
