//! Destination path handling for received files.
//!
//! Builds the output path from the configured folder and file name, and
//! picks a name that does not collide with an existing file.

mod destination;
mod naming;

pub use destination::destination_path;
pub use naming::{resolve, suffixed};

/// Returns the user's home directory.
fn home_dir() -> std::path::PathBuf {
    std::env::var("HOME")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("/tmp"))
}
