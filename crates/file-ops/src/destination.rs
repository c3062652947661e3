//! Output path construction from the configured folder and file name.

use std::io;
use std::path::{Path, PathBuf};

/// Builds the absolute destination path for a transfer.
///
/// A leading `~` in `folder` expands to the home directory and relative
/// folders are taken from the current directory. The folder is not checked
/// for existence and the file name is not validated: a missing folder or an
/// empty name surfaces later, when the file is opened.
pub fn destination_path(folder: &str, file_name: &str) -> io::Result<PathBuf> {
    let folder = if folder.is_empty() {
        PathBuf::from(".")
    } else {
        expand_home(folder)
    };

    Ok(std::path::absolute(&folder)?.join(Path::new(file_name)))
}

/// Expands `~` prefix to the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        crate::home_dir().join(rest)
    } else if path == "~" {
        crate::home_dir()
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_folder_is_joined() {
        let path = destination_path("/srv/captures", "dump.bin").unwrap();
        assert_eq!(path, PathBuf::from("/srv/captures/dump.bin"));
    }

    #[test]
    fn relative_folder_becomes_absolute() {
        let path = destination_path("captures", "dump.bin").unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("captures/dump.bin"));
    }

    #[test]
    fn empty_folder_means_current_dir() {
        let path = destination_path("", "dump.bin").unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(path.parent().unwrap(), std::path::absolute(Path::new(".")).unwrap());
        assert!(path.starts_with(cwd));
    }

    #[test]
    fn home_prefix_expands() {
        let path = destination_path("~/captures", "dump.bin").unwrap();
        assert!(path.starts_with(crate::home_dir()));
        assert!(path.ends_with("captures/dump.bin"));
    }

    #[test]
    fn missing_folder_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("does/not/exist");
        let path = destination_path(folder.to_str().unwrap(), "dump.bin").unwrap();
        assert_eq!(path, folder.join("dump.bin"));
    }

    #[test]
    fn empty_file_name_names_the_folder() {
        let path = destination_path("/srv/captures", "").unwrap();
        assert_eq!(path, PathBuf::from("/srv/captures/"));
        assert!(path.as_os_str().to_string_lossy().ends_with('/'));
    }
}
