//! Client configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/tcpsink/client.toml`
//! - Windows: `%APPDATA%/tcpsink/client.toml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Host name or address of the sending server.
    #[serde(default = "default_remote_host")]
    pub remote_host: String,

    /// TCP port of the sending server.
    #[serde(default = "default_remote_port")]
    pub remote_port: u16,

    /// Folder received files are saved into. `~` is expanded.
    #[serde(default = "default_dir_path")]
    pub dir_path: String,

    /// Base file name; a `(n)` suffix is added when it is taken.
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

fn default_remote_host() -> String {
    "127.0.0.1".into()
}

fn default_remote_port() -> u16 {
    9000
}

fn default_dir_path() -> String {
    ".".into()
}

fn default_file_name() -> String {
    "received.bin".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_host: default_remote_host(),
            remote_port: default_remote_port(),
            dir_path: default_dir_path(),
            file_name: default_file_name(),
        }
    }
}

impl Config {
    /// Loads configuration from the default location, creating it if absent.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path())
    }

    /// Loads configuration from `path`, or writes and returns the defaults
    /// if the file does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            tracing::debug!(path = %path.display(), "configuration loaded");
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the platform-specific configuration file path.
pub fn config_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("tcpsink")
            .join("client.toml")
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("tcpsink").join("client.toml")
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        PathBuf::from("/tmp/tcpsink/client.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.remote_host, "127.0.0.1");
        assert_eq!(config.remote_port, 9000);
        assert_eq!(config.dir_path, ".");
        assert_eq!(config.file_name, "received.bin");
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: Config = toml::from_str("remote_port = 5555").unwrap();
        assert_eq!(config.remote_port, 5555);
        assert_eq!(config.remote_host, "127.0.0.1");
        assert_eq!(config.file_name, "received.bin");
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("client.toml");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("client.toml");

        let config = Config {
            remote_host: "files.lan".into(),
            remote_port: 7000,
            dir_path: "~/Downloads".into(),
            file_name: "dump.bin".into(),
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("client.toml");
        std::fs::write(&path, "remote_port = \"not a number\"").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn config_path_names_the_app() {
        assert!(config_path().to_string_lossy().contains("tcpsink"));
    }
}
