//! Runtime settings for srvstack.
//!
//! Settings are read from a JSON file. Every field has a default, so a missing
//! file or a partial file is fine:
//!
//! ```json
//! {
//!   "log_path": "/var/log/srvstack.log",
//!   "web_root": "/var/www",
//!   "upgrade_on_install": false
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Location checked when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/srvstack/config.json";

/// Rotate the log once it grows past this many bytes (5 MiB).
pub const DEFAULT_LOG_MAX_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Append-only operation log
    pub log_path: PathBuf,
    /// Size threshold that triggers log rotation
    pub log_max_bytes: u64,
    /// Parent directory of scaffolded sites
    pub web_root: PathBuf,
    /// Directory holding virtual-host definitions
    pub vhost_dir: PathBuf,
    /// Runtime user of the web server; owns scaffolded files
    pub web_user: String,
    /// `host:port` dialled by the startup reachability probe
    pub probe_addr: String,
    /// Run `apt-get upgrade` before installing components
    pub upgrade_on_install: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("/var/log/srvstack.log"),
            log_max_bytes: DEFAULT_LOG_MAX_BYTES,
            web_root: PathBuf::from("/var/www"),
            vhost_dir: PathBuf::from("/etc/apache2/sites-available"),
            web_user: "www-data".to_string(),
            probe_addr: "1.1.1.1:443".to_string(),
            upgrade_on_install: true,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {:?}", path.as_ref()))?;

        let settings: Self =
            serde_json::from_str(&content).context("Failed to parse settings JSON")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Resolve the settings for this invocation.
    ///
    /// An explicit path must exist. Without one, the default location is used
    /// when present and built-in defaults otherwise.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load_from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.log_path.as_os_str().is_empty() {
            anyhow::bail!("log_path must be specified");
        }
        if self.log_max_bytes == 0 {
            anyhow::bail!("log_max_bytes must be greater than zero");
        }
        if !self.web_root.is_absolute() {
            anyhow::bail!("web_root must be an absolute path: {:?}", self.web_root);
        }
        if !self.vhost_dir.is_absolute() {
            anyhow::bail!("vhost_dir must be an absolute path: {:?}", self.vhost_dir);
        }
        if self.web_user.trim().is_empty() {
            anyhow::bail!("web_user must be specified");
        }
        self.probe_socket_addr()?;
        Ok(())
    }

    /// The probe address parsed as a socket address.
    pub fn probe_socket_addr(&self) -> Result<SocketAddr> {
        self.probe_addr
            .parse()
            .with_context(|| format!("Invalid probe_addr '{}'", self.probe_addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.log_max_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "web_root": "/srv/www", "upgrade_on_install": false }}"#).unwrap();

        let settings = Settings::load_from_file(file.path()).unwrap();
        assert_eq!(settings.web_root, PathBuf::from("/srv/www"));
        assert!(!settings.upgrade_on_install);
        assert_eq!(settings.web_user, "www-data");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "webroot": "/srv/www" }}"#).unwrap();
        assert!(Settings::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_relative_web_root_rejected() {
        let settings = Settings {
            web_root: PathBuf::from("www"),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_bad_probe_addr_rejected() {
        let settings = Settings {
            probe_addr: "not-an-address".to_string(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        assert!(Settings::resolve(Some(Path::new("/nonexistent/srvstack.json"))).is_err());
    }
}
