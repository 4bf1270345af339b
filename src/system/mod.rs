//! Narrow interfaces to the external programs srvstack drives.
//!
//! Every workflow talks to the host only through these traits. The real
//! implementations shell out through [`shell::Shell`]; [`fake`] holds
//! in-memory versions so workflows can be exercised without root or a live
//! system.
//!
//! | Trait            | Real impl            | Program            |
//! |------------------|----------------------|--------------------|
//! | `PackageManager` | [`apt::Apt`]         | apt-get, dpkg-query|
//! | `InitSystem`     | [`systemd::Systemd`] | systemctl          |
//! | `WebServer`      | [`apache::Apache`]   | a2enmod, a2ensite  |
//! | `CertTool`       | [`certbot::Certbot`] | certbot            |
//! | `SiteFs`         | [`fs::LocalFs`]      | local filesystem   |

pub mod apache;
pub mod apt;
pub mod certbot;
#[doc(hidden)]
pub mod fake;
pub mod fs;
pub mod shell;
pub mod systemd;

use std::path::Path;

use strum::{Display, EnumIter, EnumString};

use crate::error::Result;

pub use shell::{Cmd, CmdOutput, CommandRunner, ProcessRunner, Shell};

/// Service control verbs passed verbatim to the init system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
    Enable,
    Disable,
}

pub trait PackageManager {
    /// Refresh the package index (network-dependent).
    fn refresh_index(&self) -> Result<()>;

    /// Apply pending upgrades to installed packages.
    fn upgrade(&self) -> Result<()>;

    /// Whether `package` is currently installed. Read-only.
    fn is_installed(&self, package: &str) -> Result<bool>;

    fn install(&self, package: &str) -> Result<()>;
}

pub trait InitSystem {
    /// Whether the init system knows a unit called `service`. Read-only.
    fn unit_exists(&self, service: &str) -> Result<bool>;

    /// Read-only.
    fn is_active(&self, service: &str) -> Result<bool>;

    /// Whether the unit starts at boot. Read-only.
    fn is_enabled(&self, service: &str) -> Result<bool>;

    fn apply(&self, action: ServiceAction, service: &str) -> Result<()>;
}

pub trait WebServer {
    fn enable_module(&self, module: &str) -> Result<()>;

    /// Activate the site definition for `domain`. Idempotent.
    fn enable_site(&self, domain: &str) -> Result<()>;

    fn reload(&self) -> Result<()>;
}

pub trait CertTool {
    /// Obtain and install a certificate for `domain` non-interactively.
    fn issue(&self, domain: &str, email: &str) -> Result<()>;
}

pub trait SiteFs {
    fn exists(&self, path: &Path) -> bool;

    fn create_dir(&self, path: &Path) -> Result<()>;

    fn write_file(&self, path: &Path, contents: &str) -> Result<()>;

    /// Mark a written script runnable (mode 0755).
    fn make_executable(&self, path: &Path) -> Result<()>;

    /// Hand `path` and everything below it to `user` and its primary group.
    fn chown_recursive(&self, path: &Path, user: &str) -> Result<()>;
}
