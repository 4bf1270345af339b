//! srvstack library
//!
//! Installs and administers a Debian web/database/mail/FTP server stack:
//! the component registry, the workflows that act on it, and the backends
//! that reach the host through apt, systemd, Apache and certbot.

pub mod cli;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod menu;
pub mod output;
pub mod registry;
pub mod sanity;
pub mod system;
pub mod workflow;

// Re-export main types for convenience
pub use cli::{Cli, Commands, StatusTarget, VhostCommands};
pub use config::Settings;
pub use context::{Backends, Context};
pub use error::{Result, SrvStackError};
pub use registry::{Component, Registry, ServiceBinding};
pub use system::{CertTool, InitSystem, PackageManager, ServiceAction, SiteFs, WebServer};
