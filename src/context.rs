//! Explicit runtime context handed to every workflow.
//!
//! Built once at startup from the resolved settings, the validated registry
//! and the CLI flags. Nothing in srvstack reads process-wide globals.

use crate::config::Settings;
use crate::registry::Registry;
use crate::system::apache::Apache;
use crate::system::apt::Apt;
use crate::system::certbot::Certbot;
use crate::system::fs::LocalFs;
use crate::system::{CertTool, InitSystem, PackageManager, Shell, SiteFs, WebServer};
use crate::system::systemd::Systemd;

/// The external collaborators a workflow may touch.
pub struct Backends {
    pub packages: Box<dyn PackageManager>,
    pub init: Box<dyn InitSystem>,
    pub web: Box<dyn WebServer>,
    pub certs: Box<dyn CertTool>,
    pub fs: Box<dyn SiteFs>,
}

impl Backends {
    /// Real backends sharing one shell.
    pub fn over(shell: Shell) -> Self {
        let dry_run = shell.is_dry_run();
        Self {
            packages: Box::new(Apt::new(shell.clone())),
            init: Box::new(Systemd::new(shell.clone())),
            web: Box::new(Apache::new(shell.clone())),
            certs: Box::new(Certbot::new(shell)),
            fs: Box::new(LocalFs::new(dry_run)),
        }
    }
}

pub struct Context {
    pub settings: Settings,
    pub registry: Registry,
    pub backends: Backends,
    pub dry_run: bool,
}

impl Context {
    pub fn new(settings: Settings, registry: Registry, backends: Backends, dry_run: bool) -> Self {
        Self {
            settings,
            registry,
            backends,
            dry_run,
        }
    }

    /// Context driving the real host through child processes.
    pub fn system(settings: Settings, registry: Registry, dry_run: bool) -> Self {
        let backends = Backends::over(Shell::system(dry_run));
        Self::new(settings, registry, backends, dry_run)
    }
}
