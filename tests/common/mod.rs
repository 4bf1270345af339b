//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use srvstack::config::Settings;
use srvstack::context::{Backends, Context};
use srvstack::registry::Registry;
use srvstack::system::fake::{FakeCertTool, FakeFs, FakeInit, FakePackages, FakeWebServer};

/// A context over in-memory fakes, plus handles to inspect them.
pub struct Harness {
    pub ctx: Context,
    pub packages: FakePackages,
    pub init: FakeInit,
    pub web: FakeWebServer,
    pub certs: FakeCertTool,
    pub fs: FakeFs,
}

pub fn settings() -> Settings {
    Settings {
        web_root: PathBuf::from("/var/www"),
        vhost_dir: PathBuf::from("/etc/apache2/sites-available"),
        web_user: "www-data".to_string(),
        ..Settings::default()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::with_packages(FakePackages::new())
    }

    pub fn with_packages(packages: FakePackages) -> Self {
        Self::with_registry(packages, Registry::builtin().unwrap())
    }

    pub fn with_registry(packages: FakePackages, registry: Registry) -> Self {
        let init = FakeInit::new();
        let web = FakeWebServer::new();
        let certs = FakeCertTool::new();
        let fs = FakeFs::new();
        let backends = Backends {
            packages: Box::new(packages.clone()),
            init: Box::new(init.clone()),
            web: Box::new(web.clone()),
            certs: Box::new(certs.clone()),
            fs: Box::new(fs.clone()),
        };
        Self {
            ctx: Context::new(settings(), registry, backends, false),
            packages,
            init,
            web,
            certs,
            fs,
        }
    }

    /// Every registry package, in registry order.
    pub fn all_packages(&self) -> Vec<String> {
        self.ctx
            .registry
            .packages()
            .map(|(_, package)| package.to_string())
            .collect()
    }
}
