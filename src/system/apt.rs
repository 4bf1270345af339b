//! Debian package management via `apt-get` and `dpkg-query`.

use tracing::debug;

use super::shell::{Cmd, Shell};
use super::PackageManager;
use crate::error::Result;

/// `dpkg-query` status string for a fully installed package.
const INSTALLED_STATUS: &str = "install ok installed";

#[derive(Debug, Clone)]
pub struct Apt {
    shell: Shell,
}

impl Apt {
    pub fn new(shell: Shell) -> Self {
        Self { shell }
    }

    fn apt_get<'a>(args: impl IntoIterator<Item = &'a str>) -> Cmd {
        Cmd::new("apt-get")
            .args(args)
            .env("DEBIAN_FRONTEND", "noninteractive")
    }
}

impl PackageManager for Apt {
    fn refresh_index(&self) -> Result<()> {
        self.shell.mutate(&Self::apt_get(["update"]))?;
        Ok(())
    }

    fn upgrade(&self) -> Result<()> {
        self.shell.mutate(&Self::apt_get(["upgrade", "-y"]))?;
        Ok(())
    }

    fn is_installed(&self, package: &str) -> Result<bool> {
        let cmd = Cmd::new("dpkg-query").args(["-W", "-f=${Status}", package]);
        let output = self.shell.query(&cmd)?;
        // dpkg-query exits 1 for packages it has never heard of
        let installed = output.success && output.stdout.contains(INSTALLED_STATUS);
        debug!("{} installed={}", package, installed);
        Ok(installed)
    }

    fn install(&self, package: &str) -> Result<()> {
        self.shell.mutate(&Self::apt_get(["install", "-y", package]))?;
        Ok(())
    }
}
