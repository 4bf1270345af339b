//! Apache module/site activation via the Debian `a2en*` helpers.

use super::shell::{Cmd, Shell};
use super::WebServer;
use crate::error::Result;

/// systemd unit of the web server.
pub const APACHE_UNIT: &str = "apache2";

#[derive(Debug, Clone)]
pub struct Apache {
    shell: Shell,
}

impl Apache {
    pub fn new(shell: Shell) -> Self {
        Self { shell }
    }
}

impl WebServer for Apache {
    fn enable_module(&self, module: &str) -> Result<()> {
        self.shell.mutate(&Cmd::new("a2enmod").args(["-q", module]))?;
        Ok(())
    }

    fn enable_site(&self, domain: &str) -> Result<()> {
        self.shell.mutate(&Cmd::new("a2ensite").args(["-q", domain]))?;
        Ok(())
    }

    fn reload(&self) -> Result<()> {
        self.shell
            .mutate(&Cmd::new("systemctl").args(["reload", APACHE_UNIT]))?;
        Ok(())
    }
}
