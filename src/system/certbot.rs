//! Certificate issuance via `certbot`. Renewal is left to certbot's own timer.

use super::shell::{Cmd, Shell};
use super::CertTool;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct Certbot {
    shell: Shell,
}

impl Certbot {
    pub fn new(shell: Shell) -> Self {
        Self { shell }
    }
}

impl CertTool for Certbot {
    fn issue(&self, domain: &str, email: &str) -> Result<()> {
        let cmd = Cmd::new("certbot").args([
            "--apache",
            "--non-interactive",
            "--agree-tos",
            "-m",
            email,
            "-d",
            domain,
        ]);
        self.shell.mutate(&cmd)?;
        Ok(())
    }
}
