//! Service control via `systemctl`.

use super::shell::{Cmd, Shell};
use super::{InitSystem, ServiceAction};
use crate::error::Result;

/// Unit-type suffixes systemd accepts in place of a bare service name.
const UNIT_SUFFIXES: &[&str] = &[
    ".service", ".socket", ".timer", ".target", ".mount", ".path",
];

/// Full unit name: bare names are services, explicit unit names pass through.
fn unit_name(service: &str) -> String {
    if UNIT_SUFFIXES.iter().any(|suffix| service.ends_with(suffix)) {
        service.to_string()
    } else {
        format!("{}.service", service)
    }
}

#[derive(Debug, Clone)]
pub struct Systemd {
    shell: Shell,
}

impl Systemd {
    pub fn new(shell: Shell) -> Self {
        Self { shell }
    }

    fn systemctl<'a>(args: impl IntoIterator<Item = &'a str>) -> Cmd {
        Cmd::new("systemctl").args(args)
    }
}

impl InitSystem for Systemd {
    fn unit_exists(&self, service: &str) -> Result<bool> {
        let unit = unit_name(service);
        let output = self.shell.query(&Self::systemctl([
            "list-unit-files",
            "--no-legend",
            "--no-pager",
            unit.as_str(),
        ]))?;
        Ok(output
            .stdout
            .lines()
            .any(|line| line.split_whitespace().next() == Some(unit.as_str())))
    }

    fn is_active(&self, service: &str) -> Result<bool> {
        let output = self
            .shell
            .query(&Self::systemctl(["is-active", "--quiet", service]))?;
        Ok(output.success)
    }

    fn is_enabled(&self, service: &str) -> Result<bool> {
        let output = self
            .shell
            .query(&Self::systemctl(["is-enabled", "--quiet", service]))?;
        Ok(output.success)
    }

    fn apply(&self, action: ServiceAction, service: &str) -> Result<()> {
        let verb = action.to_string();
        self.shell
            .mutate(&Self::systemctl([verb.as_str(), service]))?;
        Ok(())
    }
}
