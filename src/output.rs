//! Terminal rendering for command results.
//!
//! Workflows return structured reports; this module is the only place that
//! turns them into colored text. `render_*` functions build plain strings
//! with ANSI styling so they can be tested, and the small `print` helpers
//! write to stdout/stderr.

use std::fmt::{self, Write as _};

use crossterm::style::{StyledContent, Stylize};

use crate::registry::Registry;
use crate::workflow::install::{InstallOutcome, InstallReport};
use crate::workflow::status::{PackageStatus, ServiceState, ServiceStatus};

// =============================================================================
// One-line messages
// =============================================================================

pub fn success(msg: impl fmt::Display) {
    println!("{} {}", "✓".green().bold(), msg);
}

pub fn failure(msg: impl fmt::Display) {
    eprintln!("{} {}", "✗".red().bold(), msg.to_string().red());
}

pub fn heading(msg: impl fmt::Display) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Echo a step that dry-run mode is skipping.
pub fn dry_run(action: &dyn fmt::Display) {
    println!("{} {}", "[dry-run]".yellow(), action);
}

// =============================================================================
// Tables
// =============================================================================

fn outcome_cell(outcome: &InstallOutcome) -> StyledContent<String> {
    match outcome {
        InstallOutcome::AlreadyPresent => "present".to_string().dark_grey(),
        InstallOutcome::Installed => "installed".to_string().green(),
        InstallOutcome::Failed(_) => "FAILED".to_string().red().bold(),
    }
}

/// Padded before styling so escape codes don't skew the columns.
fn state_cell(state: ServiceState, width: usize) -> StyledContent<String> {
    let text = format!("{:<width$}", state.to_string(), width = width);
    match state {
        ServiceState::Running => text.green(),
        ServiceState::Stopped => text.yellow(),
        ServiceState::NotInstalled => text.dark_grey(),
    }
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values.map(str::len).chain([header.len()]).max().unwrap_or(0)
}

pub fn render_install_report(report: &InstallReport) -> String {
    let mut out = String::new();
    let width = column_width(report.packages.iter().map(|p| p.package.as_str()), "PACKAGE");

    match report.upgraded {
        Some(true) => {
            let _ = writeln!(out, "Upgrades applied");
        }
        Some(false) => {
            let _ = writeln!(out, "{}", "Upgrade failed (see log)".yellow());
        }
        None => {}
    }

    let mut current = "";
    for package in &report.packages {
        if package.component != current {
            current = package.component.as_str();
            let _ = writeln!(out, "{}", current.bold());
        }
        let _ = writeln!(
            out,
            "  {:<width$}  {}",
            package.package,
            outcome_cell(&package.outcome),
            width = width
        );
    }

    for step in &report.post_install {
        match &step.error {
            None => {
                let _ = writeln!(out, "{} {}", "post-install:".bold(), step.action);
            }
            Some(e) => {
                let _ = writeln!(
                    out,
                    "{} {} {}",
                    "post-install:".bold(),
                    step.action,
                    format!("failed: {}", e).red()
                );
            }
        }
    }

    let failed = report.count(InstallOutcome::is_failed);
    let _ = writeln!(
        out,
        "{} installed, {} already present, {} failed",
        report.count(|o| *o == InstallOutcome::Installed),
        report.count(|o| *o == InstallOutcome::AlreadyPresent),
        failed
    );
    out
}

pub fn render_package_status(statuses: &[PackageStatus]) -> String {
    let mut out = String::new();
    let width = column_width(statuses.iter().map(|s| s.package.as_str()), "PACKAGE");
    let _ = writeln!(out, "{:<width$}  {}", "PACKAGE", "STATUS", width = width);
    for status in statuses {
        let cell = if status.present {
            "present".green()
        } else {
            "missing".red()
        };
        let _ = writeln!(out, "{:<width$}  {}", status.package, cell, width = width);
    }
    out
}

pub fn render_service_status(statuses: &[ServiceStatus]) -> String {
    let mut out = String::new();
    let width = column_width(statuses.iter().map(|s| s.service.as_str()), "SERVICE");
    let _ = writeln!(
        out,
        "{:<width$}  {:<13}  {}",
        "SERVICE",
        "STATE",
        "BOOT",
        width = width
    );
    for status in statuses {
        let boot = if status.enabled { "enabled" } else { "disabled" };
        let _ = writeln!(
            out,
            "{:<width$}  {}  {}",
            status.service,
            state_cell(status.state, 13),
            boot,
            width = width
        );
    }
    out
}

pub fn render_components(registry: &Registry) -> String {
    let mut out = String::new();
    for component in registry.components() {
        let _ = writeln!(out, "{}", component.name.as_str().bold());
        for package in &component.packages {
            match registry.service_for(package) {
                Some(service) => {
                    let _ = writeln!(out, "  {} (service: {})", package, service);
                }
                None => {
                    let _ = writeln!(out, "  {}", package);
                }
            }
        }
    }
    out
}
