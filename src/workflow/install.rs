//! Install workflow.
//!
//! 1. Refresh the package index; failure aborts the run
//! 2. Upgrade installed packages when the policy allows; failure is logged
//! 3. For every component, every package: install it unless already present
//! 4. Fixed post-install actions for the web server
//!
//! # Failure Policy
//!
//! Best effort: a package that fails to install is recorded as
//! [`InstallOutcome::Failed`] and the batch moves on. Only the index refresh
//! is fatal, since nothing else can succeed without it.

use std::fmt;

use tracing::{error, info, warn};

use crate::context::Context;
use crate::error::Result;
use crate::registry::WEB_SERVER_PACKAGE;

/// Apache module enabled once the web server is present.
pub const POST_INSTALL_MODULE: &str = "rewrite";

#[derive(Debug, Clone, Copy)]
pub struct InstallOptions {
    /// Run the package manager's upgrade step before installing.
    pub upgrade: bool,
}

/// Result of one package in an install run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    AlreadyPresent,
    Installed,
    Failed(String),
}

impl InstallOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyPresent => write!(f, "already present"),
            Self::Installed => write!(f, "installed"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    pub component: String,
    pub package: String,
    pub outcome: InstallOutcome,
}

/// One hard-coded post-install side effect and how it went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostInstallStep {
    pub action: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Whether the upgrade step ran and succeeded (`None` when skipped).
    pub upgraded: Option<bool>,
    pub packages: Vec<PackageReport>,
    pub post_install: Vec<PostInstallStep>,
}

impl InstallReport {
    pub fn count(&self, wanted: fn(&InstallOutcome) -> bool) -> usize {
        self.packages.iter().filter(|p| wanted(&p.outcome)).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &PackageReport> {
        self.packages.iter().filter(|p| p.outcome.is_failed())
    }

    /// True when packages were attempted and every one of them failed.
    pub fn all_failed(&self) -> bool {
        !self.packages.is_empty() && self.packages.iter().all(|p| p.outcome.is_failed())
    }

    fn outcome_of(&self, package: &str) -> Option<&InstallOutcome> {
        self.packages
            .iter()
            .find(|p| p.package == package)
            .map(|p| &p.outcome)
    }
}

/// Install every registry package that is not already present.
pub fn install_all(ctx: &Context, options: &InstallOptions) -> Result<InstallReport> {
    let packages = ctx.backends.packages.as_ref();
    let mut report = InstallReport::default();

    info!("Refreshing package index");
    packages.refresh_index()?;

    if options.upgrade {
        info!("Applying pending upgrades");
        match packages.upgrade() {
            Ok(()) => report.upgraded = Some(true),
            Err(e) => {
                warn!("Upgrade failed, continuing with installation: {}", e);
                report.upgraded = Some(false);
            }
        }
    }

    for component in ctx.registry.components() {
        info!("Component: {}", component.name);
        for package in &component.packages {
            let outcome = install_one(ctx, package);
            report.packages.push(PackageReport {
                component: component.name.clone(),
                package: package.clone(),
                outcome,
            });
        }
    }

    report.post_install = post_install(ctx, &report);

    let failed = report.count(InstallOutcome::is_failed);
    info!(
        "Install run finished: {} installed, {} already present, {} failed",
        report.count(|o| *o == InstallOutcome::Installed),
        report.count(|o| *o == InstallOutcome::AlreadyPresent),
        failed
    );
    Ok(report)
}

fn install_one(ctx: &Context, package: &str) -> InstallOutcome {
    let packages = ctx.backends.packages.as_ref();

    match packages.is_installed(package) {
        Ok(true) => {
            info!("{} already installed", package);
            return InstallOutcome::AlreadyPresent;
        }
        Ok(false) => {}
        Err(e) => {
            error!("Could not query {}: {}", package, e);
            return InstallOutcome::Failed(e.to_string());
        }
    }

    info!("Installing {}", package);
    match packages.install(package) {
        Ok(()) => InstallOutcome::Installed,
        Err(e) => {
            error!("Failed to install {}: {}", package, e);
            InstallOutcome::Failed(e.to_string())
        }
    }
}

/// Enable the rewrite module and reload Apache when Apache is present.
fn post_install(ctx: &Context, report: &InstallReport) -> Vec<PostInstallStep> {
    let web_ready = matches!(
        report.outcome_of(WEB_SERVER_PACKAGE),
        Some(InstallOutcome::Installed | InstallOutcome::AlreadyPresent)
    );
    if !web_ready {
        return Vec::new();
    }

    let web = ctx.backends.web.as_ref();
    vec![
        step(format!("enable module {}", POST_INSTALL_MODULE), || {
            web.enable_module(POST_INSTALL_MODULE)
        }),
        step("reload web server".to_string(), || web.reload()),
    ]
}

fn step(action: String, run: impl FnOnce() -> Result<()>) -> PostInstallStep {
    let error = run().err().map(|e| {
        error!("Post-install step '{}' failed: {}", action, e);
        e.to_string()
    });
    PostInstallStep { action, error }
}
