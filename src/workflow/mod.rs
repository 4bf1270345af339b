//! Workflows: the operations srvstack exposes.
//!
//! Each workflow takes a [`Context`](crate::context::Context), drives the
//! backends in a fixed order, and returns a structured report. Rendering for
//! the terminal happens in [`crate::output`].
//!
//! # Modules
//!
//! - `install`: refresh, upgrade, per-package install, post-install actions
//! - `status`: read-only package and service state
//! - `service`: start/stop/restart/enable/disable a unit
//! - `scaffold`: new site directories and Apache virtual hosts
//! - `ssl`: certificate provisioning

pub mod install;
pub mod scaffold;
pub mod service;
pub mod ssl;
pub mod status;

pub use install::{install_all, InstallOptions, InstallOutcome, InstallReport};
pub use scaffold::{add_virtual_host, enable_virtual_host, new_site, SiteReport, VhostReport};
pub use service::service_action;
pub use ssl::{setup_ssl, SslReport};
pub use status::{status_packages, status_services, PackageStatus, ServiceState, ServiceStatus};
