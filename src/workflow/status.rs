//! Read-only status reports. Neither function issues a mutating call.

use strum::Display;

use crate::context::Context;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageStatus {
    pub component: String,
    pub package: String,
    pub present: bool,
}

/// Runtime state of a bound service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ServiceState {
    #[strum(serialize = "not installed")]
    NotInstalled,
    #[strum(serialize = "stopped")]
    Stopped,
    #[strum(serialize = "running")]
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    pub package: String,
    pub service: String,
    pub state: ServiceState,
    /// Starts at boot. Always false for `NotInstalled`.
    pub enabled: bool,
}

/// Present/missing for every registry package, in installation order.
pub fn status_packages(ctx: &Context) -> Result<Vec<PackageStatus>> {
    ctx.registry
        .packages()
        .map(|(component, package)| {
            Ok(PackageStatus {
                component: component.to_string(),
                package: package.to_string(),
                present: ctx.backends.packages.is_installed(package)?,
            })
        })
        .collect()
}

/// State of every bound service, in binding order.
pub fn status_services(ctx: &Context) -> Result<Vec<ServiceStatus>> {
    let init = ctx.backends.init.as_ref();

    ctx.registry
        .bindings()
        .iter()
        .map(|binding| {
            let service = binding.service.as_str();
            let (state, enabled) = if !init.unit_exists(service)? {
                (ServiceState::NotInstalled, false)
            } else {
                let state = if init.is_active(service)? {
                    ServiceState::Running
                } else {
                    ServiceState::Stopped
                };
                (state, init.is_enabled(service)?)
            };
            Ok(ServiceStatus {
                package: binding.package.clone(),
                service: binding.service.clone(),
                state,
                enabled,
            })
        })
        .collect()
}
