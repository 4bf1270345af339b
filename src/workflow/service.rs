//! Service control.
//!
//! The action is handed to the init system verbatim. No retry, no waiting for
//! the unit to settle; the init system's exit status is the only check.

use tracing::info;

use crate::context::Context;
use crate::error::{Result, SrvStackError};
use crate::system::ServiceAction;

/// Apply `action` to `service`, refusing units the init system does not know.
pub fn service_action(ctx: &Context, action: ServiceAction, service: &str) -> Result<()> {
    if service.trim().is_empty() {
        return Err(SrvStackError::validation("service name must not be empty"));
    }

    let init = ctx.backends.init.as_ref();
    if !init.unit_exists(service)? {
        return Err(SrvStackError::not_found(format!("service '{}'", service)));
    }

    info!("{} {}", action, service);
    init.apply(action, service)
}
