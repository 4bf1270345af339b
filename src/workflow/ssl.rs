//! TLS certificate provisioning through the external certificate tool.

use tracing::info;

use crate::context::Context;
use crate::error::{Result, SrvStackError};
use crate::registry::CERT_TOOL_PACKAGE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SslReport {
    pub domain: String,
    pub email: String,
}

/// Contact address registered with the CA for `domain`.
pub fn admin_email(domain: &str) -> String {
    format!("admin@{}", domain)
}

/// Request a certificate for `domain` and install it into the web server.
pub fn setup_ssl(ctx: &Context, domain: &str) -> Result<SslReport> {
    if domain.trim().is_empty() {
        return Err(SrvStackError::validation("domain must not be empty"));
    }
    if !ctx.backends.packages.is_installed(CERT_TOOL_PACKAGE)? {
        return Err(SrvStackError::precondition(format!(
            "{} is not installed; run `srvstack install` first",
            CERT_TOOL_PACKAGE
        )));
    }

    let email = admin_email(domain);
    info!("Requesting certificate for {} (contact {})", domain, email);
    ctx.backends.certs.issue(domain, &email)?;

    Ok(SslReport {
        domain: domain.to_string(),
        email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_email() {
        assert_eq!(admin_email("example.test"), "admin@example.test");
    }
}
