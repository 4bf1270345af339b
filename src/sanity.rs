//! Pre-flight checks run before any command touches the host
//!
//! - Required host tools are on `PATH`
//! - Running with root privileges (EUID 0)
//! - Network reachable (one TCP connect with a fixed deadline)
//!
//! A failed check aborts the invocation before any mutating work starts.

use std::env;
use std::net::{SocketAddr, TcpStream};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{Result, SrvStackError};

/// Deadline for the reachability probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Env var that skips both checks (development only)
pub const SKIP_PREFLIGHT_ENV: &str = "SRVSTACK_SKIP_PREFLIGHT";

/// Host tools every command relies on
pub const REQUIRED_BINARIES: &[&str] = &[
    "apt-get",    // Package installs (apt)
    "dpkg-query", // Package presence (dpkg)
    "systemctl",  // Service control (systemd)
];

/// Result of environment verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanityCheckResult {
    pub missing_binaries: Vec<String>,
    pub is_root: bool,
    pub online: bool,
}

impl SanityCheckResult {
    /// Returns true if all checks passed
    pub fn is_ok(&self) -> bool {
        self.missing_binaries.is_empty() && self.is_root && self.online
    }

    /// Human-readable description of every failed check.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.missing_binaries.is_empty() {
            problems.push(format!(
                "missing required tools: {}",
                self.missing_binaries.join(", ")
            ));
        }
        if !self.is_root {
            problems.push("root privileges required (run with sudo or as root)".to_string());
        }
        if !self.online {
            problems.push("network unreachable (package index cannot be refreshed)".to_string());
        }
        problems
    }
}

/// Whether `path` is a file with an execute bit set
fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Check if a binary is available in PATH
pub fn binary_exists(name: &str) -> bool {
    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| is_executable(&dir.join(name))))
        .unwrap_or(false)
}

/// The entries of `tools` that are not on `PATH`, in order
pub fn missing_binaries(tools: &[&str]) -> Vec<String> {
    tools
        .iter()
        .filter(|tool| !binary_exists(tool))
        .map(|tool| (*tool).to_string())
        .collect()
}

/// Check if running as root (EUID 0)
fn is_running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Single TCP connect to `addr`, bounded by [`PROBE_TIMEOUT`].
pub fn probe(addr: &SocketAddr) -> bool {
    match TcpStream::connect_timeout(addr, PROBE_TIMEOUT) {
        Ok(_stream) => {
            debug!("Network connectivity confirmed (TCP to {})", addr);
            true
        }
        Err(e) => {
            warn!("Network connectivity check to {} failed: {}", addr, e);
            false
        }
    }
}

/// Perform all sanity checks and return the result
///
/// `extra_tools` are checked on top of [`REQUIRED_BINARIES`].
pub fn verify_environment(settings: &Settings, extra_tools: &[&str]) -> Result<SanityCheckResult> {
    let addr = settings
        .probe_socket_addr()
        .map_err(|e| SrvStackError::config(e.to_string()))?;

    let mut missing = missing_binaries(REQUIRED_BINARIES);
    missing.extend(missing_binaries(extra_tools));

    let is_root = is_running_as_root();
    let online = probe(&addr);

    Ok(SanityCheckResult {
        missing_binaries: missing,
        is_root,
        online,
    })
}

/// Skip checks (for development/testing)
/// Set SRVSTACK_SKIP_PREFLIGHT=1 to skip
pub fn should_skip_preflight() -> bool {
    std::env::var(SKIP_PREFLIGHT_ENV)
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Main entry point: fail with a precondition error if the host is unfit.
pub fn run_preflight_checks(settings: &Settings, extra_tools: &[&str]) -> Result<()> {
    if should_skip_preflight() {
        warn!("Pre-flight checks skipped ({}=1)", SKIP_PREFLIGHT_ENV);
        return Ok(());
    }

    debug!("Running pre-flight sanity checks...");
    let result = verify_environment(settings, extra_tools)?;

    if !result.is_ok() {
        return Err(SrvStackError::precondition(result.problems().join("; ")));
    }

    info!("Pre-flight checks passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_sanity_result_is_ok() {
        let ok = SanityCheckResult {
            missing_binaries: Vec::new(),
            is_root: true,
            online: true,
        };
        assert!(ok.is_ok());
        assert!(ok.problems().is_empty());

        let not_root = SanityCheckResult {
            missing_binaries: Vec::new(),
            is_root: false,
            online: true,
        };
        assert!(!not_root.is_ok());
        assert_eq!(not_root.problems().len(), 1);

        let offline = SanityCheckResult {
            missing_binaries: Vec::new(),
            is_root: true,
            online: false,
        };
        assert!(!offline.is_ok());
        assert!(offline.problems()[0].contains("network"));
    }

    #[test]
    fn test_missing_binaries_reported() {
        let result = SanityCheckResult {
            missing_binaries: vec!["dpkg-query".into(), "systemctl".into()],
            is_root: true,
            online: true,
        };
        assert!(!result.is_ok());
        assert_eq!(
            result.problems(),
            ["missing required tools: dpkg-query, systemctl"]
        );
    }

    #[test]
    fn test_missing_binaries_lookup() {
        assert_eq!(
            missing_binaries(&["sh", "srvstack-no-such-tool"]),
            ["srvstack-no-such-tool"]
        );
        assert!(binary_exists("sh"));
    }

    #[test]
    fn test_probe_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        assert!(probe(&addr));
    }

    #[test]
    fn test_probe_closed_port() {
        // Bind then drop to get a port that is very likely closed
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        assert!(!probe(&addr));
    }
}
