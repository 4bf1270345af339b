//! Error handling module for srvstack
//!
//! Provides the error taxonomy shared by every workflow. Variants map onto the
//! operator-facing failure classes: precondition, conflict, not-found, and
//! failures of an external command.

use thiserror::Error;

/// Main error type for srvstack
#[derive(Error, Debug)]
pub enum SrvStackError {
    /// IO errors (file writes, directory creation, log file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings errors (loading, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Environment is not fit to run (not root, offline, missing tool)
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Target of a create operation already exists
    #[error("{0} already exists")]
    Conflict(String),

    /// Unknown service unit or missing file
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid operator input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Registry table rejected at load time
    #[error("Registry error: {0}")]
    Registry(String),

    /// An external command exited unsuccessfully
    #[error("Command `{command}` failed: {message}")]
    Command { command: String, message: String },
}

/// Result type alias for srvstack operations
pub type Result<T> = std::result::Result<T, SrvStackError>;

impl SrvStackError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn conflict(what: impl Into<String>) -> Self {
        Self::Conflict(what.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this failure.
    ///
    /// Every error that reaches the top level is fatal for the invocation, so
    /// all classes exit 1. Per-package install failures never become an error.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SrvStackError::conflict("site 'blog'");
        assert_eq!(err.to_string(), "site 'blog' already exists");

        let err = SrvStackError::not_found("service 'nginx'");
        assert_eq!(err.to_string(), "service 'nginx' not found");

        let err = SrvStackError::precondition("root privileges required");
        assert_eq!(err.to_string(), "Precondition failed: root privileges required");
    }

    #[test]
    fn test_command_error_display() {
        let err = SrvStackError::command("apt-get update", "exit code 100");
        assert_eq!(err.to_string(), "Command `apt-get update` failed: exit code 100");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SrvStackError = io_err.into();
        assert!(matches!(err, SrvStackError::Io(_)));
        assert_eq!(err.exit_code(), 1);
    }
}
