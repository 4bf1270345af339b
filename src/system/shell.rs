//! External command execution.
//!
//! All subprocesses go through a [`Shell`], which splits commands into two
//! kinds:
//!
//! - **queries** (`dpkg-query`, `systemctl is-active`, ...) always run, even
//!   in dry-run mode, so the preview reflects the real host;
//! - **mutations** (`apt-get install`, `systemctl start`, ...) are logged and
//!   then either executed or, in dry-run mode, printed and skipped.
//!
//! The process itself is spawned by a [`CommandRunner`]. Tests swap in
//! [`crate::system::fake::ScriptedRunner`] to record what would have run.

use std::fmt;
use std::process::{Command, Stdio};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Result, SrvStackError};
use crate::logging::single_line;
use crate::output;

/// A fully specified external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmd {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables (e.g. `DEBIAN_FRONTEND=noninteractive`)
    pub envs: Vec<(String, String)>,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Program followed by its arguments, without the environment.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.envs {
            write!(f, "{}={} ", key, value)?;
        }
        write!(f, "{}", self.argv().join(" "))
    }
}

/// Output from a command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmdOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code (None if terminated by signal or skipped).
    pub exit_code: Option<i32>,
    pub success: bool,
    /// The command was skipped because dry-run mode is active.
    pub dry_run: bool,
}

impl CmdOutput {
    /// Successful exit with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            exit_code: Some(0),
            success: true,
            ..Self::default()
        }
    }

    /// Unsuccessful exit with the given code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stderr: stderr.into(),
            exit_code: Some(code),
            success: false,
            ..Self::default()
        }
    }

    fn skipped() -> Self {
        Self {
            success: true,
            dry_run: true,
            ..Self::default()
        }
    }

    /// Turn an unsuccessful exit into a [`SrvStackError::Command`].
    pub fn ensure_success(&self, cmd: &Cmd) -> Result<()> {
        if self.success {
            return Ok(());
        }
        let stderr = single_line(&self.stderr);
        let message = if stderr.is_empty() {
            match self.exit_code {
                Some(code) => format!("exit code {}", code),
                None => "terminated by signal".to_string(),
            }
        } else {
            stderr
        };
        Err(SrvStackError::command(cmd.to_string(), message))
    }
}

/// Spawns a command and waits for it.
pub trait CommandRunner {
    fn run(&self, cmd: &Cmd) -> std::io::Result<CmdOutput>;
}

/// Runs commands as real child processes with stdin closed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, cmd: &Cmd) -> std::io::Result<CmdOutput> {
        let output = Command::new(&cmd.program)
            .args(&cmd.args)
            .envs(cmd.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        Ok(CmdOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
            success: output.status.success(),
            dry_run: false,
        })
    }
}

/// Log a state-changing step and report whether it should actually happen.
///
/// Real runs log `run: <action>`; dry runs log `would run: <action>` and echo
/// the action on the terminal. Both paths log the same action text so the two
/// logs line up entry for entry.
pub fn announce(dry_run: bool, action: &dyn fmt::Display) -> bool {
    if dry_run {
        info!("would run: {}", action);
        output::dry_run(action);
        false
    } else {
        info!("run: {}", action);
        true
    }
}

/// Dry-run aware front end over a [`CommandRunner`].
#[derive(Clone)]
pub struct Shell {
    runner: Arc<dyn CommandRunner>,
    dry_run: bool,
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shell").field("dry_run", &self.dry_run).finish()
    }
}

impl Shell {
    pub fn new(runner: Arc<dyn CommandRunner>, dry_run: bool) -> Self {
        Self { runner, dry_run }
    }

    /// Shell over real child processes.
    pub fn system(dry_run: bool) -> Self {
        Self::new(Arc::new(ProcessRunner), dry_run)
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run a read-only command. Runs in dry-run mode too; the exit status is
    /// returned to the caller rather than treated as an error.
    pub fn query(&self, cmd: &Cmd) -> Result<CmdOutput> {
        debug!("query: {}", cmd);
        self.runner
            .run(cmd)
            .map_err(|e| SrvStackError::command(cmd.to_string(), e.to_string()))
    }

    /// Run a state-changing command, failing on a non-zero exit.
    pub fn mutate(&self, cmd: &Cmd) -> Result<CmdOutput> {
        if !announce(self.dry_run, cmd) {
            return Ok(CmdOutput::skipped());
        }

        let output = self
            .runner
            .run(cmd)
            .map_err(|e| SrvStackError::command(cmd.to_string(), e.to_string()))?;
        output.ensure_success(cmd)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::fake::ScriptedRunner;

    #[test]
    fn test_cmd_display_includes_env() {
        let cmd = Cmd::new("apt-get")
            .args(["install", "-y", "git"])
            .env("DEBIAN_FRONTEND", "noninteractive");
        assert_eq!(
            cmd.to_string(),
            "DEBIAN_FRONTEND=noninteractive apt-get install -y git"
        );
        assert_eq!(cmd.argv(), ["apt-get", "install", "-y", "git"]);
    }

    #[test]
    fn test_ensure_success_prefers_stderr() {
        let cmd = Cmd::new("false");
        let err = CmdOutput::failed(1, "boom\n").ensure_success(&cmd).unwrap_err();
        assert_eq!(err.to_string(), "Command `false` failed: boom");

        let err = CmdOutput::failed(3, "").ensure_success(&cmd).unwrap_err();
        assert_eq!(err.to_string(), "Command `false` failed: exit code 3");
    }

    #[test]
    fn test_ensure_success_folds_multi_line_stderr() {
        let cmd = Cmd::new("apt-get").args(["install", "-y", "git"]);
        let stderr = "E: Unable to locate package git\nE: Couldn't find any package by glob 'git'\n";
        let err = CmdOutput::failed(100, stderr).ensure_success(&cmd).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Command `apt-get install -y git` failed: E: Unable to locate package git; \
             E: Couldn't find any package by glob 'git'"
        );
    }

    #[test]
    fn test_mutate_skips_runner_in_dry_run() {
        let runner = ScriptedRunner::new();
        let shell = Shell::new(Arc::new(runner.clone()), true);

        let output = shell.mutate(&Cmd::new("systemctl").args(["start", "apache2"])).unwrap();
        assert!(output.dry_run);
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn test_query_runs_in_dry_run() {
        let runner = ScriptedRunner::new();
        let shell = Shell::new(Arc::new(runner.clone()), true);

        shell.query(&Cmd::new("systemctl").args(["is-active", "apache2"])).unwrap();
        assert_eq!(runner.commands(), ["systemctl is-active apache2"]);
    }

    #[test]
    fn test_mutate_reports_failure() {
        let runner = ScriptedRunner::new();
        runner.respond(&["apt-get", "install"], CmdOutput::failed(100, "E: Unable to locate package"));
        let shell = Shell::new(Arc::new(runner), false);

        let result = shell.mutate(&Cmd::new("apt-get").args(["install", "-y", "nope"]));
        assert!(matches!(result, Err(SrvStackError::Command { .. })));
    }

    #[test]
    fn test_process_runner_captures_output() {
        let output = ProcessRunner.run(&Cmd::new("sh").args(["-c", "echo hi; exit 3"])).unwrap();
        assert_eq!(output.stdout.trim(), "hi");
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success);
    }
}
