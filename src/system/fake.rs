//! In-memory stand-ins for the host, used by tests.
//!
//! Each fake is a cheap `Clone` handle over shared state, so a test can keep
//! one handle for assertions while the [`crate::context::Context`] owns
//! another. Every call is recorded in order as a short string
//! (`"install php"`, `"start apache2"`, ...).

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::shell::{Cmd, CmdOutput, CommandRunner};
use super::{CertTool, InitSystem, PackageManager, ServiceAction, SiteFs, WebServer};
use crate::error::{Result, SrvStackError};

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Command runner
// ============================================================================

/// Records commands and answers them from a table of argv-prefix rules.
///
/// Commands without a matching rule succeed with empty output.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    rules: Arc<Mutex<Vec<(Vec<String>, CmdOutput)>>>,
    seen: Arc<Mutex<Vec<Cmd>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands whose argv starts with `prefix`. Earlier rules win.
    pub fn respond(&self, prefix: &[&str], output: CmdOutput) {
        let prefix = prefix.iter().map(|s| (*s).to_string()).collect();
        lock(&self.rules).push((prefix, output));
    }

    /// Every command received, rendered with its environment.
    pub fn commands(&self) -> Vec<String> {
        lock(&self.seen).iter().map(ToString::to_string).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, cmd: &Cmd) -> std::io::Result<CmdOutput> {
        lock(&self.seen).push(cmd.clone());

        let argv = cmd.argv();
        let rules = lock(&self.rules);
        let answer = rules
            .iter()
            .find(|(prefix, _)| {
                prefix.len() <= argv.len() && prefix.iter().zip(&argv).all(|(p, a)| p == a)
            })
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| CmdOutput::ok(""));
        Ok(answer)
    }
}

// ============================================================================
// Package manager
// ============================================================================

#[derive(Debug, Default)]
struct PackageState {
    installed: BTreeSet<String>,
    broken: BTreeSet<String>,
    refresh_fails: bool,
    upgrade_fails: bool,
    calls: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakePackages {
    state: Arc<Mutex<PackageState>>,
}

impl FakePackages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_installed(packages: &[&str]) -> Self {
        let fake = Self::new();
        lock(&fake.state)
            .installed
            .extend(packages.iter().map(|p| (*p).to_string()));
        fake
    }

    /// Make every install of `package` fail.
    pub fn break_package(&self, package: &str) {
        lock(&self.state).broken.insert(package.to_string());
    }

    pub fn fail_refresh(&self) {
        lock(&self.state).refresh_fails = true;
    }

    pub fn fail_upgrade(&self) {
        lock(&self.state).upgrade_fails = true;
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    /// Packages `install` was called for, in call order.
    pub fn install_calls(&self) -> Vec<String> {
        lock(&self.state)
            .calls
            .iter()
            .filter_map(|c| c.strip_prefix("install "))
            .map(str::to_string)
            .collect()
    }

    /// Calls that would change the host.
    pub fn mutating_calls(&self) -> Vec<String> {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| !c.starts_with("is_installed "))
            .cloned()
            .collect()
    }

    pub fn is_present(&self, package: &str) -> bool {
        lock(&self.state).installed.contains(package)
    }
}

impl PackageManager for FakePackages {
    fn refresh_index(&self) -> Result<()> {
        let mut state = lock(&self.state);
        state.calls.push("refresh".to_string());
        if state.refresh_fails {
            return Err(SrvStackError::command("apt-get update", "network unreachable"));
        }
        Ok(())
    }

    fn upgrade(&self) -> Result<()> {
        let mut state = lock(&self.state);
        state.calls.push("upgrade".to_string());
        if state.upgrade_fails {
            return Err(SrvStackError::command("apt-get upgrade -y", "dpkg was interrupted"));
        }
        Ok(())
    }

    fn is_installed(&self, package: &str) -> Result<bool> {
        let mut state = lock(&self.state);
        state.calls.push(format!("is_installed {}", package));
        Ok(state.installed.contains(package))
    }

    fn install(&self, package: &str) -> Result<()> {
        let mut state = lock(&self.state);
        state.calls.push(format!("install {}", package));
        if state.broken.contains(package) {
            return Err(SrvStackError::command(
                format!("apt-get install -y {}", package),
                "E: Unable to locate package",
            ));
        }
        state.installed.insert(package.to_string());
        Ok(())
    }
}

// ============================================================================
// Init system
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitState {
    pub active: bool,
    pub enabled: bool,
}

#[derive(Debug, Default)]
struct InitState {
    units: BTreeMap<String, UnitState>,
    calls: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeInit {
    state: Arc<Mutex<InitState>>,
}

impl FakeInit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_unit(&self, service: &str, active: bool, enabled: bool) {
        lock(&self.state)
            .units
            .insert(service.to_string(), UnitState { active, enabled });
    }

    pub fn unit(&self, service: &str) -> Option<UnitState> {
        lock(&self.state).units.get(service).copied()
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    /// Calls other than the read-only queries.
    pub fn mutating_calls(&self) -> Vec<String> {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| {
                !(c.starts_with("unit_exists ")
                    || c.starts_with("is_active ")
                    || c.starts_with("is_enabled "))
            })
            .cloned()
            .collect()
    }
}

impl InitSystem for FakeInit {
    fn unit_exists(&self, service: &str) -> Result<bool> {
        let mut state = lock(&self.state);
        state.calls.push(format!("unit_exists {}", service));
        Ok(state.units.contains_key(service))
    }

    fn is_active(&self, service: &str) -> Result<bool> {
        let mut state = lock(&self.state);
        state.calls.push(format!("is_active {}", service));
        Ok(state.units.get(service).is_some_and(|u| u.active))
    }

    fn is_enabled(&self, service: &str) -> Result<bool> {
        let mut state = lock(&self.state);
        state.calls.push(format!("is_enabled {}", service));
        Ok(state.units.get(service).is_some_and(|u| u.enabled))
    }

    fn apply(&self, action: ServiceAction, service: &str) -> Result<()> {
        let mut state = lock(&self.state);
        state.calls.push(format!("{} {}", action, service));
        let unit = state
            .units
            .get_mut(service)
            .ok_or_else(|| SrvStackError::not_found(format!("unit '{}'", service)))?;
        match action {
            ServiceAction::Start | ServiceAction::Restart => unit.active = true,
            ServiceAction::Stop => unit.active = false,
            ServiceAction::Enable => unit.enabled = true,
            ServiceAction::Disable => unit.enabled = false,
        }
        Ok(())
    }
}

// ============================================================================
// Web server
// ============================================================================

#[derive(Debug, Default)]
struct WebState {
    modules: BTreeSet<String>,
    sites: BTreeSet<String>,
    reloads: usize,
    reload_fails: bool,
    calls: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeWebServer {
    state: Arc<Mutex<WebState>>,
}

impl FakeWebServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reload(&self) {
        lock(&self.state).reload_fails = true;
    }

    pub fn modules(&self) -> Vec<String> {
        lock(&self.state).modules.iter().cloned().collect()
    }

    pub fn sites(&self) -> Vec<String> {
        lock(&self.state).sites.iter().cloned().collect()
    }

    pub fn reloads(&self) -> usize {
        lock(&self.state).reloads
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }
}

impl WebServer for FakeWebServer {
    fn enable_module(&self, module: &str) -> Result<()> {
        let mut state = lock(&self.state);
        state.calls.push(format!("enable_module {}", module));
        state.modules.insert(module.to_string());
        Ok(())
    }

    fn enable_site(&self, domain: &str) -> Result<()> {
        let mut state = lock(&self.state);
        state.calls.push(format!("enable_site {}", domain));
        state.sites.insert(domain.to_string());
        Ok(())
    }

    fn reload(&self) -> Result<()> {
        let mut state = lock(&self.state);
        state.calls.push("reload".to_string());
        if state.reload_fails {
            return Err(SrvStackError::command("systemctl reload apache2", "exit code 1"));
        }
        state.reloads += 1;
        Ok(())
    }
}

// ============================================================================
// Certificate tool
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct FakeCertTool {
    issued: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeCertTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(domain, email)` pairs in issue order.
    pub fn issued(&self) -> Vec<(String, String)> {
        lock(&self.issued).clone()
    }
}

impl CertTool for FakeCertTool {
    fn issue(&self, domain: &str, email: &str) -> Result<()> {
        lock(&self.issued).push((domain.to_string(), email.to_string()));
        Ok(())
    }
}

// ============================================================================
// Filesystem
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeEntry {
    Dir { owner: Option<String> },
    File { contents: String, owner: Option<String> },
}

#[derive(Debug, Default)]
struct FsState {
    entries: BTreeMap<PathBuf, FakeEntry>,
    executables: BTreeSet<PathBuf>,
    chown_fails: bool,
    calls: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeFs {
    state: Arc<Mutex<FsState>>,
}

impl FakeFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_chown(&self) {
        lock(&self.state).chown_fails = true;
    }

    pub fn entry(&self, path: &Path) -> Option<FakeEntry> {
        lock(&self.state).entries.get(path).cloned()
    }

    pub fn contents(&self, path: &Path) -> Option<String> {
        match self.entry(path) {
            Some(FakeEntry::File { contents, .. }) => Some(contents),
            _ => None,
        }
    }

    pub fn is_executable(&self, path: &Path) -> bool {
        lock(&self.state).executables.contains(path)
    }

    /// Direct children of `dir`, sorted.
    pub fn children(&self, dir: &Path) -> Vec<PathBuf> {
        lock(&self.state)
            .entries
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    /// Calls that would change the filesystem.
    pub fn mutating_calls(&self) -> Vec<String> {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| !c.starts_with("exists "))
            .cloned()
            .collect()
    }
}

impl SiteFs for FakeFs {
    fn exists(&self, path: &Path) -> bool {
        let mut state = lock(&self.state);
        state.calls.push(format!("exists {}", path.display()));
        state.entries.contains_key(path)
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        let mut state = lock(&self.state);
        state.calls.push(format!("create_dir {}", path.display()));
        state
            .entries
            .entry(path.to_path_buf())
            .or_insert(FakeEntry::Dir { owner: None });
        Ok(())
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        let mut state = lock(&self.state);
        state.calls.push(format!("write_file {}", path.display()));
        state.entries.insert(
            path.to_path_buf(),
            FakeEntry::File {
                contents: contents.to_string(),
                owner: None,
            },
        );
        Ok(())
    }

    fn make_executable(&self, path: &Path) -> Result<()> {
        let mut state = lock(&self.state);
        state.calls.push(format!("make_executable {}", path.display()));
        state.executables.insert(path.to_path_buf());
        Ok(())
    }

    fn chown_recursive(&self, path: &Path, user: &str) -> Result<()> {
        let mut state = lock(&self.state);
        state
            .calls
            .push(format!("chown_recursive {} {}", path.display(), user));
        if state.chown_fails {
            return Err(SrvStackError::not_found(format!("user '{}'", user)));
        }
        for (entry_path, entry) in state.entries.iter_mut() {
            if entry_path.starts_with(path) {
                match entry {
                    FakeEntry::Dir { owner } | FakeEntry::File { owner, .. } => {
                        *owner = Some(user.to_string());
                    }
                }
            }
        }
        Ok(())
    }
}
