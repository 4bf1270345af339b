//! Local filesystem writes for scaffolded sites and vhost files.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use nix::unistd::{chown, User};

use super::shell::announce;
use super::SiteFs;
use crate::error::{Result, SrvStackError};

#[derive(Debug, Clone, Default)]
pub struct LocalFs {
    dry_run: bool,
}

impl LocalFs {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }
}

impl SiteFs for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        if announce(self.dry_run, &format_args!("mkdir -p {}", path.display())) {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        if announce(self.dry_run, &format_args!("write {}", path.display())) {
            fs::write(path, contents)?;
        }
        Ok(())
    }

    fn make_executable(&self, path: &Path) -> Result<()> {
        if announce(self.dry_run, &format_args!("chmod 755 {}", path.display())) {
            fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
        }
        Ok(())
    }

    fn chown_recursive(&self, path: &Path, user: &str) -> Result<()> {
        if !announce(
            self.dry_run,
            &format_args!("chown -R {}:{} {}", user, user, path.display()),
        ) {
            return Ok(());
        }

        let account = User::from_name(user)
            .map_err(std::io::Error::from)?
            .ok_or_else(|| SrvStackError::not_found(format!("user '{}'", user)))?;

        chown_tree(path, &account)
    }
}

fn chown_tree(path: &Path, account: &User) -> Result<()> {
    chown(path, Some(account.uid), Some(account.gid)).map_err(std::io::Error::from)?;

    if path.is_dir() {
        for entry in fs::read_dir(path)? {
            chown_tree(&entry?.path(), account)?;
        }
    }
    Ok(())
}
