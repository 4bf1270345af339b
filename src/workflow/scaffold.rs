//! Site and virtual-host scaffolding.
//!
//! Neither operation overwrites anything: an existing target aborts the
//! operation with [`SrvStackError::Conflict`] before any write. Neither is
//! transactional either; a failure halfway leaves what was already written.

use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::context::Context;
use crate::error::{Result, SrvStackError};

/// A placeholder file dropped into every new site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteFile {
    pub name: &'static str,
    pub contents: &'static str,
    /// Runnable script (mode 0755)
    pub executable: bool,
}

/// Placeholder files written into every new site, in write order.
pub const SITE_FILES: &[SiteFile] = &[
    SiteFile {
        name: "index.php",
        contents: "<?php\n// Placeholder page created by srvstack.\nphpinfo();\n",
        executable: false,
    },
    SiteFile {
        name: "app.py",
        contents: "#!/usr/bin/env python3\n\"\"\"Placeholder script created by srvstack.\"\"\"\n\n\nif __name__ == \"__main__\":\n    print(\"Hello from srvstack\")\n",
        executable: true,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteReport {
    pub path: PathBuf,
    pub files: Vec<PathBuf>,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VhostReport {
    pub domain: String,
    pub config_path: PathBuf,
}

/// Create `<web_root>/<name>` with the placeholder files, owned by the web user.
pub fn new_site(ctx: &Context, name: &str) -> Result<SiteReport> {
    validate_site_name(name)?;

    let fs = ctx.backends.fs.as_ref();
    let site_dir = ctx.settings.web_root.join(name);
    if fs.exists(&site_dir) {
        return Err(SrvStackError::conflict(format!(
            "site directory {}",
            site_dir.display()
        )));
    }

    info!("Creating site {} at {}", name, site_dir.display());
    fs.create_dir(&site_dir)?;

    let mut files = Vec::with_capacity(SITE_FILES.len());
    for file in SITE_FILES {
        let path = site_dir.join(file.name);
        fs.write_file(&path, file.contents)?;
        if file.executable {
            fs.make_executable(&path)?;
        }
        files.push(path);
    }

    let owner = ctx.settings.web_user.clone();
    fs.chown_recursive(&site_dir, &owner)?;

    Ok(SiteReport {
        path: site_dir,
        files,
        owner,
    })
}

/// Site names become one directory under the web root.
fn validate_site_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SrvStackError::validation("site name must not be empty"));
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(SrvStackError::validation(format!(
            "site name '{}' must be a single directory name",
            name
        ))),
    }
}

/// Path of the definition file for `domain`.
pub fn vhost_path(ctx: &Context, domain: &str) -> PathBuf {
    ctx.settings.vhost_dir.join(format!("{}.conf", domain))
}

/// Render the Apache virtual host. Values are substituted verbatim.
pub fn render_vhost(domain: &str, document_root: &str) -> String {
    format!(
        r#"<VirtualHost *:80>
    ServerName {domain}
    ServerAlias www.{domain}
    ServerAdmin admin@{domain}
    DocumentRoot {document_root}

    <Directory {document_root}>
        Options -Indexes +FollowSymLinks
        AllowOverride All
        Require all granted
    </Directory>

    ErrorLog ${{APACHE_LOG_DIR}}/{domain}_error.log
    CustomLog ${{APACHE_LOG_DIR}}/{domain}_access.log combined
</VirtualHost>
"#
    )
}

/// Write, enable and load a new virtual host for `domain`.
pub fn add_virtual_host(ctx: &Context, domain: &str, document_root: &str) -> Result<VhostReport> {
    if domain.trim().is_empty() {
        return Err(SrvStackError::validation("domain must not be empty"));
    }
    if document_root.trim().is_empty() {
        return Err(SrvStackError::validation("document root must not be empty"));
    }

    let fs = ctx.backends.fs.as_ref();
    let config_path = vhost_path(ctx, domain);
    if fs.exists(&config_path) {
        return Err(SrvStackError::conflict(format!(
            "virtual host {}",
            config_path.display()
        )));
    }

    info!("Writing virtual host {} -> {}", domain, document_root);
    fs.write_file(&config_path, &render_vhost(domain, document_root))?;
    activate(ctx, domain)?;

    Ok(VhostReport {
        domain: domain.to_string(),
        config_path,
    })
}

/// Enable an existing virtual host and reload. Safe to repeat.
pub fn enable_virtual_host(ctx: &Context, domain: &str) -> Result<VhostReport> {
    if domain.trim().is_empty() {
        return Err(SrvStackError::validation("domain must not be empty"));
    }

    let config_path = vhost_path(ctx, domain);
    if !ctx.backends.fs.exists(&config_path) {
        return Err(SrvStackError::not_found(format!(
            "virtual host {}",
            config_path.display()
        )));
    }

    activate(ctx, domain)?;
    Ok(VhostReport {
        domain: domain.to_string(),
        config_path,
    })
}

fn activate(ctx: &Context, domain: &str) -> Result<()> {
    info!("Enabling virtual host {}", domain);
    ctx.backends.web.enable_site(domain)?;
    ctx.backends.web.reload()
}
