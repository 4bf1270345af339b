//! Tests for site and virtual host scaffolding
//!
//! These tests verify:
//! - New sites get the placeholder files and the web user as owner
//! - Existing sites and virtual hosts are never overwritten
//! - Virtual hosts are enabled and the web server reloaded

mod common;

use std::path::Path;

use common::Harness;
use srvstack::system::fake::FakeEntry;
use srvstack::workflow::scaffold::{render_vhost, SITE_FILES};
use srvstack::workflow::{add_virtual_host, enable_virtual_host, new_site};
use srvstack::SrvStackError;

// =============================================================================
// New site
// =============================================================================

#[test]
fn test_new_site_creates_placeholders_owned_by_web_user() {
    let h = Harness::new();
    let report = new_site(&h.ctx, "blog").unwrap();

    let site = Path::new("/var/www/blog");
    assert_eq!(report.path, site);
    assert_eq!(report.owner, "www-data");
    assert_eq!(
        h.fs.entry(site),
        Some(FakeEntry::Dir {
            owner: Some("www-data".into())
        })
    );

    let children = h.fs.children(site);
    assert_eq!(children.len(), SITE_FILES.len());
    for file in SITE_FILES {
        let path = site.join(file.name);
        assert_eq!(h.fs.contents(&path).as_deref(), Some(file.contents));
        assert_eq!(
            h.fs.entry(&path),
            Some(FakeEntry::File {
                contents: file.contents.to_string(),
                owner: Some("www-data".into())
            })
        );
        assert_eq!(h.fs.is_executable(&path), file.executable);
    }
    assert!(h.fs.is_executable(&site.join("app.py")));
    assert!(!h.fs.is_executable(&site.join("index.php")));
}

#[test]
fn test_new_site_twice_is_conflict_and_leaves_files_alone() {
    let h = Harness::new();
    new_site(&h.ctx, "blog").unwrap();
    let writes_before = h.fs.mutating_calls();

    let err = new_site(&h.ctx, "blog").unwrap_err();

    assert!(matches!(err, SrvStackError::Conflict(_)));
    assert_eq!(h.fs.mutating_calls(), writes_before);
}

#[test]
fn test_new_site_rejects_paths() {
    let h = Harness::new();
    for name in ["", "../etc", "a/b", "/tmp"] {
        let err = new_site(&h.ctx, name).unwrap_err();
        assert!(matches!(err, SrvStackError::Validation(_)), "{:?} accepted", name);
    }
    assert!(h.fs.mutating_calls().is_empty());
}

#[test]
fn test_new_site_chown_failure_is_reported() {
    let h = Harness::new();
    h.fs.fail_chown();

    let err = new_site(&h.ctx, "blog").unwrap_err();

    assert!(matches!(err, SrvStackError::NotFound(_)));
    // Not transactional: what was written stays
    assert!(h.fs.entry(Path::new("/var/www/blog")).is_some());
}

// =============================================================================
// Virtual hosts
// =============================================================================

#[test]
fn test_add_virtual_host_writes_enables_and_reloads() {
    let h = Harness::new();
    let report = add_virtual_host(&h.ctx, "example.test", "/var/www/example").unwrap();

    let conf = Path::new("/etc/apache2/sites-available/example.test.conf");
    assert_eq!(report.config_path, conf);
    assert_eq!(
        h.fs.contents(conf),
        Some(render_vhost("example.test", "/var/www/example"))
    );
    assert_eq!(h.web.calls(), ["enable_site example.test", "reload"]);
    assert_eq!(h.web.sites(), ["example.test"]);
}

#[test]
fn test_add_virtual_host_twice_is_conflict() {
    let h = Harness::new();
    add_virtual_host(&h.ctx, "example.test", "/var/www/example").unwrap();

    let err = add_virtual_host(&h.ctx, "example.test", "/srv/other").unwrap_err();

    assert!(matches!(err, SrvStackError::Conflict(_)));
    let conf = Path::new("/etc/apache2/sites-available/example.test.conf");
    assert!(h.fs.contents(conf).unwrap().contains("DocumentRoot /var/www/example\n"));
    assert_eq!(h.web.reloads(), 1);
}

#[test]
fn test_add_virtual_host_requires_both_arguments() {
    let h = Harness::new();
    assert!(matches!(
        add_virtual_host(&h.ctx, "", "/var/www/x").unwrap_err(),
        SrvStackError::Validation(_)
    ));
    assert!(matches!(
        add_virtual_host(&h.ctx, "example.test", " ").unwrap_err(),
        SrvStackError::Validation(_)
    ));
    assert!(h.fs.mutating_calls().is_empty());
}

#[test]
fn test_enable_virtual_host_requires_existing_file() {
    let h = Harness::new();
    let err = enable_virtual_host(&h.ctx, "missing.test").unwrap_err();
    assert!(matches!(err, SrvStackError::NotFound(_)));
    assert!(h.web.calls().is_empty());
}

#[test]
fn test_enable_virtual_host_is_repeatable() {
    let h = Harness::new();
    add_virtual_host(&h.ctx, "example.test", "/var/www/example").unwrap();

    enable_virtual_host(&h.ctx, "example.test").unwrap();
    enable_virtual_host(&h.ctx, "example.test").unwrap();

    assert_eq!(h.web.sites(), ["example.test"]);
    assert_eq!(h.web.reloads(), 3);
}
