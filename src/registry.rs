//! Component and service registry
//!
//! Two static tables drive every workflow:
//!
//! | Table              | Key          | Value                     |
//! |--------------------|--------------|---------------------------|
//! | components         | display name | ordered package ids       |
//! | service bindings   | package id   | init-system service name  |
//!
//! Both are validated once when the `Registry` is built and never change
//! afterwards. Lookups are exact string matches.

use std::collections::HashSet;

use crate::error::{Result, SrvStackError};

// ============================================================================
// Built-in tables
// ============================================================================

/// Components installed by `install`, in installation order.
pub const BUILTIN_COMPONENTS: &[(&str, &[&str])] = &[
    ("Web server", &["apache2"]),
    ("Database", &["mariadb-server", "mariadb-client"]),
    ("PHP", &["php", "libapache2-mod-php", "php-mysql", "php-cli"]),
    ("Mail", &["postfix", "dovecot-imapd"]),
    ("FTP", &["vsftpd"]),
    ("Runtimes", &["python3", "python3-pip", "nodejs", "npm"]),
    ("SSL", &["certbot", "python3-certbot-apache"]),
    ("Tools", &["git", "curl", "unzip"]),
];

/// Packages that ship a long-running daemon, and the unit that runs it.
pub const BUILTIN_SERVICES: &[(&str, &str)] = &[
    ("apache2", "apache2"),
    ("mariadb-server", "mariadb"),
    ("postfix", "postfix"),
    ("dovecot-imapd", "dovecot"),
    ("vsftpd", "vsftpd"),
];

/// Package providing the web server that post-install actions target.
pub const WEB_SERVER_PACKAGE: &str = "apache2";

/// Package providing the certificate tool.
pub const CERT_TOOL_PACKAGE: &str = "certbot";

// ============================================================================
// Records
// ============================================================================

/// A named feature bundle mapping to one or more packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub packages: Vec<String>,
}

impl Component {
    pub fn new(name: impl Into<String>, packages: &[&str]) -> Self {
        Self {
            name: name.into(),
            packages: packages.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

/// Links an installed package to the init-system unit it provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceBinding {
    pub package: String,
    pub service: String,
}

impl ServiceBinding {
    pub fn new(package: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            service: service.into(),
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Validated, immutable view over the component and service tables.
#[derive(Debug, Clone)]
pub struct Registry {
    components: Vec<Component>,
    bindings: Vec<ServiceBinding>,
}

impl Registry {
    /// Build a registry, rejecting malformed tables.
    ///
    /// # Rejected
    ///
    /// - empty or duplicate component names
    /// - components with no packages, or a package listed twice in one component
    /// - duplicate binding keys, or bindings for a package no component declares
    pub fn new(components: Vec<Component>, bindings: Vec<ServiceBinding>) -> Result<Self> {
        let mut names = HashSet::new();
        let mut declared = HashSet::new();

        for component in &components {
            if component.name.trim().is_empty() {
                return Err(SrvStackError::registry("component name must not be empty"));
            }
            if !names.insert(component.name.as_str()) {
                return Err(SrvStackError::registry(format!(
                    "duplicate component '{}'",
                    component.name
                )));
            }
            if component.packages.is_empty() {
                return Err(SrvStackError::registry(format!(
                    "component '{}' has no packages",
                    component.name
                )));
            }

            let mut seen = HashSet::new();
            for package in &component.packages {
                if package.trim().is_empty() {
                    return Err(SrvStackError::registry(format!(
                        "component '{}' lists an empty package id",
                        component.name
                    )));
                }
                if !seen.insert(package.as_str()) {
                    return Err(SrvStackError::registry(format!(
                        "component '{}' lists package '{}' twice",
                        component.name, package
                    )));
                }
                declared.insert(package.as_str());
            }
        }

        let mut bound = HashSet::new();
        for binding in &bindings {
            if !bound.insert(binding.package.as_str()) {
                return Err(SrvStackError::registry(format!(
                    "duplicate service binding for package '{}'",
                    binding.package
                )));
            }
            if binding.service.trim().is_empty() {
                return Err(SrvStackError::registry(format!(
                    "package '{}' is bound to an empty service name",
                    binding.package
                )));
            }
            if !declared.contains(binding.package.as_str()) {
                return Err(SrvStackError::registry(format!(
                    "service '{}' is bound to undeclared package '{}'",
                    binding.service, binding.package
                )));
            }
        }

        Ok(Self {
            components,
            bindings,
        })
    }

    /// The registry shipped with the tool.
    pub fn builtin() -> Result<Self> {
        let components = BUILTIN_COMPONENTS
            .iter()
            .map(|(name, packages)| Component::new(*name, packages))
            .collect();
        let bindings = BUILTIN_SERVICES
            .iter()
            .map(|(package, service)| ServiceBinding::new(*package, *service))
            .collect();
        Self::new(components, bindings)
    }

    /// Components in installation order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Service bindings in declaration order.
    pub fn bindings(&self) -> &[ServiceBinding] {
        &self.bindings
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Ordered package list for a component.
    pub fn packages_for(&self, name: &str) -> Option<&[String]> {
        self.component(name).map(|c| c.packages.as_slice())
    }

    /// Service bound to a package, if the package runs a daemon.
    pub fn service_for(&self, package: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.package == package)
            .map(|b| b.service.as_str())
    }

    /// Every `(component, package)` pair in installation order.
    pub fn packages(&self) -> impl Iterator<Item = (&str, &str)> {
        self.components.iter().flat_map(|c| {
            c.packages
                .iter()
                .map(move |p| (c.name.as_str(), p.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_is_valid() {
        let registry = Registry::builtin().unwrap();
        assert_eq!(registry.components().len(), BUILTIN_COMPONENTS.len());
        assert_eq!(registry.bindings().len(), BUILTIN_SERVICES.len());
    }

    #[test]
    fn test_lookup_is_exact() {
        let registry = Registry::builtin().unwrap();
        assert!(registry.component("Database").is_some());
        assert!(registry.component("database").is_none());
        assert!(registry.component("Database ").is_none());
    }

    #[test]
    fn test_packages_for_preserves_order() {
        let registry = Registry::builtin().unwrap();
        let php = registry.packages_for("PHP").unwrap();
        assert_eq!(php, ["php", "libapache2-mod-php", "php-mysql", "php-cli"]);
    }

    #[test]
    fn test_service_for() {
        let registry = Registry::builtin().unwrap();
        assert_eq!(registry.service_for("mariadb-server"), Some("mariadb"));
        assert_eq!(registry.service_for("git"), None);
    }

    #[test]
    fn test_rejects_duplicate_component() {
        let result = Registry::new(
            vec![Component::new("Web", &["apache2"]), Component::new("Web", &["nginx"])],
            vec![],
        );
        assert!(matches!(result, Err(SrvStackError::Registry(_))));
    }

    #[test]
    fn test_rejects_empty_package_list() {
        let result = Registry::new(vec![Component::new("Empty", &[])], vec![]);
        assert!(matches!(result, Err(SrvStackError::Registry(_))));
    }

    #[test]
    fn test_rejects_duplicate_package_in_component() {
        let result = Registry::new(vec![Component::new("Tools", &["git", "git"])], vec![]);
        assert!(matches!(result, Err(SrvStackError::Registry(_))));
    }

    #[test]
    fn test_rejects_duplicate_binding() {
        let result = Registry::new(
            vec![Component::new("Web", &["apache2"])],
            vec![
                ServiceBinding::new("apache2", "apache2"),
                ServiceBinding::new("apache2", "httpd"),
            ],
        );
        assert!(matches!(result, Err(SrvStackError::Registry(_))));
    }

    #[test]
    fn test_rejects_binding_for_undeclared_package() {
        let result = Registry::new(
            vec![Component::new("Web", &["apache2"])],
            vec![ServiceBinding::new("nginx", "nginx")],
        );
        assert!(matches!(result, Err(SrvStackError::Registry(_))));
    }
}
