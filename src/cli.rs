use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::system::ServiceAction;

/// srvstack - install and administer a Linux server stack
#[derive(Parser, Debug)]
#[command(name = "srvstack")]
#[command(about = "Install and administer a web/database/mail/FTP server stack")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: print state-changing commands instead of running them.
    ///
    /// Read-only queries (package and service state) still run so the
    /// preview is realistic. Planned actions are still written to the log.
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Echo log lines to the terminal as well as the log file
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (default: /etc/srvstack/config.json if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Install every component that is not already present
    Install {
        /// Skip upgrading already installed packages
        #[arg(long)]
        no_upgrade: bool,
    },
    /// Show package or service state
    Status {
        #[command(subcommand)]
        target: StatusTarget,
    },
    /// Start a service
    Start { service: String },
    /// Stop a service
    Stop { service: String },
    /// Restart a service
    Restart { service: String },
    /// Enable a service at boot
    Enable { service: String },
    /// Disable a service at boot
    Disable { service: String },
    /// Scaffold a new site directory under the web root
    #[command(name = "newsite")]
    NewSite { name: String },
    /// Manage Apache virtual hosts
    Vhost {
        #[command(subcommand)]
        action: VhostCommands,
    },
    /// Obtain a TLS certificate for a domain
    Ssl { domain: String },
    /// List components, their packages and services
    Components,
    /// Interactive menu (default when no command is given)
    Menu,
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTarget {
    /// Present/missing for every package
    Packages,
    /// Running/stopped and boot state for every service
    Services,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum VhostCommands {
    /// Write and enable a virtual host
    Add {
        domain: String,
        /// Document root
        path: String,
    },
    /// Enable an existing virtual host
    Enable { domain: String },
}

impl Commands {
    /// Build the service command for `action`.
    pub fn for_service(action: ServiceAction, service: String) -> Self {
        match action {
            ServiceAction::Start => Self::Start { service },
            ServiceAction::Stop => Self::Stop { service },
            ServiceAction::Restart => Self::Restart { service },
            ServiceAction::Enable => Self::Enable { service },
            ServiceAction::Disable => Self::Disable { service },
        }
    }

    /// The service action this command requests, if it is one.
    pub fn service_action(&self) -> Option<(ServiceAction, &str)> {
        match self {
            Self::Start { service } => Some((ServiceAction::Start, service.as_str())),
            Self::Stop { service } => Some((ServiceAction::Stop, service.as_str())),
            Self::Restart { service } => Some((ServiceAction::Restart, service.as_str())),
            Self::Enable { service } => Some((ServiceAction::Enable, service.as_str())),
            Self::Disable { service } => Some((ServiceAction::Disable, service.as_str())),
            _ => None,
        }
    }

    /// Whether the root/network pre-flight checks apply.
    pub fn needs_preflight(&self) -> bool {
        !matches!(self, Self::Components | Self::Completions { .. })
    }

    /// Host tools this command needs beyond the package and service tools.
    ///
    /// The Apache helpers ship with `apache2`, so `install` cannot require them.
    pub fn required_tools(&self) -> &'static [&'static str] {
        match self {
            Self::Vhost { .. } => &["a2enmod", "a2ensite"],
            Self::Ssl { .. } => &["certbot"],
            _ => &[],
        }
    }
}

impl Cli {
    /// Parse process arguments, returning clap's error for the caller to
    /// report (help and version are errors too, with a zero exit code).
    pub fn try_parse_args() -> Result<Self, clap::Error> {
        <Self as clap::Parser>::try_parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_no_args() {
        // Running with no args should succeed (defaults to the menu)
        let cli = Cli::try_parse_from(["srvstack"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_global_flags_anywhere() {
        let cli = Cli::try_parse_from(["srvstack", "install", "-n", "--verbose"]).unwrap();
        assert!(cli.dry_run);
        assert!(cli.verbose);
        assert_eq!(cli.command, Some(Commands::Install { no_upgrade: false }));

        let cli = Cli::try_parse_from(["srvstack", "--dry-run", "-v", "status", "services"]).unwrap();
        assert!(cli.dry_run && cli.verbose);
    }

    #[test]
    fn test_cli_status_targets() {
        let cli = Cli::try_parse_from(["srvstack", "status", "packages"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Status {
                target: StatusTarget::Packages
            })
        );
        assert!(Cli::try_parse_from(["srvstack", "status", "disks"]).is_err());
    }

    #[test]
    fn test_cli_service_commands() {
        for verb in ["start", "stop", "restart", "enable", "disable"] {
            let cli = Cli::try_parse_from(["srvstack", verb, "apache2"]).unwrap();
            let command = cli.command.unwrap();
            let (action, service) = command.service_action().unwrap();
            assert_eq!(action.to_string(), verb);
            assert_eq!(service, "apache2");
        }
        assert!(Cli::try_parse_from(["srvstack", "start"]).is_err());
    }

    #[test]
    fn test_cli_newsite_and_vhost() {
        let cli = Cli::try_parse_from(["srvstack", "newsite", "blog"]).unwrap();
        assert_eq!(cli.command, Some(Commands::NewSite { name: "blog".into() }));

        let cli =
            Cli::try_parse_from(["srvstack", "vhost", "add", "example.test", "/srv/example"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Vhost {
                action: VhostCommands::Add {
                    domain: "example.test".into(),
                    path: "/srv/example".into()
                }
            })
        );
    }

    #[test]
    fn test_cli_unknown_command_is_error() {
        let err = Cli::try_parse_from(["srvstack", "frobnicate"]).unwrap_err();
        assert_ne!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_cli_help_is_display_help() {
        for flag in ["--help", "-h", "help"] {
            let err = Cli::try_parse_from(["srvstack", flag]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        }
    }

    #[test]
    fn test_preflight_exemptions() {
        assert!(!Commands::Components.needs_preflight());
        assert!(Commands::Install { no_upgrade: true }.needs_preflight());
        assert!(Commands::Menu.needs_preflight());
    }

    #[test]
    fn test_required_tools() {
        assert!(Commands::Install { no_upgrade: false }.required_tools().is_empty());
        assert_eq!(
            Commands::Ssl {
                domain: "example.test".into()
            }
            .required_tools(),
            ["certbot"]
        );
        let vhost = Commands::Vhost {
            action: VhostCommands::Enable {
                domain: "example.test".into(),
            },
        };
        assert!(vhost.required_tools().contains(&"a2ensite"));
    }

    #[test]
    fn test_for_service_round_trip() {
        let command = Commands::for_service(ServiceAction::Disable, "vsftpd".into());
        assert_eq!(command.service_action(), Some((ServiceAction::Disable, "vsftpd")));
    }
}
