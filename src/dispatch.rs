//! Command dispatch.
//!
//! Maps one parsed [`Commands`] value onto its workflow and prints the
//! result. Shared by the CLI and the interactive menu.

use tracing::{debug, warn};

use crate::cli::{Commands, StatusTarget, VhostCommands};
use crate::context::Context;
use crate::error::Result;
use crate::output;
use crate::workflow::{self, InstallOptions};

/// Run `command` against `ctx`.
///
/// `Menu` and `Completions` are handled by the binary and are no-ops here.
pub fn execute(ctx: &Context, command: &Commands) -> Result<()> {
    if ctx.dry_run {
        debug!("Dry-run mode: state-changing commands will be printed, not run");
    }

    if let Some((action, service)) = command.service_action() {
        workflow::service_action(ctx, action, service)?;
        output::success(format!("{} {}", action, service));
        return Ok(());
    }

    match command {
        Commands::Install { no_upgrade } => {
            let options = InstallOptions {
                upgrade: ctx.settings.upgrade_on_install && !no_upgrade,
            };
            output::heading("Installing server stack");
            let report = workflow::install_all(ctx, &options)?;
            print!("{}", output::render_install_report(&report));
            if report.all_failed() {
                warn!("Every package failed to install");
            }
            for failure in report.failures() {
                output::failure(format!("{}: {}", failure.package, failure.outcome));
            }
        }
        Commands::Status { target } => match target {
            StatusTarget::Packages => {
                let statuses = workflow::status_packages(ctx)?;
                print!("{}", output::render_package_status(&statuses));
            }
            StatusTarget::Services => {
                let statuses = workflow::status_services(ctx)?;
                print!("{}", output::render_service_status(&statuses));
            }
        },
        Commands::NewSite { name } => {
            let site = workflow::new_site(ctx, name)?;
            output::success(format!(
                "Site '{}' created at {} (owner {})",
                name,
                site.path.display(),
                site.owner
            ));
        }
        Commands::Vhost { action } => match action {
            VhostCommands::Add { domain, path } => {
                let vhost = workflow::add_virtual_host(ctx, domain, path)?;
                output::success(format!(
                    "Virtual host {} written to {} and enabled",
                    vhost.domain,
                    vhost.config_path.display()
                ));
            }
            VhostCommands::Enable { domain } => {
                workflow::enable_virtual_host(ctx, domain)?;
                output::success(format!("Virtual host {} enabled", domain));
            }
        },
        Commands::Ssl { domain } => {
            let ssl = workflow::setup_ssl(ctx, domain)?;
            output::success(format!(
                "Certificate requested for {} (contact {})",
                ssl.domain, ssl.email
            ));
        }
        Commands::Components => {
            print!("{}", output::render_components(&ctx.registry));
        }
        Commands::Start { .. }
        | Commands::Stop { .. }
        | Commands::Restart { .. }
        | Commands::Enable { .. }
        | Commands::Disable { .. }
        | Commands::Menu
        | Commands::Completions { .. } => {}
    }

    Ok(())
}
