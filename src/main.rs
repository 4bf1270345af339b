//! srvstack - main entry point

use std::io;
use std::process::ExitCode;

use clap::CommandFactory;
use clap::error::ErrorKind;
use tracing::{debug, error, info};

use srvstack::cli::{Cli, Commands};
use srvstack::config::Settings;
use srvstack::context::Context;
use srvstack::registry::Registry;
use srvstack::{dispatch, logging, menu, output, sanity};

fn main() -> ExitCode {
    let cli = match Cli::try_parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    let settings = match Settings::resolve(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            output::failure(format!("Failed to load settings: {:#}", e));
            return ExitCode::FAILURE;
        }
    };

    logging::init(&settings, cli.verbose);
    debug!("CLI arguments parsed");

    let command = cli.command.unwrap_or(Commands::Menu);

    if let Commands::Completions { shell } = &command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "srvstack", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    let registry = match Registry::builtin() {
        Ok(registry) => registry,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    if command.needs_preflight() {
        if let Err(e) = sanity::run_preflight_checks(&settings, command.required_tools()) {
            error!("{}", e);
            return ExitCode::from(e.exit_code());
        }
    }

    info!("srvstack starting: {:?}", command);
    let ctx = Context::system(settings, registry, cli.dry_run);

    let result = if command == Commands::Menu {
        menu::run_menu(&ctx)
    } else {
        dispatch::execute(&ctx, &command)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
