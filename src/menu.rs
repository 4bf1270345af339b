//! Interactive menu.
//!
//! A `dialoguer` select list; each entry asks for whatever arguments it needs
//! and then runs through the same [`dispatch`](crate::dispatch) path as the
//! CLI. The entry-to-command mapping is a pure function so it can be tested
//! without a terminal.

use std::io;

use crossterm::tty::IsTty;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use tracing::error;

use crate::cli::{Commands, StatusTarget, VhostCommands};
use crate::context::Context;
use crate::dispatch;
use crate::error::{Result, SrvStackError};
use crate::system::ServiceAction;

/// One menu entry and the values it asks for, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub prompts: &'static [&'static str],
}

const SERVICE: &[&str] = &["Service name"];
const DOMAIN: &[&str] = &["Domain"];

/// Menu entries in display order. "Exit" is appended when rendering.
pub const MENU_ITEMS: &[MenuItem] = &[
    MenuItem { label: "Install all components", prompts: &[] },
    MenuItem { label: "Package status", prompts: &[] },
    MenuItem { label: "Service status", prompts: &[] },
    MenuItem { label: "Start a service", prompts: SERVICE },
    MenuItem { label: "Stop a service", prompts: SERVICE },
    MenuItem { label: "Restart a service", prompts: SERVICE },
    MenuItem { label: "Enable a service at boot", prompts: SERVICE },
    MenuItem { label: "Disable a service at boot", prompts: SERVICE },
    MenuItem { label: "Create a new site", prompts: &["Site name"] },
    MenuItem { label: "Add a virtual host", prompts: &["Domain", "Document root"] },
    MenuItem { label: "Enable a virtual host", prompts: DOMAIN },
    MenuItem { label: "Set up SSL for a domain", prompts: DOMAIN },
    MenuItem { label: "List components", prompts: &[] },
];

/// Map a menu index and its answers onto a command.
///
/// `None` for an index past the table or a wrong number of answers.
pub fn selection_to_command(index: usize, args: &[String]) -> Option<Commands> {
    let item = MENU_ITEMS.get(index)?;
    if args.len() != item.prompts.len() {
        return None;
    }
    let arg = |i: usize| args[i].clone();

    let command = match index {
        0 => Commands::Install { no_upgrade: false },
        1 => Commands::Status {
            target: StatusTarget::Packages,
        },
        2 => Commands::Status {
            target: StatusTarget::Services,
        },
        3 => Commands::for_service(ServiceAction::Start, arg(0)),
        4 => Commands::for_service(ServiceAction::Stop, arg(0)),
        5 => Commands::for_service(ServiceAction::Restart, arg(0)),
        6 => Commands::for_service(ServiceAction::Enable, arg(0)),
        7 => Commands::for_service(ServiceAction::Disable, arg(0)),
        8 => Commands::NewSite { name: arg(0) },
        9 => Commands::Vhost {
            action: VhostCommands::Add {
                domain: arg(0),
                path: arg(1),
            },
        },
        10 => Commands::Vhost {
            action: VhostCommands::Enable { domain: arg(0) },
        },
        11 => Commands::Ssl { domain: arg(0) },
        12 => Commands::Components,
        _ => return None,
    };
    Some(command)
}

fn required(answer: &String) -> std::result::Result<(), &'static str> {
    if answer.trim().is_empty() {
        Err("a value is required")
    } else {
        Ok(())
    }
}

fn ask(theme: &ColorfulTheme, prompt: &str) -> io::Result<String> {
    let answer: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .validate_with(required)
        .interact_text()
        .map_err(io::Error::other)?;
    Ok(answer.trim().to_string())
}

/// Show the menu until the operator picks "Exit" or presses Esc. Failures of
/// a single action are reported and the menu keeps going.
pub fn run_menu(ctx: &Context) -> Result<()> {
    if !io::stdin().is_tty() {
        return Err(SrvStackError::precondition(
            "the interactive menu needs a terminal; pass a command instead",
        ));
    }

    let theme = ColorfulTheme::default();
    let labels: Vec<&str> = MENU_ITEMS
        .iter()
        .map(|item| item.label)
        .chain(["Exit"])
        .collect();

    loop {
        let picked = Select::with_theme(&theme)
            .with_prompt("srvstack")
            .items(&labels)
            .default(0)
            .interact_opt()
            .map_err(io::Error::other)?;

        let Some(index) = picked.filter(|i| *i < MENU_ITEMS.len()) else {
            return Ok(());
        };

        let args = MENU_ITEMS[index]
            .prompts
            .iter()
            .map(|prompt| ask(&theme, prompt))
            .collect::<io::Result<Vec<String>>>()?;

        if let Some(command) = selection_to_command(index, &args) {
            if let Err(e) = dispatch::execute(ctx, &command) {
                error!("{}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_simple_choices() {
        assert_eq!(
            selection_to_command(0, &[]),
            Some(Commands::Install { no_upgrade: false })
        );
        assert_eq!(selection_to_command(12, &[]), Some(Commands::Components));
        assert_eq!(selection_to_command(MENU_ITEMS.len(), &[]), None);
    }

    #[test]
    fn test_service_choice_uses_answer() {
        assert_eq!(
            selection_to_command(5, &answers(&["mariadb"])),
            Some(Commands::Restart {
                service: "mariadb".into()
            })
        );
    }

    #[test]
    fn test_vhost_choice_takes_two_answers() {
        assert_eq!(
            selection_to_command(9, &answers(&["example.test", "/srv/example"])),
            Some(Commands::Vhost {
                action: VhostCommands::Add {
                    domain: "example.test".into(),
                    path: "/srv/example".into()
                }
            })
        );
        assert_eq!(selection_to_command(9, &answers(&["example.test"])), None);
    }

    #[test]
    fn test_required_rejects_blank() {
        assert!(required(&String::new()).is_err());
        assert!(required(&"  ".to_string()).is_err());
        assert!(required(&"blog".to_string()).is_ok());
    }

    #[test]
    fn test_every_item_maps_to_a_command() {
        for (index, item) in MENU_ITEMS.iter().enumerate() {
            let args = vec!["x".to_string(); item.prompts.len()];
            assert!(
                selection_to_command(index, &args).is_some(),
                "menu item '{}' did not produce a command",
                item.label
            );
        }
    }
}
