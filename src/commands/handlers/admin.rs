//! Admin command handlers
//!
//! Handles: groups, enable, disable, prefix
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Enable state and prefixes are per guild and persisted through events
//! - 1.0.0: Initial owner-only admin commands

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::info;

use crate::arguments::{ArgMap, ArgValue, ArgumentInfo};
use crate::commands::context::CommandMessage;
use crate::commands::handler::{Command, CommandArgs};
use crate::commands::info::CommandInfo;
use crate::settings::SettingsScope;

/// Lists groups and whether each is enabled here
pub struct GroupsCommand;

#[async_trait]
impl Command for GroupsCommand {
    fn info(&self) -> CommandInfo {
        CommandInfo::new("groups", "commands", "Lists all command groups.")
            .alias("listgroups")
            .guarded()
    }

    async fn run(&self, msg: &CommandMessage, _args: CommandArgs) -> Result<Option<String>> {
        let lines: Vec<String> = msg
            .framework()
            .registry()
            .groups()
            .iter()
            .map(|group| {
                let state = if group.is_enabled_in(msg.guild()) {
                    "Enabled"
                } else {
                    "Disabled"
                };
                format!("**{}:** {state}", group.name())
            })
            .collect();
        Ok(Some(format!("__**Groups**__\n{}", lines.join("\n"))))
    }
}

/// A command or group picked by the `group|command` argument
enum Target {
    Command(String),
    Group(String),
}

fn target(args: &CommandArgs) -> Result<Target> {
    let args: &ArgMap = args.collected().context("expected collected arguments")?;
    match args.get("cmdOrGrp") {
        Some(ArgValue::Command(name)) => Ok(Target::Command(name.clone())),
        Some(ArgValue::Group(id)) => Ok(Target::Group(id.clone())),
        other => Err(anyhow!("Expected a command or group, got {other:?}")),
    }
}

fn target_arg(verb: &str) -> ArgumentInfo {
    ArgumentInfo::new(
        "cmdOrGrp",
        format!("Which command or group would you like to {verb}?"),
    )
    .label("command/group")
    .of_type("group|command")
}

pub struct EnableCommand;

#[async_trait]
impl Command for EnableCommand {
    fn info(&self) -> CommandInfo {
        CommandInfo::new("enable", "commands", "Enables a command or command group.")
            .alias("enable-command")
            .alias("cmd-on")
            .alias("command-on")
            .details("The argument must be the name/ID (partial or whole) of a command or command group.")
            .example("enable util")
            .example("enable ping")
            .owner_only()
            .guarded()
            .arg(target_arg("enable"))
    }

    async fn run(&self, msg: &CommandMessage, args: CommandArgs) -> Result<Option<String>> {
        let framework = msg.framework();
        let registry = framework.registry();
        let scope = SettingsScope::from(msg.guild());

        match target(&args)? {
            Target::Command(name) => {
                let command = registry.resolve_command(name.as_str())?;
                let group = command.group();
                let group_note = if group.is_enabled_in(msg.guild()) {
                    String::new()
                } else {
                    format!(
                        ", but the `{}` group is disabled, so it still can't be used",
                        group.name()
                    )
                };

                if command.is_own_enabled_in(msg.guild()) {
                    return Ok(Some(format!(
                        "The `{name}` command is already enabled{group_note}."
                    )));
                }
                framework.set_command_enabled(&command, scope, true)?;
                info!("{} enabled command {name} in {scope}", msg.author());
                Ok(Some(format!("Enabled the `{name}` command{group_note}.")))
            }
            Target::Group(id) => {
                let group = registry.resolve_group(id.as_str())?;
                let name = group.name();
                if group.is_enabled_in(msg.guild()) {
                    return Ok(Some(format!("The `{name}` group is already enabled.")));
                }
                framework.set_group_enabled(&group, scope, true)?;
                info!("{} enabled group {id} in {scope}", msg.author());
                Ok(Some(format!("Enabled the `{name}` group.")))
            }
        }
    }
}

pub struct DisableCommand;

#[async_trait]
impl Command for DisableCommand {
    fn info(&self) -> CommandInfo {
        CommandInfo::new("disable", "commands", "Disables a command or command group.")
            .alias("disable-command")
            .alias("cmd-off")
            .alias("command-off")
            .details(
                "The argument must be the name/ID (partial or whole) of a command or command group.",
            )
            .example("disable util")
            .example("disable ping")
            .owner_only()
            .guarded()
            .arg(target_arg("disable"))
    }

    async fn run(&self, msg: &CommandMessage, args: CommandArgs) -> Result<Option<String>> {
        let framework = msg.framework();
        let registry = framework.registry();
        let scope = SettingsScope::from(msg.guild());

        match target(&args)? {
            Target::Command(name) => {
                let command = registry.resolve_command(name.as_str())?;
                if !command.is_own_enabled_in(msg.guild()) {
                    return Ok(Some(format!("The `{name}` command is already disabled.")));
                }
                if command.is_guarded() {
                    return Ok(Some(format!("You cannot disable the `{name}` command.")));
                }
                framework.set_command_enabled(&command, scope, false)?;
                info!("{} disabled command {name} in {scope}", msg.author());
                Ok(Some(format!("Disabled the `{name}` command.")))
            }
            Target::Group(id) => {
                let group = registry.resolve_group(id.as_str())?;
                let name = group.name();
                if !group.is_enabled_in(msg.guild()) {
                    return Ok(Some(format!("The `{name}` group is already disabled.")));
                }
                if group.is_guarded() {
                    return Ok(Some(format!("You cannot disable the `{name}` group.")));
                }
                framework.set_group_enabled(&group, scope, false)?;
                info!("{} disabled group {id} in {scope}", msg.author());
                Ok(Some(format!("Disabled the `{name}` group.")))
            }
        }
    }
}

/// Shows or changes the prefix for this guild (or the global one in DMs)
pub struct PrefixCommand;

#[async_trait]
impl Command for PrefixCommand {
    fn info(&self) -> CommandInfo {
        CommandInfo::new("prefix", "util", "Shows or sets the command prefix.")
            .format("[prefix/\"default\"/\"none\"]")
            .details(
                "If no prefix is provided, the current prefix will be shown. \
                 If the prefix is \"default\", the prefix will be reset to the bot's default prefix. \
                 If the prefix is \"none\", the prefix will be removed entirely, only allowing mentions to run commands. \
                 Only the bot owner(s) may change the prefix.",
            )
            .example("prefix")
            .example("prefix -")
            .example("prefix omg!")
            .example("prefix default")
            .example("prefix none")
            .arg(
                ArgumentInfo::new("prefix", "What would you like to set the bot's prefix to?")
                    .of_type("string")
                    .max(15.0)
                    .default(""),
            )
    }

    async fn run(&self, msg: &CommandMessage, args: CommandArgs) -> Result<Option<String>> {
        let args = args.collected().context("prefix takes collected arguments")?;
        let requested = args.string("prefix")?.trim();
        let framework = msg.framework();
        let scope = SettingsScope::from(msg.guild());

        if requested.is_empty() {
            let current = match framework.prefix(msg.guild()) {
                Some(prefix) => format!("The command prefix is `{prefix}`."),
                None => "There is no command prefix.".to_string(),
            };
            return Ok(Some(format!(
                "{current} To run commands, use {}.",
                msg.any_usage("command")
            )));
        }

        if !msg.is_owner() {
            let what = if msg.is_dm() {
                "the global command prefix"
            } else {
                "the command prefix"
            };
            return Ok(Some(format!("Only the bot owner(s) may change {what}.")));
        }

        let response = match requested.to_lowercase().as_str() {
            "default" => {
                framework.reset_prefix(scope);
                let current = match framework.global_prefix() {
                    Some(prefix) => format!("`{prefix}`"),
                    None => "no prefix".to_string(),
                };
                format!("Reset the command prefix to the default (currently {current}).")
            }
            "none" => {
                framework.set_prefix(scope, None);
                "Removed the command prefix entirely.".to_string()
            }
            _ => {
                framework.set_prefix(scope, Some(requested.to_string()));
                format!("Set the command prefix to `{requested}`.")
            }
        };

        Ok(Some(format!(
            "{response} To run commands, use {}.",
            msg.any_usage("command")
        )))
    }
}
