//! Utility commands
//!
//! Handles: ping, help
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Text commands; help reads the registry and DMs the result
//! - 1.0.0: Extracted from the message handler

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use std::time::Duration;
use tokio::time::Instant;

use crate::arguments::types::disambiguation;
use crate::arguments::ArgumentInfo;
use crate::commands::command::RegisteredCommand;
use crate::commands::context::CommandMessage;
use crate::commands::handler::{Command, CommandArgs};
use crate::commands::info::CommandInfo;
use crate::commands::parser;

const DM_SENT: &str = "Sent you a DM with information.";
const DM_FAILED: &str = "Unable to send you the help DM. You probably have DMs disabled.";

/// Round-trip check
pub struct PingCommand;

#[async_trait]
impl Command for PingCommand {
    fn info(&self) -> CommandInfo {
        CommandInfo::new("ping", "util", "Checks the bot's ping to the chat server.")
            .throttling(5, Duration::from_secs(10))
    }

    async fn run(&self, msg: &CommandMessage, _args: CommandArgs) -> Result<Option<String>> {
        let started = Instant::now();
        msg.reply("Pinging...").await?;
        let elapsed = started.elapsed().as_millis();

        info!("Ping for {} took {elapsed}ms", msg.author());
        Ok(Some(format!(
            "Pong! The message round trip took {elapsed}ms."
        )))
    }
}

/// Command list and per-command detail, sent by DM
pub struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    fn info(&self) -> CommandInfo {
        CommandInfo::new(
            "help",
            "util",
            "Displays a list of available commands, or detailed information for a specified command.",
        )
        .alias("commands")
        .details(
            "The command may be part of a command name or a whole command name. \
             If it isn't specified, all available commands will be listed.",
        )
        .example("help")
        .example("help prefix")
        .guarded()
        .arg(
            ArgumentInfo::new("command", "Which command would you like to view the help for?")
                .of_type("string")
                .default(""),
        )
    }

    async fn run(&self, msg: &CommandMessage, args: CommandArgs) -> Result<Option<String>> {
        let args = args.collected().context("help takes collected arguments")?;
        let search = args.string("command")?.trim();
        let show_all = search.eq_ignore_ascii_case("all");

        if search.is_empty() || show_all {
            return self.send_list(msg, show_all).await;
        }

        let found = msg
            .framework()
            .registry()
            .find_commands(Some(search), false, Some(msg));
        match found.as_slice() {
            [command] => self.send_detail(msg, command).await,
            [] => Ok(Some(format!(
                "Unable to identify command. Use {} to view the list of all commands.",
                msg.any_usage("help")
            ))),
            many => {
                let names: Vec<String> = many.iter().map(|c| c.name().to_string()).collect();
                Ok(Some(disambiguation("commands", &names)))
            }
        }
    }
}

impl HelpCommand {
    async fn send_detail(
        &self,
        msg: &CommandMessage,
        command: &RegisteredCommand,
    ) -> Result<Option<String>> {
        let info = command.info();
        let mut help = format!("__Command **{}**:__ {}", info.name, info.description);
        if info.guild_only {
            help.push_str(" (Usable only in servers)");
        }
        help.push_str(&format!("\n**Format:** {}", msg.any_usage(&command.invocation())));
        if !info.aliases.is_empty() {
            help.push_str(&format!("\n**Aliases:** {}", info.aliases.join(", ")));
        }
        help.push_str(&format!(
            "\n**Group:** {} (`{}`)",
            command.group().name(),
            info.qualified_name()
        ));
        if let Some(details) = &info.details {
            help.push_str(&format!("\n**Details:** {details}"));
        }
        if !info.examples.is_empty() {
            help.push_str(&format!("\n**Examples:**\n{}", info.examples.join("\n")));
        }

        Ok(self.direct(msg, &help).await)
    }

    async fn send_list(&self, msg: &CommandMessage, show_all: bool) -> Result<Option<String>> {
        let framework = msg.framework();
        let registry = framework.registry();
        let prefix = msg.guild().and_then(|g| framework.prefix(Some(g)));
        let bot = framework.bot_user().map(|b| b.name.as_str());
        let place = if msg.is_dm() { "any server" } else { "this server" };

        let mut text = format!(
            "To run a command in {place}, use {}. For example, {}.\n\
             To run a command in this DM, simply use {} with no prefix.\n\n\
             Use {} to view detailed information about a specific command.\n\
             Use {} to view a list of *all* commands, not just available ones.\n\n",
            parser::usage("command", prefix.as_deref(), bot),
            parser::usage("prefix", prefix.as_deref(), bot),
            parser::usage("command", None, None),
            parser::usage("help <command>", None, None),
            parser::usage("help all", None, None),
        );
        if show_all {
            text.push_str("__**All commands**__\n\n");
        } else if msg.is_dm() {
            text.push_str("__**Available commands in this DM**__\n\n");
        } else {
            text.push_str("__**Available commands in this server**__\n\n");
        }

        let sections: Vec<String> = registry
            .groups()
            .iter()
            .filter_map(|group| {
                let lines: Vec<String> = registry
                    .group_commands(group.id())
                    .iter()
                    .filter(|c| !c.info().hidden && (show_all || c.is_usable(Some(msg))))
                    .map(|c| format!("**{}:** {}", c.name(), c.info().description))
                    .collect();
                (!lines.is_empty()).then(|| format!("__{}__\n{}", group.name(), lines.join("\n")))
            })
            .collect();
        text.push_str(&sections.join("\n\n"));

        Ok(self.direct(msg, &text).await)
    }

    /// DM `text`, then point to it when invoked from a server
    async fn direct(&self, msg: &CommandMessage, text: &str) -> Option<String> {
        if let Err(e) = msg.direct(text).await {
            warn!("Failed to DM help to {}: {e}", msg.author());
            return Some(DM_FAILED.to_string());
        }
        (!msg.is_dm()).then(|| DM_SENT.to_string())
    }
}
