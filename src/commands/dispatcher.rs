//! # Dispatcher
//!
//! Turns inbound messages into command runs: resolution, enable, guild-only,
//! permission and throttle checks, argument collection, then exactly one call
//! of the command body.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Prefix/mention/pattern resolution with prompt routing and inhibitors
//! - 1.0.0: Initial message handler

use super::command::RegisteredCommand;
use super::context::{CommandMessage, IncomingMessage};
use super::handler::{CommandArgs, Permission};
use super::info::ArgsMode;
use super::parser::{build_command_pattern, first_word, parse_args};
use crate::arguments::{CancelReason, Outcome};
use crate::core::error::FriendlyError;
use crate::core::events::FrameworkEvent;
use crate::framework::Framework;
use crate::transport::Transport;
use anyhow::Result;
use dashmap::DashMap;
use log::{debug, error, info, warn};
use regex::Regex;
use serenity::model::id::UserId;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Why a resolved command did not run
#[derive(Debug, Clone, PartialEq)]
pub enum BlockReason {
    Disabled,
    GuildOnly,
    Permission(Option<String>),
    Throttling { remaining: Duration },
    /// Stopped by an inhibitor
    Inhibited(String),
}

/// Terminal state of one dispatched message
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// From a bot, or not a command
    Ignored,
    /// Handed to an in-flight argument prompt
    PromptReply,
    /// The author is mid-collection in this channel
    Awaiting,
    Unknown,
    Blocked(BlockReason),
    Cancelled(CancelReason),
    Success,
    /// The command body failed; the user got an error reply
    Failed,
}

/// Result of an inhibitor check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inhibition {
    pub reason: String,
    /// Sent to the author when present
    pub response: Option<String>,
}

/// Checked once a command is resolved, before any other check; returning
/// `Some` blocks the invocation
pub type Inhibitor = Arc<dyn Fn(&CommandMessage) -> Option<Inhibition> + Send + Sync>;

enum Resolved {
    Command {
        command: Arc<RegisteredCommand>,
        arg_string: String,
    },
    Pattern {
        command: Arc<RegisteredCommand>,
        matches: Vec<Option<String>>,
    },
    Unknown,
}

pub struct Dispatcher {
    framework: Arc<Framework>,
    inhibitors: Vec<Inhibitor>,
    /// Compiled prefix patterns by (prefix, bot user)
    patterns: DashMap<(Option<String>, Option<UserId>), Option<Regex>>,
}

impl Dispatcher {
    pub fn new(framework: Arc<Framework>) -> Self {
        Self {
            framework,
            inhibitors: Vec::new(),
            patterns: DashMap::new(),
        }
    }

    pub fn add_inhibitor<F>(&mut self, inhibitor: F)
    where
        F: Fn(&CommandMessage) -> Option<Inhibition> + Send + Sync + 'static,
    {
        self.inhibitors.push(Arc::new(inhibitor));
    }

    pub fn framework(&self) -> &Arc<Framework> {
        &self.framework
    }

    /// Handle one inbound message
    pub async fn handle_message(
        &self,
        message: IncomingMessage,
        transport: Arc<dyn Transport>,
    ) -> DispatchOutcome {
        let request_id = Uuid::new_v4();

        if message.author_is_bot
            || self.framework.bot_user().is_some_and(|bot| bot.id == message.author_id)
        {
            return DispatchOutcome::Ignored;
        }

        let msg = CommandMessage::new(Arc::clone(&self.framework), transport, message);
        let key = msg.input_key();
        let prompts = self.framework.prompts();

        if prompts.deliver(key, msg.content()) {
            debug!("[{request_id}] Delivered reply from {} to waiting prompt", key.user);
            return DispatchOutcome::PromptReply;
        }
        if prompts.is_awaiting(&key) {
            debug!(
                "[{request_id}] Dropping message from {} while a reply is already held",
                key.user
            );
            return DispatchOutcome::Awaiting;
        }

        let resolved = match self.resolve(&msg) {
            Ok(Some(resolved)) => resolved,
            Ok(None) => return DispatchOutcome::Ignored,
            Err(e) => {
                error!("[{request_id}] Failed to build command pattern: {e}");
                return DispatchOutcome::Ignored;
            }
        };

        let msg = match resolved {
            Resolved::Command { command, arg_string } => msg.with_command(command, arg_string),
            Resolved::Pattern { command, matches } => msg.with_pattern(command, matches),
            Resolved::Unknown => {
                debug!("[{request_id}] Unknown command: {}", msg.content());
                self.framework.emit(FrameworkEvent::UnknownCommand {
                    user: msg.author(),
                    channel: msg.channel(),
                    content: msg.content().to_string(),
                });
                if self.framework.unknown_command_response() {
                    let text = format!(
                        "Unknown command. Use {} to view the command list.",
                        msg.any_usage("help")
                    );
                    self.send_reply(&msg, &text, request_id).await;
                }
                return DispatchOutcome::Unknown;
            }
        };

        self.run_command(&msg, request_id).await
    }

    /// Find the command a message invokes
    ///
    /// Patterns are tried first, then the prefix/mention form, then (in DMs) a
    /// bare command name.
    fn resolve(&self, msg: &CommandMessage) -> Result<Option<Resolved>> {
        let registry = self.framework.registry();
        let content = msg.content();

        for command in registry.commands() {
            for pattern in &command.info().patterns {
                if let Some(caps) = pattern.captures(content) {
                    let matches = caps
                        .iter()
                        .map(|m| m.map(|m| m.as_str().to_string()))
                        .collect();
                    return Ok(Some(Resolved::Pattern {
                        command: Arc::clone(command),
                        matches,
                    }));
                }
            }
        }

        let prefix = self.framework.prefix(msg.guild());
        let bot = self.framework.bot_user().map(|b| b.id);
        if let Some(pattern) = self.command_pattern(prefix, bot)? {
            if let Some(name) = pattern.captures(content).and_then(|caps| caps.get(2)) {
                return Ok(Some(self.match_command(name.as_str(), &content[name.end()..])));
            }
        }

        if msg.is_dm() {
            if let Some(name) = first_word().find(content) {
                return Ok(Some(self.match_command(name.as_str(), &content[name.end()..])));
            }
        }
        Ok(None)
    }

    fn command_pattern(&self, prefix: Option<String>, bot: Option<UserId>) -> Result<Option<Regex>> {
        let key = (prefix, bot);
        if let Some(cached) = self.patterns.get(&key) {
            return Ok(cached.clone());
        }
        let pattern = build_command_pattern(key.0.as_deref(), bot)?;
        self.patterns.insert(key, pattern.clone());
        Ok(pattern)
    }

    fn match_command(&self, name: &str, arg_string: &str) -> Resolved {
        let mut found = self.framework.registry().find_commands(Some(name), true, None);
        if found.len() != 1 || !found[0].info().default_handling {
            return Resolved::Unknown;
        }
        Resolved::Command {
            command: found.remove(0),
            arg_string: arg_string.to_string(),
        }
    }

    async fn run_command(&self, msg: &CommandMessage, request_id: Uuid) -> DispatchOutcome {
        let Some(command) = msg.command().cloned() else {
            return DispatchOutcome::Ignored;
        };
        let name = command.name().to_string();
        debug!("[{request_id}] Running {name} for {}", msg.author());

        for inhibitor in &self.inhibitors {
            if let Some(inhibition) = inhibitor(msg) {
                info!("[{request_id}] Command {name} inhibited for {}: {}", msg.author(), inhibition.reason);
                if let Some(response) = &inhibition.response {
                    self.send_reply(msg, response, request_id).await;
                }
                let reason = BlockReason::Inhibited(inhibition.reason);
                self.framework.emit(FrameworkEvent::CommandBlocked {
                    command: name,
                    user: msg.author(),
                    reason: reason.clone(),
                });
                return DispatchOutcome::Blocked(reason);
            }
        }

        if let Some(reason) = self.check_blocked(&command, msg) {
            info!("[{request_id}] Command {name} blocked for {}: {reason:?}", msg.author());
            if let Some(text) = block_message(&command, &reason) {
                self.send_reply(msg, &text, request_id).await;
            }
            self.framework.emit(FrameworkEvent::CommandBlocked {
                command: name,
                user: msg.author(),
                reason: reason.clone(),
            });
            return DispatchOutcome::Blocked(reason);
        }

        let args = match self.collect_args(&command, msg).await {
            Ok(Ok(args)) => args,
            Ok(Err(cancelled)) => {
                let reason = cancelled.reason;
                let text = if cancelled.prompted && reason != CancelReason::PromptLimit {
                    "Cancelled command.".to_string()
                } else {
                    format!(
                        "Invalid command usage. The `{name}` command's accepted format is: {}. Use {} for more information.",
                        msg.any_usage(&command.invocation()),
                        msg.any_usage(&format!("help {name}"))
                    )
                };
                info!("[{request_id}] Command {name} cancelled ({reason})");
                self.send_reply(msg, &text, request_id).await;
                self.framework.emit(FrameworkEvent::CommandCancelled {
                    command: name,
                    user: msg.author(),
                    reason,
                });
                return DispatchOutcome::Cancelled(reason);
            }
            Err(e) => return self.report_error(&command, msg, e, request_id).await,
        };

        command.record_use(msg);
        let from_pattern = args.from_pattern();
        self.framework.emit(FrameworkEvent::CommandRun {
            command: name.clone(),
            user: msg.author(),
            guild: msg.guild(),
            from_pattern,
        });
        info!("[{request_id}] Command {name} invoked by {}", msg.author());

        match command.handler().run(msg, args).await {
            Ok(Some(reply)) => {
                self.send_reply(msg, &reply, request_id).await;
                DispatchOutcome::Success
            }
            Ok(None) => DispatchOutcome::Success,
            Err(e) => self.report_error(&command, msg, e, request_id).await,
        }
    }

    fn check_blocked(&self, command: &RegisteredCommand, msg: &CommandMessage) -> Option<BlockReason> {
        if !command.is_enabled_in(msg.guild()) {
            return Some(BlockReason::Disabled);
        }
        if command.info().guild_only && msg.is_dm() {
            return Some(BlockReason::GuildOnly);
        }
        if let Permission::Denied(reason) = command.has_permission(msg) {
            return Some(BlockReason::Permission(reason));
        }
        command
            .throttle_remaining(msg)
            .map(|remaining| BlockReason::Throttling { remaining })
    }

    async fn collect_args(
        &self,
        command: &RegisteredCommand,
        msg: &CommandMessage,
    ) -> Result<Result<CommandArgs, Cancelled>> {
        if let Some(matches) = msg.pattern_matches() {
            return Ok(Ok(CommandArgs::Pattern(matches.to_vec())));
        }

        let info = command.info();
        let arg_string = msg.arg_string().trim();

        let Some(collector) = command.collector() else {
            return Ok(Ok(match info.args_mode {
                ArgsMode::Single => CommandArgs::Single(arg_string.to_string()),
                ArgsMode::Multiple => CommandArgs::Multiple(parse_args(
                    arg_string,
                    info.args_count,
                    info.args_single_quotes,
                )),
            }));
        };

        let count = match collector.args().last() {
            Some(last) if last.is_infinite() => 0,
            _ => collector.args().len(),
        };
        let provided = parse_args(arg_string, count, info.args_single_quotes);
        let collected = collector.obtain(msg, &provided, None).await?;

        Ok(match collected.outcome {
            Outcome::Obtained(values) => Ok(CommandArgs::Collected(values)),
            Outcome::Cancelled(reason) => Err(Cancelled {
                reason,
                prompted: !collected.prompts.is_empty(),
            }),
        })
    }

    async fn report_error(
        &self,
        command: &RegisteredCommand,
        msg: &CommandMessage,
        err: anyhow::Error,
        request_id: Uuid,
    ) -> DispatchOutcome {
        if let Some(friendly) = err.downcast_ref::<FriendlyError>() {
            debug!("[{request_id}] Friendly error from {}: {friendly}", command.name());
            self.send_reply(msg, &friendly.to_string(), request_id).await;
            return DispatchOutcome::Failed;
        }

        error!("[{request_id}] Error running {}: {err:#}", command.name());
        self.framework.emit(FrameworkEvent::CommandError {
            command: command.name().to_string(),
            user: msg.author(),
            error: err.to_string(),
        });

        let text = format!(
            "An error occurred while running the command: `{err}`\nYou shouldn't ever receive an error like this.\nPlease contact {}.",
            self.owner_list()
        );
        self.send_reply(msg, &text, request_id).await;
        DispatchOutcome::Failed
    }

    fn owner_list(&self) -> String {
        let mut owners: Vec<UserId> = self.framework.owners().iter().copied().collect();
        if owners.is_empty() {
            return "the bot owner".to_string();
        }
        owners.sort_by_key(|id| id.0);
        owners
            .iter()
            .map(|id| format!("<@{}>", id.0))
            .collect::<Vec<_>>()
            .join(" or ")
    }

    async fn send_reply(&self, msg: &CommandMessage, text: &str, request_id: Uuid) {
        if let Err(e) = msg.reply(text).await {
            warn!("[{request_id}] Failed to send reply: {e}");
        }
    }
}

struct Cancelled {
    reason: CancelReason,
    prompted: bool,
}

fn block_message(command: &RegisteredCommand, reason: &BlockReason) -> Option<String> {
    let name = command.name();
    match reason {
        BlockReason::Disabled => Some(format!("The `{name}` command is disabled.")),
        BlockReason::GuildOnly => Some(format!(
            "The `{name}` command must be used in a server channel."
        )),
        BlockReason::Permission(Some(reason)) => Some(reason.clone()),
        BlockReason::Permission(None) => Some(format!(
            "You do not have permission to use the `{name}` command."
        )),
        BlockReason::Throttling { remaining } => Some(format!(
            "You may not use the `{name}` command again for another {:.1} seconds.",
            remaining.as_secs_f64()
        )),
        BlockReason::Inhibited(_) => None,
    }
}
