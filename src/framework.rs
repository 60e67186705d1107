//! # Framework
//!
//! Shared state for one bot: the registry, owners, prefixes, reply routing, and
//! the event stream. Built once at startup and shared behind an `Arc`.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Per-guild prefixes and status-change events
//! - 1.0.0: Registry, owners, and prompt routing

use crate::arguments::PromptRouter;
use crate::commands::command::RegisteredCommand;
use crate::commands::group::CommandGroup;
use crate::commands::registry::Registry;
use crate::core::config::{Config, DEFAULT_PREFIX};
use crate::core::error::RegistryError;
use crate::core::events::{FrameworkEvent, EVENT_CHANNEL_CAPACITY};
use crate::settings::SettingsScope;
use dashmap::DashMap;
use log::{debug, info};
use serenity::model::id::{GuildId, UserId};
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use tokio::sync::broadcast;

/// The bot's own account, known once the gateway is ready
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotUser {
    pub id: UserId,
    pub name: String,
}

pub struct Framework {
    registry: Registry,
    owners: HashSet<UserId>,
    default_prefix: Option<String>,
    /// Overrides of the default prefix; a `None` value means mention-only
    prefixes: DashMap<SettingsScope, Option<String>>,
    unknown_command_response: bool,
    bot_user: OnceLock<BotUser>,
    prompts: PromptRouter,
    events: broadcast::Sender<FrameworkEvent>,
}

impl Framework {
    pub fn builder() -> FrameworkBuilder {
        FrameworkBuilder::new()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn prompts(&self) -> &PromptRouter {
        &self.prompts
    }

    pub fn owners(&self) -> &HashSet<UserId> {
        &self.owners
    }

    pub fn is_owner(&self, user: UserId) -> bool {
        self.owners.contains(&user)
    }

    pub fn unknown_command_response(&self) -> bool {
        self.unknown_command_response
    }

    pub fn bot_user(&self) -> Option<&BotUser> {
        self.bot_user.get()
    }

    /// Record the bot's account; later calls are ignored
    pub fn set_bot_user(&self, id: UserId, name: impl Into<String>) {
        if self.bot_user.set(BotUser { id, name: name.into() }).is_ok() {
            debug!("Bot user set to {id}");
        }
    }

    /// Prefix in effect for a guild (or DMs with `None`)
    pub fn prefix(&self, guild: Option<GuildId>) -> Option<String> {
        if let Some(guild) = guild {
            if let Some(prefix) = self.prefixes.get(&SettingsScope::Guild(guild)) {
                return prefix.clone();
            }
        }
        self.global_prefix()
    }

    pub fn global_prefix(&self) -> Option<String> {
        match self.prefixes.get(&SettingsScope::Global) {
            Some(prefix) => prefix.clone(),
            None => self.default_prefix.clone(),
        }
    }

    /// Set a prefix override; `None` leaves only mention invocation
    pub fn set_prefix(&self, scope: SettingsScope, prefix: Option<String>) {
        self.restore_prefix(scope, prefix.clone());
        info!("Prefix for {scope} set to {prefix:?}");
        self.emit(FrameworkEvent::PrefixChange {
            scope,
            prefix,
            reset: false,
        });
    }

    /// Drop an override so the scope falls back (guild → global → default)
    pub fn reset_prefix(&self, scope: SettingsScope) {
        self.prefixes.remove(&scope);
        let prefix = match scope {
            SettingsScope::Guild(guild) => self.prefix(Some(guild)),
            SettingsScope::Global => self.global_prefix(),
        };
        info!("Prefix for {scope} reset to {prefix:?}");
        self.emit(FrameworkEvent::PrefixChange {
            scope,
            prefix,
            reset: true,
        });
    }

    /// Apply a stored prefix without emitting an event
    pub fn restore_prefix(&self, scope: SettingsScope, prefix: Option<String>) {
        self.prefixes.insert(scope, prefix);
    }

    pub fn set_command_enabled(
        &self,
        command: &RegisteredCommand,
        scope: SettingsScope,
        enabled: bool,
    ) -> Result<(), RegistryError> {
        command.set_enabled_in(scope.guild(), enabled)?;
        info!("Command {} {} in {scope}", command.name(), status(enabled));
        self.emit(FrameworkEvent::CommandStatusChange {
            scope,
            command: command.name().to_string(),
            enabled,
        });
        Ok(())
    }

    pub fn set_group_enabled(
        &self,
        group: &CommandGroup,
        scope: SettingsScope,
        enabled: bool,
    ) -> Result<(), RegistryError> {
        group.set_enabled_in(scope.guild(), enabled)?;
        info!("Group {} {} in {scope}", group.id(), status(enabled));
        self.emit(FrameworkEvent::GroupStatusChange {
            scope,
            group: group.id().to_string(),
            enabled,
        });
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FrameworkEvent> {
        self.events.subscribe()
    }

    /// Publish an event; having no subscribers is fine
    pub fn emit(&self, event: FrameworkEvent) {
        let _ = self.events.send(event);
    }
}

fn status(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}

pub struct FrameworkBuilder {
    registry: Registry,
    owners: HashSet<UserId>,
    prefix: Option<String>,
    unknown_command_response: bool,
}

impl FrameworkBuilder {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            owners: HashSet::new(),
            prefix: Some(DEFAULT_PREFIX.to_string()),
            unknown_command_response: true,
        }
    }

    /// Owners, prefix, unknown-command reply, and argument wait from config
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::new()
            .owners(config.owners.iter().copied())
            .prefix(config.command_prefix.clone())
            .unknown_command_response(config.unknown_command_response);
        builder.registry.set_default_wait(config.prompt_wait_secs);
        builder
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn owner(mut self, owner: UserId) -> Self {
        self.owners.insert(owner);
        self
    }

    pub fn owners(mut self, owners: impl IntoIterator<Item = UserId>) -> Self {
        self.owners.extend(owners);
        self
    }

    pub fn prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix.filter(|p| !p.is_empty());
        self
    }

    pub fn unknown_command_response(mut self, respond: bool) -> Self {
        self.unknown_command_response = respond;
        self
    }

    pub fn build(self) -> Arc<Framework> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Framework {
            registry: self.registry,
            owners: self.owners,
            default_prefix: self.prefix,
            prefixes: DashMap::new(),
            unknown_command_response: self.unknown_command_response,
            bot_user: OnceLock::new(),
            prompts: PromptRouter::new(),
            events,
        })
    }
}

impl Default for FrameworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
