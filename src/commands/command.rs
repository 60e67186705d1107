//! A command as held by the registry: metadata, handler, collector, and runtime state

use super::context::CommandMessage;
use super::group::CommandGroup;
use super::handler::{Command, Permission};
use super::info::CommandInfo;
use super::throttle::Throttles;
use crate::arguments::ArgumentCollector;
use crate::core::error::RegistryError;
use dashmap::DashMap;
use serenity::model::id::GuildId;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct RegisteredCommand {
    info: CommandInfo,
    handler: Arc<dyn Command>,
    collector: Option<ArgumentCollector>,
    group: Arc<CommandGroup>,
    global_enabled: AtomicBool,
    guild_enabled: DashMap<GuildId, bool>,
    throttles: Option<Throttles>,
}

impl RegisteredCommand {
    pub(crate) fn new(
        info: CommandInfo,
        handler: Arc<dyn Command>,
        collector: Option<ArgumentCollector>,
        group: Arc<CommandGroup>,
    ) -> Self {
        let throttles = info.throttling.map(Throttles::new);
        Self {
            info,
            handler,
            collector,
            group,
            global_enabled: AtomicBool::new(true),
            guild_enabled: DashMap::new(),
            throttles,
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn info(&self) -> &CommandInfo {
        &self.info
    }

    pub fn handler(&self) -> &Arc<dyn Command> {
        &self.handler
    }

    pub fn collector(&self) -> Option<&ArgumentCollector> {
        self.collector.as_ref()
    }

    pub fn group(&self) -> &Arc<CommandGroup> {
        &self.group
    }

    pub fn is_guarded(&self) -> bool {
        self.info.guarded
    }

    /// Usage text after the command name
    pub fn format(&self) -> String {
        match (&self.info.format, &self.collector) {
            (Some(format), _) => format.clone(),
            (None, Some(collector)) => collector.usage(),
            (None, None) => String::new(),
        }
    }

    /// `name format`, trimmed when there is no format
    pub fn invocation(&self) -> String {
        let format = self.format();
        if format.is_empty() {
            self.info.name.clone()
        } else {
            format!("{} {format}", self.info.name)
        }
    }

    /// Whether the command itself is enabled, ignoring its group
    pub fn is_own_enabled_in(&self, guild: Option<GuildId>) -> bool {
        if self.info.guarded {
            return true;
        }
        guild
            .and_then(|g| self.guild_enabled.get(&g).map(|e| *e))
            .unwrap_or_else(|| self.global_enabled.load(Ordering::Relaxed))
    }

    pub fn is_enabled_in(&self, guild: Option<GuildId>) -> bool {
        if self.info.guarded {
            return true;
        }
        self.group.is_enabled_in(guild) && self.is_own_enabled_in(guild)
    }

    pub fn set_enabled_in(&self, guild: Option<GuildId>, enabled: bool) -> Result<(), RegistryError> {
        if self.info.guarded {
            return Err(RegistryError::Guarded {
                kind: "command",
                name: self.info.name.clone(),
            });
        }
        match guild {
            Some(guild) => {
                self.guild_enabled.insert(guild, enabled);
            }
            None => self.global_enabled.store(enabled, Ordering::Relaxed),
        }
        Ok(())
    }

    /// Owners always pass; owner-only commands deny everyone else
    pub fn has_permission(&self, msg: &CommandMessage) -> Permission {
        if msg.is_owner() {
            return Permission::Granted;
        }
        if self.info.owner_only {
            return Permission::Denied(Some(format!(
                "The `{}` command can only be used by the bot owner.",
                self.info.name
            )));
        }
        self.handler.has_permission(msg)
    }

    /// Whether the command can run for `msg`; the global flag alone without one
    pub fn is_usable(&self, msg: Option<&CommandMessage>) -> bool {
        let Some(msg) = msg else {
            return self.global_enabled.load(Ordering::Relaxed);
        };
        if self.info.guild_only && msg.is_dm() {
            return false;
        }
        if self.has_permission(msg) != Permission::Granted {
            return false;
        }
        self.is_enabled_in(msg.guild())
    }

    /// Remaining cooldown when the author has used up the current window
    pub fn throttle_remaining(&self, msg: &CommandMessage) -> Option<Duration> {
        if msg.is_owner() {
            return None;
        }
        self.throttles.as_ref()?.check(msg.author())
    }

    /// Count a use of the command body
    pub fn record_use(&self, msg: &CommandMessage) {
        if msg.is_owner() {
            return;
        }
        if let Some(throttles) = &self.throttles {
            throttles.record_use(msg.author());
        }
    }
}

impl fmt::Debug for RegisteredCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredCommand")
            .field("name", &self.info.name)
            .field("group", &self.group.id())
            .field("guarded", &self.info.guarded)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestBed, OWNER, USER};

    #[test]
    fn test_enable_state_levels() {
        let bed = TestBed::new();
        let ping = bed.command("ping");
        let guild = Some(serenity::model::id::GuildId(77));

        assert!(ping.is_enabled_in(guild));
        ping.set_enabled_in(None, false).unwrap();
        assert!(!ping.is_enabled_in(guild));
        assert!(!ping.is_enabled_in(None));

        ping.set_enabled_in(guild, true).unwrap();
        assert!(ping.is_enabled_in(guild));
        assert!(!ping.is_enabled_in(None));
    }

    #[test]
    fn test_disabled_group_disables_command() {
        let bed = TestBed::new();
        let ping = bed.command("ping");

        ping.group().set_enabled_in(None, false).unwrap();
        assert!(!ping.is_enabled_in(None));
        assert!(ping.is_own_enabled_in(None));
    }

    #[test]
    fn test_guarded_command_rejects_state_change() {
        let bed = TestBed::new();
        let help = bed.command("help");

        assert_eq!(
            help.set_enabled_in(None, false),
            Err(RegistryError::Guarded {
                kind: "command",
                name: "help".into()
            })
        );
        assert!(help.is_enabled_in(None));
    }

    #[test]
    fn test_owner_only_permission() {
        let bed = TestBed::new();
        let enable = bed.command("enable");

        let from_user = bed.message_from(USER, "!enable ping");
        assert_eq!(
            enable.has_permission(&from_user),
            Permission::Denied(Some(
                "The `enable` command can only be used by the bot owner.".into()
            ))
        );
        assert!(!enable.is_usable(Some(&from_user)));

        let from_owner = bed.message_from(OWNER, "!enable ping");
        assert_eq!(enable.has_permission(&from_owner), Permission::Granted);
        assert!(enable.is_usable(Some(&from_owner)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_owner_exempt_from_throttle() {
        let bed = TestBed::new();
        let ping = bed.command("ping");
        let from_owner = bed.message_from(OWNER, "!ping");

        for _ in 0..10 {
            assert_eq!(ping.throttle_remaining(&from_owner), None);
            ping.record_use(&from_owner);
        }
    }

    #[test]
    fn test_invocation_includes_format() {
        let bed = TestBed::new();
        assert_eq!(bed.command("help").invocation(), "help [command]");
        assert_eq!(bed.command("groups").invocation(), "groups");
    }
}
