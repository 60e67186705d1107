//! # Settings
//!
//! Persisted per-guild (and global) overrides: command prefix and the enable
//! state of commands and groups.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//! - **Toggleable**: true (`SETTINGS_DATABASE_PATH` selects SQLite, memory otherwise)
//!
//! ## Changelog
//! - 1.0.0: Provider contract, memory and SQLite providers, event-driven sync

pub mod memory;
pub mod provider;
pub mod sqlite;
pub mod sync;

pub use memory::MemoryProvider;
pub use provider::SettingsProvider;
pub use sqlite::SqliteProvider;
pub use sync::SettingsSync;

use serenity::model::id::GuildId;
use std::fmt;

/// Settings key for the command prefix
pub const PREFIX_KEY: &str = "prefix";

const GLOBAL_KEY: &str = "global";

/// Where a setting applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsScope {
    Global,
    Guild(GuildId),
}

impl SettingsScope {
    pub fn guild(&self) -> Option<GuildId> {
        match self {
            SettingsScope::Global => None,
            SettingsScope::Guild(guild) => Some(*guild),
        }
    }

    /// Row key used by persistent providers
    pub fn storage_key(&self) -> String {
        match self {
            SettingsScope::Global => GLOBAL_KEY.to_string(),
            SettingsScope::Guild(guild) => guild.0.to_string(),
        }
    }

    pub fn from_storage_key(key: &str) -> Option<Self> {
        if key == GLOBAL_KEY {
            return Some(SettingsScope::Global);
        }
        key.parse::<u64>().ok().map(|id| SettingsScope::Guild(GuildId(id)))
    }
}

impl From<Option<GuildId>> for SettingsScope {
    fn from(guild: Option<GuildId>) -> Self {
        guild.map_or(SettingsScope::Global, SettingsScope::Guild)
    }
}

impl fmt::Display for SettingsScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsScope::Global => write!(f, "global"),
            SettingsScope::Guild(guild) => write!(f, "guild {}", guild.0),
        }
    }
}

/// Settings key for a command's enable state
pub fn command_key(name: &str) -> String {
    format!("cmd-{name}")
}

/// Settings key for a group's enable state
pub fn group_key(id: &str) -> String {
    format!("grp-{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_keys() {
        assert_eq!(SettingsScope::Global.storage_key(), "global");
        assert_eq!(SettingsScope::Guild(GuildId(42)).storage_key(), "42");
        assert_eq!(
            SettingsScope::from_storage_key("42"),
            Some(SettingsScope::Guild(GuildId(42)))
        );
        assert_eq!(
            SettingsScope::from_storage_key("global"),
            Some(SettingsScope::Global)
        );
        assert_eq!(SettingsScope::from_storage_key("nope"), None);
    }

    #[test]
    fn test_scope_from_optional_guild() {
        assert_eq!(SettingsScope::from(None), SettingsScope::Global);
        assert_eq!(
            SettingsScope::from(Some(GuildId(1))),
            SettingsScope::Guild(GuildId(1))
        );
    }

    #[test]
    fn test_keys() {
        assert_eq!(command_key("ping"), "cmd-ping");
        assert_eq!(group_key("util"), "grp-util");
    }
}
