//! Command groups

use crate::core::error::RegistryError;
use dashmap::DashMap;
use serenity::model::id::GuildId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

pub struct CommandGroup {
    id: String,
    name: RwLock<String>,
    guarded: AtomicBool,
    global_enabled: AtomicBool,
    guild_enabled: DashMap<GuildId, bool>,
}

impl CommandGroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>, guarded: bool) -> Self {
        Self {
            id: id.into(),
            name: RwLock::new(name.into()),
            guarded: AtomicBool::new(guarded),
            global_enabled: AtomicBool::new(true),
            guild_enabled: DashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name
    pub fn name(&self) -> String {
        self.name
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_guarded(&self) -> bool {
        self.guarded.load(Ordering::Relaxed)
    }

    pub(crate) fn update(&self, name: impl Into<String>, guarded: bool) {
        *self
            .name
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = name.into();
        self.guarded.store(guarded, Ordering::Relaxed);
    }

    pub fn is_enabled_in(&self, guild: Option<GuildId>) -> bool {
        if self.is_guarded() {
            return true;
        }
        guild
            .and_then(|g| self.guild_enabled.get(&g).map(|e| *e))
            .unwrap_or_else(|| self.global_enabled.load(Ordering::Relaxed))
    }

    pub fn set_enabled_in(&self, guild: Option<GuildId>, enabled: bool) -> Result<(), RegistryError> {
        if self.is_guarded() {
            return Err(RegistryError::Guarded {
                kind: "group",
                name: self.id.clone(),
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guild_override_falls_back_to_global() {
        let group = CommandGroup::new("fun", "Fun", false);
        let guild = GuildId(5);

        assert!(group.is_enabled_in(Some(guild)));
        group.set_enabled_in(None, false).unwrap();
        assert!(!group.is_enabled_in(Some(guild)));

        group.set_enabled_in(Some(guild), true).unwrap();
        assert!(group.is_enabled_in(Some(guild)));
        assert!(!group.is_enabled_in(Some(GuildId(6))));
    }

    #[test]
    fn test_guarded_group_cannot_change() {
        let group = CommandGroup::new("commands", "Commands", true);
        assert!(group.set_enabled_in(None, false).is_err());
        assert!(group.is_enabled_in(None));
    }

    #[test]
    fn test_update_renames() {
        let group = CommandGroup::new("fun", "Fun", false);
        group.update("Fun Stuff", true);
        assert_eq!(group.name(), "Fun Stuff");
        assert!(group.is_guarded());
    }
}
