//! Command, group, and argument-type registry
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Groups, argument types, search and resolution helpers
//! - 1.0.0: Initial implementation for handler dispatch

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};

use super::command::RegisteredCommand;
use super::context::CommandMessage;
use super::group::CommandGroup;
use super::handler::Command;
use super::handlers;
use super::info::CommandInfo;
use crate::arguments::{builtin_types, ArgumentCollector, ArgumentType, UnionType};
use crate::core::config::DEFAULT_PROMPT_WAIT_SECS;
use crate::core::error::{RegistrationError, RegistryError};

/// Either an entity already in hand or a search string to resolve
pub enum Lookup<'a, T> {
    Resolved(Arc<T>),
    Search(&'a str),
}

impl<'a, T> From<&'a str> for Lookup<'a, T> {
    fn from(search: &'a str) -> Self {
        Lookup::Search(search)
    }
}

impl<T> From<Arc<T>> for Lookup<'_, T> {
    fn from(entity: Arc<T>) -> Self {
        Lookup::Resolved(entity)
    }
}

impl<T> From<&Arc<T>> for Lookup<'_, T> {
    fn from(entity: &Arc<T>) -> Self {
        Lookup::Resolved(Arc::clone(entity))
    }
}

/// Catalog of commands, groups, and argument types
///
/// Built mutably at startup, then shared read-only inside the
/// [`Framework`](crate::framework::Framework).
///
/// # Example
///
/// ```ignore
/// let mut registry = Registry::new();
/// registry.register_defaults()?;
/// registry.register_group("fun", "Fun", false);
/// registry.register_command(Arc::new(RollCommand))?;
///
/// let found = registry.find_commands(Some("roll"), false, None);
/// ```
pub struct Registry {
    commands: Vec<Arc<RegisteredCommand>>,
    /// Name and alias lookup
    names: HashMap<String, Arc<RegisteredCommand>>,
    groups: Vec<Arc<CommandGroup>>,
    types: HashMap<String, Arc<dyn ArgumentType>>,
    default_wait: u64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            names: HashMap::new(),
            groups: Vec::new(),
            types: HashMap::new(),
            default_wait: DEFAULT_PROMPT_WAIT_SECS,
        }
    }

    /// Reply window for arguments that do not set their own
    pub fn default_wait(&self) -> u64 {
        self.default_wait
    }

    /// Applies to commands registered afterwards
    pub fn set_default_wait(&mut self, secs: u64) {
        self.default_wait = secs;
    }

    /// Register a group, or update the display name and guard of an existing one
    pub fn register_group(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        guarded: bool,
    ) -> Arc<CommandGroup> {
        let id = id.into();
        if let Some(existing) = self.group(&id) {
            existing.update(name, guarded);
            debug!("Updated group {id}");
            return existing;
        }

        let group = Arc::new(CommandGroup::new(id.clone(), name, guarded));
        self.groups.push(Arc::clone(&group));
        debug!("Registered group {id}");
        group
    }

    pub fn register_type(&mut self, kind: Arc<dyn ArgumentType>) -> Result<(), RegistrationError> {
        let id = kind.id().to_string();
        if self.types.contains_key(&id) {
            return Err(RegistrationError::DuplicateType(id));
        }
        debug!("Registered argument type {id}");
        self.types.insert(id, kind);
        Ok(())
    }

    pub fn register_types<I>(&mut self, kinds: I) -> Result<(), RegistrationError>
    where
        I: IntoIterator<Item = Arc<dyn ArgumentType>>,
    {
        for kind in kinds {
            self.register_type(kind)?;
        }
        Ok(())
    }

    /// Register a command under its name and aliases
    ///
    /// The command's group and every argument type it uses must already be
    /// registered.
    pub fn register_command(
        &mut self,
        handler: Arc<dyn Command>,
    ) -> Result<Arc<RegisteredCommand>, RegistrationError> {
        let info = handler.info();
        info.validate()?;

        let group = self
            .group(&info.group)
            .ok_or_else(|| RegistrationError::UnknownGroup(info.group.clone()))?;

        for name in std::iter::once(&info.name).chain(&info.aliases) {
            if self.names.contains_key(name) {
                return Err(RegistrationError::DuplicateCommand(name.clone()));
            }
        }
        if self
            .commands
            .iter()
            .any(|c| c.info().group == info.group && c.info().member_name == info.member_name)
        {
            return Err(RegistrationError::DuplicateMember {
                group: info.group.clone(),
                member: info.member_name.clone(),
            });
        }

        let collector = if info.args.is_empty() {
            None
        } else {
            Some(ArgumentCollector::new(
                info.args.clone(),
                info.args_prompt_limit,
                self,
            )?)
        };

        let command = Arc::new(RegisteredCommand::new(info, handler, collector, group));
        for name in std::iter::once(&command.info().name).chain(&command.info().aliases) {
            self.names.insert(name.clone(), Arc::clone(&command));
        }
        self.commands.push(Arc::clone(&command));
        debug!("Registered command {}", command.info().qualified_name());
        Ok(command)
    }

    pub fn register_commands<I>(&mut self, handlers: I) -> Result<(), RegistrationError>
    where
        I: IntoIterator<Item = Arc<dyn Command>>,
    {
        for handler in handlers {
            self.register_command(handler)?;
        }
        Ok(())
    }

    pub fn register_default_types(&mut self) -> Result<(), RegistrationError> {
        self.register_types(builtin_types())
    }

    pub fn register_default_groups(&mut self) {
        self.register_group("commands", "Commands", true);
        self.register_group("util", "Utility", false);
    }

    pub fn register_default_commands(&mut self) -> Result<(), RegistrationError> {
        self.register_commands(handlers::default_commands())
    }

    /// Built-in types, the `commands` and `util` groups, and the built-in commands
    pub fn register_defaults(&mut self) -> Result<(), RegistrationError> {
        self.register_default_types()?;
        self.register_default_groups();
        self.register_default_commands()?;
        info!(
            "Registered defaults: {} types, {} groups, {} commands",
            self.types.len(),
            self.groups.len(),
            self.commands.len()
        );
        Ok(())
    }

    /// Look up an argument type; `a|b` builds a union of registered types
    pub fn argument_type(&self, id: &str) -> Option<Arc<dyn ArgumentType>> {
        if let Some(kind) = self.types.get(id) {
            return Some(Arc::clone(kind));
        }
        if !id.contains('|') {
            return None;
        }
        let members = id
            .split('|')
            .map(|part| self.types.get(part.trim()).cloned())
            .collect::<Option<Vec<_>>>()?;
        Some(Arc::new(UnionType::new(members)))
    }

    /// Commands in registration order
    pub fn commands(&self) -> &[Arc<RegisteredCommand>] {
        &self.commands
    }

    pub fn groups(&self) -> &[Arc<CommandGroup>] {
        &self.groups
    }

    pub fn group(&self, id: &str) -> Option<Arc<CommandGroup>> {
        self.groups.iter().find(|g| g.id() == id).cloned()
    }

    pub fn group_commands(&self, id: &str) -> Vec<Arc<RegisteredCommand>> {
        self.commands
            .iter()
            .filter(|c| c.group().id() == id)
            .cloned()
            .collect()
    }

    /// Search commands by name, alias, or `group:member`
    ///
    /// Without a search string every command is returned, filtered to those
    /// usable for `msg` when one is given. An inexact search that includes
    /// exactly-matching name or alias returns only that command.
    pub fn find_commands(
        &self,
        search: Option<&str>,
        exact: bool,
        msg: Option<&CommandMessage>,
    ) -> Vec<Arc<RegisteredCommand>> {
        let Some(search) = search.filter(|s| !s.is_empty()) else {
            return self
                .commands
                .iter()
                .filter(|c| msg.is_none() || c.is_usable(msg))
                .cloned()
                .collect();
        };

        let search = search.to_lowercase();
        let matched: Vec<Arc<RegisteredCommand>> = self
            .commands
            .iter()
            .filter(|c| {
                let info = c.info();
                if exact {
                    is_full_match(info, &search)
                } else {
                    info.name.contains(&search)
                        || info.aliases.iter().any(|a| a.contains(&search))
                        || info.qualified_name().contains(&search)
                }
            })
            .cloned()
            .collect();

        if exact {
            return matched;
        }
        match matched.iter().find(|c| is_full_match(c.info(), &search)) {
            Some(command) => vec![Arc::clone(command)],
            None => matched,
        }
    }

    /// Search groups by id or display name
    pub fn find_groups(&self, search: Option<&str>, exact: bool) -> Vec<Arc<CommandGroup>> {
        let Some(search) = search.filter(|s| !s.is_empty()) else {
            return self.groups.clone();
        };

        let search = search.to_lowercase();
        let matched: Vec<Arc<CommandGroup>> = self
            .groups
            .iter()
            .filter(|g| {
                let name = g.name().to_lowercase();
                if exact {
                    g.id() == search || name == search
                } else {
                    g.id().contains(&search) || name.contains(&search)
                }
            })
            .cloned()
            .collect();

        if exact {
            return matched;
        }
        for group in &matched {
            if group.id() == search || group.name().to_lowercase() == search {
                return vec![Arc::clone(group)];
            }
        }
        matched
    }

    /// Resolve to exactly one command
    pub fn resolve_command<'a>(
        &self,
        lookup: impl Into<Lookup<'a, RegisteredCommand>>,
    ) -> Result<Arc<RegisteredCommand>, RegistryError> {
        match lookup.into() {
            Lookup::Resolved(command) => Ok(command),
            Lookup::Search(search) => {
                let mut found = self.find_commands(Some(search), true, None);
                if found.len() == 1 {
                    Ok(found.remove(0))
                } else {
                    Err(RegistryError::Unresolved {
                        kind: "command",
                        search: search.to_string(),
                    })
                }
            }
        }
    }

    /// Resolve to exactly one group
    pub fn resolve_group<'a>(
        &self,
        lookup: impl Into<Lookup<'a, CommandGroup>>,
    ) -> Result<Arc<CommandGroup>, RegistryError> {
        match lookup.into() {
            Lookup::Resolved(group) => Ok(group),
            Lookup::Search(search) => {
                let mut found = self.find_groups(Some(search), true);
                if found.len() == 1 {
                    Ok(found.remove(0))
                } else {
                    Err(RegistryError::Unresolved {
                        kind: "group",
                        search: search.to_string(),
                    })
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn is_full_match(info: &CommandInfo, search: &str) -> bool {
    info.name == search
        || info.aliases.iter().any(|a| a == search)
        || info.qualified_name() == search
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::ArgumentInfo;
    use crate::commands::context::CommandMessage;
    use crate::commands::handler::CommandArgs;
    use crate::commands::info::CommandInfo;
    use anyhow::Result;
    use async_trait::async_trait;

    struct MockCommand {
        info: CommandInfo,
    }

    impl MockCommand {
        fn named(name: &str) -> Arc<dyn Command> {
            Arc::new(MockCommand {
                info: CommandInfo::new(name, "test", "A test command."),
            })
        }

        fn with(info: CommandInfo) -> Arc<dyn Command> {
            Arc::new(MockCommand { info })
        }
    }

    #[async_trait]
    impl Command for MockCommand {
        fn info(&self) -> CommandInfo {
            self.info.clone()
        }

        async fn run(&self, _msg: &CommandMessage, _args: CommandArgs) -> Result<Option<String>> {
            Ok(None)
        }
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register_default_types().unwrap();
        registry.register_group("test", "Test", false);
        registry
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_find_prefers_exact_alias_match() {
        let mut registry = registry();
        registry
            .register_command(MockCommand::with(
                CommandInfo::new("foo", "test", "Foo.").alias("f"),
            ))
            .unwrap();
        registry.register_command(MockCommand::named("bar")).unwrap();

        let found = registry.find_commands(Some("f"), false, None);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "foo");
    }

    #[test]
    fn test_find_inexact_returns_all_substring_matches() {
        let mut registry = registry();
        registry.register_command(MockCommand::named("alpha")).unwrap();
        registry.register_command(MockCommand::named("alphabet")).unwrap();
        registry.register_command(MockCommand::named("beta")).unwrap();

        let names: Vec<String> = registry
            .find_commands(Some("ALP"), false, None)
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["alpha", "alphabet"]);

        let found = registry.find_commands(Some("alpha"), false, None);
        assert_eq!(found.len(), 1);
        assert!(registry.find_commands(Some("alp"), true, None).is_empty());
    }

    #[test]
    fn test_find_by_qualified_name() {
        let mut registry = registry();
        registry
            .register_command(MockCommand::with(
                CommandInfo::new("foo", "test", "Foo.").member_name("first"),
            ))
            .unwrap();

        let found = registry.find_commands(Some("test:first"), true, None);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "foo");
        assert!(registry.find_commands(Some("test:fir"), true, None).is_empty());
    }

    #[test]
    fn test_find_inexact_matches_partial_qualified_name() {
        let mut registry = registry();
        registry.register_command(MockCommand::named("ping")).unwrap();
        registry.register_command(MockCommand::named("pong")).unwrap();

        let found = registry.find_commands(Some("test:pi"), false, None);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "ping");

        let found = registry.find_commands(Some("TEST:P"), false, None);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_find_without_search_returns_all() {
        let mut registry = registry();
        registry.register_command(MockCommand::named("one")).unwrap();
        registry.register_command(MockCommand::named("two")).unwrap();
        assert_eq!(registry.find_commands(None, false, None).len(), 2);
    }

    #[test]
    fn test_duplicate_name_or_alias_is_rejected() {
        let mut registry = registry();
        registry
            .register_command(MockCommand::with(
                CommandInfo::new("foo", "test", "Foo.").alias("f"),
            ))
            .unwrap();

        let err = registry
            .register_command(MockCommand::with(
                CommandInfo::new("fizz", "test", "Fizz.").alias("f"),
            ))
            .err()
            .unwrap();
        assert_eq!(err, RegistrationError::DuplicateCommand("f".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_member_name_is_rejected() {
        let mut registry = registry();
        registry
            .register_command(MockCommand::with(
                CommandInfo::new("foo", "test", "Foo.").member_name("same"),
            ))
            .unwrap();
        let err = registry
            .register_command(MockCommand::with(
                CommandInfo::new("bar", "test", "Bar.").member_name("same"),
            ))
            .err()
            .unwrap();
        assert!(matches!(err, RegistrationError::DuplicateMember { .. }));
    }

    #[test]
    fn test_unknown_group_is_rejected() {
        let mut registry = registry();
        let err = registry
            .register_command(MockCommand::with(CommandInfo::new("x", "nope", "X.")))
            .err()
            .unwrap();
        assert_eq!(err, RegistrationError::UnknownGroup("nope".into()));
    }

    #[test]
    fn test_invalid_arguments_fail_registration() {
        let mut registry = registry();
        let err = registry
            .register_command(MockCommand::with(
                CommandInfo::new("x", "test", "X.")
                    .arg(ArgumentInfo::new("a", "?").of_type("string").infinite())
                    .arg(ArgumentInfo::new("b", "?").of_type("string")),
            ))
            .err()
            .unwrap();
        assert!(matches!(err, RegistrationError::InvalidArgumentList(_)));
    }

    #[test]
    fn test_group_registration_is_idempotent() {
        let mut registry = Registry::new();
        registry.register_group("fun", "Fun", false);
        registry.register_group("fun", "Fun & Games", true);

        assert_eq!(registry.groups().len(), 1);
        let group = registry.group("fun").unwrap();
        assert_eq!(group.name(), "Fun & Games");
        assert!(group.is_guarded());
    }

    #[test]
    fn test_duplicate_type_is_rejected() {
        let mut registry = registry();
        let err = registry.register_default_types().err().unwrap();
        assert!(matches!(err, RegistrationError::DuplicateType(_)));
    }

    #[test]
    fn test_union_type_lookup() {
        let registry = registry();
        let union = registry.argument_type("user|role").unwrap();
        assert_eq!(union.id(), "user|role");
        assert!(registry.argument_type("user|colour").is_none());
    }

    #[test]
    fn test_resolve_command() {
        let mut registry = registry();
        let foo = registry
            .register_command(MockCommand::with(
                CommandInfo::new("foo", "test", "Foo.").alias("f"),
            ))
            .unwrap();

        assert_eq!(registry.resolve_command("F").unwrap().name(), "foo");
        assert_eq!(registry.resolve_command(&foo).unwrap().name(), "foo");
        assert_eq!(
            registry.resolve_command("fo").err().unwrap(),
            RegistryError::Unresolved {
                kind: "command",
                search: "fo".into()
            }
        );
    }

    #[test]
    fn test_find_and_resolve_groups() {
        let mut registry = Registry::new();
        registry.register_default_groups();

        let found = registry.find_groups(Some("util"), false);
        assert_eq!(found.len(), 1);
        assert_eq!(registry.resolve_group("Utility").unwrap().id(), "util");
        assert!(registry.resolve_group("ut").is_err());
        assert_eq!(registry.find_groups(None, false).len(), 2);
    }

    #[test]
    fn test_register_defaults() {
        let mut registry = Registry::new();
        registry.register_defaults().unwrap();

        for name in ["ping", "help", "groups", "enable", "disable", "prefix"] {
            assert!(registry.resolve_command(name).is_ok(), "{name} missing");
        }
        assert!(registry.group("commands").unwrap().is_guarded());
    }
}
