//! Static command metadata
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Patterns and default-handling flag
//! - 1.0.0: Builder-style metadata with validation at registration

use super::throttle::ThrottlingOptions;
use crate::arguments::ArgumentInfo;
use crate::core::error::RegistrationError;
use regex::Regex;
use std::time::Duration;

/// How a command without declared arguments receives its argument string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgsMode {
    /// The whole trimmed argument string
    #[default]
    Single,
    /// The argument string split on whitespace, honouring quotes
    Multiple,
}

/// Metadata describing a command
///
/// ```ignore
/// CommandInfo::new("roll", "util", "Rolls a die.")
///     .alias("r")
///     .arg(ArgumentInfo::new("sides", "How many sides?").of_type("integer").min(2.0))
///     .throttling(3, Duration::from_secs(10))
/// ```
#[derive(Debug, Clone)]
pub struct CommandInfo {
    pub name: String,
    pub aliases: Vec<String>,
    pub group: String,
    pub member_name: String,
    pub description: String,
    /// Usage string shown after the name; derived from `args` when absent
    pub format: Option<String>,
    pub details: Option<String>,
    pub examples: Vec<String>,
    pub guild_only: bool,
    pub owner_only: bool,
    pub guarded: bool,
    pub hidden: bool,
    pub throttling: Option<ThrottlingOptions>,
    pub args: Vec<ArgumentInfo>,
    /// Maximum prompts per argument collection, `None` for unlimited
    pub args_prompt_limit: Option<usize>,
    pub args_mode: ArgsMode,
    /// Split limit for [`ArgsMode::Multiple`]; 0 splits everything
    pub args_count: usize,
    pub args_single_quotes: bool,
    /// Any message matching one of these runs the command
    pub patterns: Vec<Regex>,
    /// Whether prefix and mention invocation is enabled
    pub default_handling: bool,
}

impl CommandInfo {
    pub fn new(
        name: impl Into<String>,
        group: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            member_name: name.clone(),
            name,
            aliases: Vec::new(),
            group: group.into(),
            description: description.into(),
            format: None,
            details: None,
            examples: Vec::new(),
            guild_only: false,
            owner_only: false,
            guarded: false,
            hidden: false,
            throttling: None,
            args: Vec::new(),
            args_prompt_limit: None,
            args_mode: ArgsMode::Single,
            args_count: 0,
            args_single_quotes: true,
            patterns: Vec::new(),
            default_handling: true,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn member_name(mut self, member_name: impl Into<String>) -> Self {
        self.member_name = member_name.into();
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    pub fn guild_only(mut self) -> Self {
        self.guild_only = true;
        self
    }

    pub fn owner_only(mut self) -> Self {
        self.owner_only = true;
        self
    }

    pub fn guarded(mut self) -> Self {
        self.guarded = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn throttling(mut self, usages: u32, duration: Duration) -> Self {
        self.throttling = Some(ThrottlingOptions { usages, duration });
        self
    }

    pub fn arg(mut self, arg: ArgumentInfo) -> Self {
        self.args.push(arg);
        self
    }

    pub fn args_prompt_limit(mut self, limit: usize) -> Self {
        self.args_prompt_limit = Some(limit);
        self
    }

    pub fn args_mode(mut self, mode: ArgsMode) -> Self {
        self.args_mode = mode;
        self
    }

    pub fn args_count(mut self, count: usize) -> Self {
        self.args_count = count;
        self
    }

    pub fn without_single_quotes(mut self) -> Self {
        self.args_single_quotes = false;
        self
    }

    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn without_default_handling(mut self) -> Self {
        self.default_handling = false;
        self
    }

    /// `group:member`
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.group, self.member_name)
    }

    pub(crate) fn validate(&self) -> Result<(), RegistrationError> {
        let invalid = |reason: &str| RegistrationError::InvalidCommand {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.is_empty() || self.name.chars().any(char::is_whitespace) {
            return Err(invalid("name must be a single non-empty word"));
        }
        if self.name != self.name.to_lowercase() {
            return Err(invalid("name must be lowercase"));
        }
        if self
            .aliases
            .iter()
            .any(|a| a.is_empty() || a.chars().any(char::is_whitespace) || *a != a.to_lowercase())
        {
            return Err(invalid("aliases must be lowercase single words"));
        }
        if self.group.is_empty() || self.group != self.group.to_lowercase() {
            return Err(invalid("group must be a lowercase id"));
        }
        if self.member_name.is_empty() || self.member_name != self.member_name.to_lowercase() {
            return Err(invalid("member name must be lowercase"));
        }
        if self.description.trim().is_empty() {
            return Err(invalid("description must not be empty"));
        }
        if let Some(throttling) = &self.throttling {
            if throttling.usages == 0 || throttling.duration.is_zero() {
                return Err(invalid("throttling usages and duration must be positive"));
            }
        }
        Ok(())
    }
}
