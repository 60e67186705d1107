//! Command plugin trait
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Text commands with collected arguments and pattern triggers
//! - 1.0.0: Initial implementation for modular command handling

use anyhow::Result;
use async_trait::async_trait;

use super::context::CommandMessage;
use super::info::CommandInfo;
use crate::arguments::ArgMap;

/// What a command body receives
#[derive(Debug, Clone, PartialEq)]
pub enum CommandArgs {
    /// Values from the command's argument collector
    Collected(ArgMap),
    /// Capture groups of the pattern that triggered the command
    Pattern(Vec<Option<String>>),
    /// Trimmed argument string, for commands without declared arguments
    Single(String),
    /// Split argument string, for commands without declared arguments
    Multiple(Vec<String>),
}

impl CommandArgs {
    pub fn from_pattern(&self) -> bool {
        matches!(self, CommandArgs::Pattern(_))
    }

    pub fn collected(&self) -> Option<&ArgMap> {
        match self {
            CommandArgs::Collected(map) => Some(map),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    Granted,
    /// Denied, optionally with the reason to show the user
    Denied(Option<String>),
}

/// A text command
///
/// # Example
///
/// ```ignore
/// pub struct EchoCommand;
///
/// #[async_trait]
/// impl Command for EchoCommand {
///     fn info(&self) -> CommandInfo {
///         CommandInfo::new("echo", "util", "Repeats what you say.")
///             .arg(ArgumentInfo::new("text", "What should I say?").of_type("string"))
///     }
///
///     async fn run(&self, _msg: &CommandMessage, args: CommandArgs) -> Result<Option<String>> {
///         let args = args.collected().context("echo takes collected arguments")?;
///         Ok(Some(args.string("text")?.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait Command: Send + Sync {
    fn info(&self) -> CommandInfo;

    /// Run the command once; a returned string is sent as a reply
    async fn run(&self, msg: &CommandMessage, args: CommandArgs) -> Result<Option<String>>;

    /// Extra permission check, consulted after the owner-only rule
    fn has_permission(&self, _msg: &CommandMessage) -> Permission {
        Permission::Granted
    }
}
