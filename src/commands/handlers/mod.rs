//! Built-in command implementations
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 3.0.0: Text commands: ping, help, groups, enable, disable, prefix
//! - 1.0.0: Initial extraction from the monolithic message handler

pub mod admin;
pub mod util;

use std::sync::Arc;

use super::handler::Command;

/// Every built-in command, ready for [`Registry::register_commands`](super::registry::Registry::register_commands)
///
/// Needs the `util` and `commands` groups registered first.
pub fn default_commands() -> Vec<Arc<dyn Command>> {
    vec![
        Arc::new(util::PingCommand),
        Arc::new(util::HelpCommand),
        Arc::new(admin::PrefixCommand),
        Arc::new(admin::GroupsCommand),
        Arc::new(admin::EnableCommand),
        Arc::new(admin::DisableCommand),
    ]
}
