// Core layer - config, errors, events, reply utilities
pub mod core;

// Argument descriptors, types, and interactive collection
pub mod arguments;

// Commands, groups, registry, and the dispatcher
pub mod commands;

// Shared runtime state (registry, owners, prefixes, prompt routing, events)
pub mod framework;

// Persisted prefixes and enable state
pub mod settings;

// Outbound messaging
pub mod transport;

#[cfg(test)]
mod test_support;

pub use core::{Config, FriendlyError, FrameworkEvent, RegistrationError, RegistryError};
pub use framework::{Framework, FrameworkBuilder};

pub use arguments::{ArgMap, ArgValue, ArgumentInfo, ArgumentType, CancelReason};
pub use commands::{
    Command, CommandArgs, CommandInfo, CommandMessage, DispatchOutcome, Dispatcher,
    IncomingMessage, Registry,
};
pub use settings::{MemoryProvider, SettingsProvider, SettingsScope, SettingsSync, SqliteProvider};
pub use transport::{SerenityTransport, Transport};
