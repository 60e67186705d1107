//! # Command System
//!
//! Text commands invoked by prefix, mention, pattern, or (in DMs) bare name.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Registry of commands and groups, argument collection, dispatcher
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 1.0.0: Initial reorganization with modular command structure

pub mod command;
pub mod context;
pub mod dispatcher;
pub mod group;
pub mod handler;
pub mod handlers;
pub mod info;
pub mod parser;
pub mod registry;
pub mod throttle;

pub use command::RegisteredCommand;
pub use context::{CommandMessage, IncomingMessage};
pub use dispatcher::{BlockReason, DispatchOutcome, Dispatcher, Inhibition, Inhibitor};
pub use group::CommandGroup;
pub use handler::{Command, CommandArgs, Permission};
pub use info::{ArgsMode, CommandInfo};
pub use registry::{Lookup, Registry};
pub use throttle::{Throttles, ThrottlingOptions};
