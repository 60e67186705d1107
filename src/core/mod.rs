//! # Core Module
//!
//! Configuration, shared error kinds, framework events, and reply utilities.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Add error and events modules for the command framework
//! - 1.0.0: Initial creation with config and response modules

pub mod config;
pub mod error;
pub mod events;
pub mod response;

pub use config::Config;
pub use error::{FriendlyError, RegistrationError, RegistryError};
pub use events::FrameworkEvent;
pub use response::{escape_markdown, split_message, MESSAGE_LIMIT};
