//! Error types shared across the framework
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.0.0: Registration, registry, and friendly error kinds

use thiserror::Error;

/// Invalid command, group, type, or argument definitions
///
/// These are raised while the registry is being built and are fatal to startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Invalid command \"{name}\": {reason}")]
    InvalidCommand { name: String, reason: String },

    #[error("Invalid group \"{id}\": {reason}")]
    InvalidGroup { id: String, reason: String },

    #[error("Invalid argument \"{key}\": {reason}")]
    InvalidArgument { key: String, reason: String },

    #[error("Invalid argument list: {0}")]
    InvalidArgumentList(String),

    #[error("A command with the name/alias \"{0}\" is already registered.")]
    DuplicateCommand(String),

    #[error("A command with the member name \"{member}\" is already registered in {group}.")]
    DuplicateMember { group: String, member: String },

    #[error("Group \"{0}\" is not registered.")]
    UnknownGroup(String),

    #[error("An argument type with the ID \"{0}\" is already registered.")]
    DuplicateType(String),

    #[error("Argument type \"{type_id}\" for argument \"{key}\" is not registered.")]
    UnknownType { key: String, type_id: String },
}

/// Runtime registry failures (lookups and state changes)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unable to resolve {kind} \"{search}\".")]
    Unresolved { kind: &'static str, search: String },

    #[error("The {kind} \"{name}\" is guarded and cannot be enabled or disabled.")]
    Guarded { kind: &'static str, name: String },
}

/// An error whose message is safe to show to the user verbatim
///
/// Command bodies return this (through `anyhow`) to reply with a plain message
/// instead of the generic failure apology.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct FriendlyError(pub String);

impl FriendlyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_friendly_error_downcasts_through_anyhow() {
        let err: anyhow::Error = FriendlyError::new("nope").into();
        let friendly = err.downcast_ref::<FriendlyError>().unwrap();
        assert_eq!(friendly.to_string(), "nope");
    }

    #[test]
    fn test_duplicate_command_message() {
        let err = RegistrationError::DuplicateCommand("ping".into());
        assert_eq!(
            err.to_string(),
            "A command with the name/alias \"ping\" is already registered."
        );
    }
}
