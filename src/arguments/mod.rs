//! # Argument System
//!
//! Typed argument descriptors, the interactive collection state machine, and
//! the registry-facing argument types.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Union types and registry-backed command/group types
//! - 1.1.0: Infinite arguments with `finish`
//! - 1.0.0: Single-value prompting with cancel and timeout

pub mod argument;
pub mod collector;
pub mod info;
pub mod prompt;
pub mod types;
pub mod value;

pub use argument::Argument;
pub use collector::ArgumentCollector;
pub use info::ArgumentInfo;
pub use prompt::{InputKey, PromptRouter};
pub use types::{builtin_types, ArgumentType, UnionType, Validation};
pub use value::{ArgMap, ArgValue};

use std::fmt;

/// Why an argument collection stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// The user replied `cancel` (or `finish` with nothing collected)
    User,
    /// No reply arrived within the wait window
    Time,
    /// The prompt limit was reached before a valid value arrived
    PromptLimit,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::User => write!(f, "user"),
            CancelReason::Time => write!(f, "time"),
            CancelReason::PromptLimit => write!(f, "promptLimit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Obtained(T),
    Cancelled(CancelReason),
}

/// Result of obtaining one argument or a whole argument list
///
/// Prompts sent and answers received are kept in order, also on cancellation.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected<T> {
    pub outcome: Outcome<T>,
    pub prompts: Vec<String>,
    pub answers: Vec<String>,
}

impl<T> Collected<T> {
    pub fn obtained(value: T, prompts: Vec<String>, answers: Vec<String>) -> Self {
        Self {
            outcome: Outcome::Obtained(value),
            prompts,
            answers,
        }
    }

    pub fn cancelled(reason: CancelReason, prompts: Vec<String>, answers: Vec<String>) -> Self {
        Self {
            outcome: Outcome::Cancelled(reason),
            prompts,
            answers,
        }
    }

    pub fn cancel_reason(&self) -> Option<CancelReason> {
        match self.outcome {
            Outcome::Cancelled(reason) => Some(reason),
            Outcome::Obtained(_) => None,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match &self.outcome {
            Outcome::Obtained(value) => Some(value),
            Outcome::Cancelled(_) => None,
        }
    }
}
