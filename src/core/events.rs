//! Framework lifecycle events
//!
//! Events are published on a tokio broadcast channel owned by the
//! [`Framework`](crate::framework::Framework). The settings synchroniser is one
//! subscriber; bots may add their own for auditing.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0

use crate::arguments::CancelReason;
use crate::commands::dispatcher::BlockReason;
use crate::settings::SettingsScope;
use serenity::model::id::{ChannelId, GuildId, UserId};

/// Broadcast channel capacity for framework events
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum FrameworkEvent {
    /// A command body was invoked
    CommandRun {
        command: String,
        user: UserId,
        guild: Option<GuildId>,
        from_pattern: bool,
    },
    /// A command body returned an error
    CommandError {
        command: String,
        user: UserId,
        error: String,
    },
    CommandBlocked {
        command: String,
        user: UserId,
        reason: BlockReason,
    },
    CommandCancelled {
        command: String,
        user: UserId,
        reason: CancelReason,
    },
    UnknownCommand {
        user: UserId,
        channel: ChannelId,
        content: String,
    },
    CommandStatusChange {
        scope: SettingsScope,
        command: String,
        enabled: bool,
    },
    GroupStatusChange {
        scope: SettingsScope,
        group: String,
        enabled: bool,
    },
    /// `prefix: None` means mention-only. `reset` is set when a guild override
    /// was removed and the guild falls back to the global prefix.
    PrefixChange {
        scope: SettingsScope,
        prefix: Option<String>,
        reset: bool,
    },
}
