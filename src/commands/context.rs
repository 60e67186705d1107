//! Per-invocation command context
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Message-based context carrying the transport and framework
//! - 1.0.0: Initial implementation with core shared state

use super::command::RegisteredCommand;
use super::parser;
use crate::arguments::InputKey;
use crate::core::response::{split_message, MESSAGE_LIMIT};
use crate::framework::Framework;
use crate::transport::{reply_mention, Transport};
use anyhow::Result;
use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use std::sync::Arc;
use std::time::Duration;

/// The parts of an inbound chat message the framework needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub id: MessageId,
    pub author_id: UserId,
    pub author_is_bot: bool,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub content: String,
}

impl From<&Message> for IncomingMessage {
    fn from(msg: &Message) -> Self {
        Self {
            id: msg.id,
            author_id: msg.author.id,
            author_is_bot: msg.author.bot,
            channel_id: msg.channel_id,
            guild_id: msg.guild_id,
            content: msg.content.clone(),
        }
    }
}

/// An inbound message being handled as a command
#[derive(Clone)]
pub struct CommandMessage {
    message: IncomingMessage,
    transport: Arc<dyn Transport>,
    framework: Arc<Framework>,
    command: Option<Arc<RegisteredCommand>>,
    arg_string: String,
    pattern_matches: Option<Vec<Option<String>>>,
}

impl CommandMessage {
    pub fn new(framework: Arc<Framework>, transport: Arc<dyn Transport>, message: IncomingMessage) -> Self {
        Self {
            message,
            transport,
            framework,
            command: None,
            arg_string: String::new(),
            pattern_matches: None,
        }
    }

    pub fn with_command(mut self, command: Arc<RegisteredCommand>, arg_string: impl Into<String>) -> Self {
        self.command = Some(command);
        self.arg_string = arg_string.into();
        self
    }

    pub fn with_pattern(mut self, command: Arc<RegisteredCommand>, matches: Vec<Option<String>>) -> Self {
        self.command = Some(command);
        self.pattern_matches = Some(matches);
        self
    }

    pub fn message(&self) -> &IncomingMessage {
        &self.message
    }

    pub fn content(&self) -> &str {
        &self.message.content
    }

    pub fn author(&self) -> UserId {
        self.message.author_id
    }

    pub fn channel(&self) -> ChannelId {
        self.message.channel_id
    }

    pub fn guild(&self) -> Option<GuildId> {
        self.message.guild_id
    }

    pub fn is_dm(&self) -> bool {
        self.message.guild_id.is_none()
    }

    pub fn framework(&self) -> &Arc<Framework> {
        &self.framework
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn command(&self) -> Option<&Arc<RegisteredCommand>> {
        self.command.as_ref()
    }

    pub fn arg_string(&self) -> &str {
        &self.arg_string
    }

    pub fn pattern_matches(&self) -> Option<&[Option<String>]> {
        self.pattern_matches.as_deref()
    }

    pub fn is_owner(&self) -> bool {
        self.framework.is_owner(self.message.author_id)
    }

    pub fn input_key(&self) -> InputKey {
        InputKey::new(self.message.author_id, self.message.channel_id)
    }

    /// Reply to the author, split across messages when too long
    pub async fn reply(&self, content: &str) -> Result<()> {
        let limit = MESSAGE_LIMIT - reply_mention(&self.message).len();
        for chunk in split_message(content, limit) {
            self.transport.reply(&self.message, &chunk).await?;
        }
        Ok(())
    }

    /// Send to the channel without addressing the author
    pub async fn say(&self, content: &str) -> Result<()> {
        for chunk in split_message(content, MESSAGE_LIMIT) {
            self.transport.send(self.message.channel_id, &chunk).await?;
        }
        Ok(())
    }

    pub async fn direct(&self, content: &str) -> Result<()> {
        for chunk in split_message(content, MESSAGE_LIMIT) {
            self.transport
                .direct_message(self.message.author_id, &chunk)
                .await?;
        }
        Ok(())
    }

    /// Send `prompt` (if any) and wait for the author's next message in this channel
    ///
    /// Returns `None` when `wait` elapses first.
    pub async fn ask(&self, prompt: Option<&str>, wait: Option<Duration>) -> Result<Option<String>> {
        let pending = self.framework.prompts().expect_reply(self.input_key());
        if let Some(prompt) = prompt {
            self.reply(prompt).await?;
        }
        Ok(pending.recv(wait).await)
    }

    /// How to invoke `command_text` from where this message was sent
    pub fn any_usage(&self, command_text: &str) -> String {
        if self.is_dm() {
            return parser::usage(command_text, None, None);
        }
        let prefix = self.framework.prefix(self.guild());
        let bot = self.framework.bot_user().map(|u| u.name.as_str());
        parser::usage(command_text, prefix.as_deref(), bot)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::response::MESSAGE_LIMIT;
    use crate::test_support::TestBed;

    #[tokio::test]
    async fn test_long_reply_is_split() {
        let bed = TestBed::new();
        let msg = bed.message("!cmd");

        msg.reply(&"a".repeat(4500)).await.unwrap();
        assert_eq!(bed.transport.sent().len(), 3);
    }

    #[tokio::test]
    async fn test_guild_reply_chunks_fit_with_mention() {
        let bed = TestBed::new();
        let msg = bed.message("!cmd");

        msg.reply(&"a".repeat(MESSAGE_LIMIT)).await.unwrap();
        let sent = bed.transport.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|m| m.len() <= MESSAGE_LIMIT));
        assert!(sent.iter().all(|m| m.starts_with("<@10>, ")));
    }

    #[tokio::test]
    async fn test_dm_reply_uses_full_limit() {
        let bed = TestBed::new();
        let msg = bed.dm("cmd");

        msg.reply(&"a".repeat(MESSAGE_LIMIT)).await.unwrap();
        assert_eq!(bed.transport.sent(), vec!["a".repeat(MESSAGE_LIMIT)]);
    }

    #[test]
    fn test_input_key_is_author_and_channel() {
        let bed = TestBed::new();
        let msg = bed.message("!cmd");
        assert_eq!(msg.input_key().user, msg.author());
        assert_eq!(msg.input_key().channel, msg.channel());
    }

    #[test]
    fn test_any_usage_in_guild_uses_prefix() {
        let bed = TestBed::new();
        let msg = bed.message("!cmd");
        assert!(msg.any_usage("help").starts_with("`!help`"));

        let dm = bed.dm("help");
        assert_eq!(dm.any_usage("help"), "`help`");
    }
}
