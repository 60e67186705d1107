//! # Transport
//!
//! Outbound message sink. The framework never talks to the chat platform
//! directly; every reply, prompt, and direct message goes through [`Transport`].
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

use crate::commands::context::IncomingMessage;
use anyhow::Result;
use async_trait::async_trait;
use serenity::http::Http;
use serenity::model::id::{ChannelId, UserId};
use std::sync::Arc;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send plain content to a channel
    async fn send(&self, channel: ChannelId, content: &str) -> Result<()>;

    /// Reply to a message (author mention in guilds, plain in DMs)
    async fn reply(&self, message: &IncomingMessage, content: &str) -> Result<()>;

    /// Send content to a user's DM channel
    async fn direct_message(&self, user: UserId, content: &str) -> Result<()>;
}

/// Text a guild reply is prefixed with, empty in DMs
///
/// Replies are split so that each chunk still fits the message limit once this
/// is prepended.
pub fn reply_mention(message: &IncomingMessage) -> String {
    if message.guild_id.is_some() {
        format!("<@{}>, ", message.author_id.0)
    } else {
        String::new()
    }
}

/// [`Transport`] over serenity's REST client
#[derive(Clone)]
pub struct SerenityTransport {
    http: Arc<Http>,
}

impl SerenityTransport {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for SerenityTransport {
    async fn send(&self, channel: ChannelId, content: &str) -> Result<()> {
        channel.say(&self.http, content).await?;
        Ok(())
    }

    async fn reply(&self, message: &IncomingMessage, content: &str) -> Result<()> {
        let text = format!("{}{content}", reply_mention(message));
        message.channel_id.say(&self.http, text).await?;
        Ok(())
    }

    async fn direct_message(&self, user: UserId, content: &str) -> Result<()> {
        let dm = user.create_dm_channel(&*self.http).await?;
        dm.say(&self.http, content).await?;
        Ok(())
    }
}
