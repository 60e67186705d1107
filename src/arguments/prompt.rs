//! Reply routing for interactive argument prompts
//!
//! While an argument collection is in flight for a (user, channel) pair, the
//! dispatcher hands that user's next message in that channel to the waiting
//! prompt instead of treating it as a new command. A reply that arrives while
//! no prompt is open yet is held for the next one.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Hold one early reply per key during argument collection
//! - 1.0.0: Reply waiters and the awaiting set

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use log::debug;
use serenity::model::id::{ChannelId, UserId};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;

/// Who is being prompted, and where
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputKey {
    pub user: UserId,
    pub channel: ChannelId,
}

impl InputKey {
    pub fn new(user: UserId, channel: ChannelId) -> Self {
        Self { user, channel }
    }
}

#[derive(Default)]
pub struct PromptRouter {
    waiters: DashMap<InputKey, oneshot::Sender<String>>,
    awaiting: DashSet<InputKey>,
    held: DashMap<InputKey, String>,
}

impl PromptRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in the next reply for `key`
    ///
    /// Register before sending the prompt so a fast reply is not lost. A held
    /// early reply is consumed instead of waiting.
    pub fn expect_reply(&self, key: InputKey) -> PendingReply<'_> {
        if let Some((_, content)) = self.held.remove(&key) {
            debug!("Using held reply from {} in {}", key.user, key.channel);
            return PendingReply {
                router: self,
                key,
                rx: None,
                held: Some(content),
            };
        }

        let (tx, rx) = oneshot::channel();
        self.waiters.insert(key, tx);
        PendingReply {
            router: self,
            key,
            rx: Some(rx),
            held: None,
        }
    }

    /// Hand `content` to the prompt waiting on `key`
    ///
    /// While `key` is awaiting input but between prompts, the first such reply
    /// is held for the next prompt. Returns false when the content was not
    /// taken.
    pub fn deliver(&self, key: InputKey, content: &str) -> bool {
        if let Some((_, tx)) = self.waiters.remove(&key) {
            return tx.send(content.to_string()).is_ok();
        }
        if !self.awaiting.contains(&key) {
            return false;
        }
        match self.held.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(content.to_string());
                true
            }
        }
    }

    pub fn is_waiting(&self, key: &InputKey) -> bool {
        self.waiters.contains_key(key)
    }

    /// Mark `key` as in the middle of argument collection until the guard drops
    pub fn mark_awaiting(&self, key: InputKey) -> AwaitingGuard<'_> {
        self.awaiting.insert(key);
        AwaitingGuard { router: self, key }
    }

    pub fn is_awaiting(&self, key: &InputKey) -> bool {
        self.awaiting.contains(key)
    }
}

/// A registered wait for one reply
pub struct PendingReply<'a> {
    router: &'a PromptRouter,
    key: InputKey,
    rx: Option<oneshot::Receiver<String>>,
    held: Option<String>,
}

impl PendingReply<'_> {
    /// Wait for the reply, `None` on timeout
    pub async fn recv(mut self, wait: Option<Duration>) -> Option<String> {
        if let Some(content) = self.held.take() {
            return Some(content);
        }
        let rx = self.rx.take()?;
        match wait {
            Some(window) => match timeout(window, rx).await {
                Ok(reply) => reply.ok(),
                Err(_) => {
                    debug!("No reply from {} within {:?}", self.key.user, window);
                    None
                }
            },
            None => rx.await.ok(),
        }
    }
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        // a delivered reply has already removed the entry
        self.router.waiters.remove(&self.key);
    }
}

/// Clears the awaiting mark on drop, including on early returns and errors
pub struct AwaitingGuard<'a> {
    router: &'a PromptRouter,
    key: InputKey,
}

impl Drop for AwaitingGuard<'_> {
    fn drop(&mut self) {
        self.router.awaiting.remove(&self.key);
        self.router.held.remove(&self.key);
    }
}
