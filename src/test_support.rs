//! Shared fixtures for unit tests: a framework with the defaults registered and
//! a scripted in-memory transport.

use crate::arguments::InputKey;
use crate::commands::command::RegisteredCommand;
use crate::commands::context::{CommandMessage, IncomingMessage};
use crate::commands::dispatcher::{DispatchOutcome, Dispatcher, Inhibition};
use crate::commands::registry::Registry;
use crate::framework::Framework;
use crate::transport::{reply_mention, Transport};
use anyhow::Result;
use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const OWNER: UserId = UserId(1);
pub const USER: UserId = UserId(10);
pub const CHANNEL: ChannelId = ChannelId(20);
pub const DM_CHANNEL: ChannelId = ChannelId(21);
pub const GUILD: GuildId = GuildId(30);
pub const BOT: UserId = UserId(999);
pub const BOT_NAME: &str = "Commando";

/// Records everything sent and answers prompts from a script
///
/// When a reply or send goes out while a prompt is waiting on that channel,
/// the next scripted answer is delivered immediately.
pub struct MockTransport {
    framework: Arc<Framework>,
    script: Mutex<VecDeque<String>>,
    sent: Mutex<Vec<String>>,
    directs: Mutex<Vec<(UserId, String)>>,
}

impl MockTransport {
    pub fn new(framework: Arc<Framework>) -> Self {
        Self {
            framework,
            script: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            directs: Mutex::new(Vec::new()),
        }
    }

    pub fn script<I, S>(&self, answers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script
            .lock()
            .unwrap()
            .extend(answers.into_iter().map(Into::into));
    }

    /// Channel messages, in order
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn directs(&self) -> Vec<(UserId, String)> {
        self.directs.lock().unwrap().clone()
    }

    fn answer(&self, key: InputKey) {
        if !self.framework.prompts().is_waiting(&key) {
            return;
        }
        let next = self.script.lock().unwrap().pop_front();
        if let Some(answer) = next {
            self.framework.prompts().deliver(key, &answer);
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, _channel: ChannelId, content: &str) -> Result<()> {
        self.sent.lock().unwrap().push(content.to_string());
        Ok(())
    }

    async fn reply(&self, message: &IncomingMessage, content: &str) -> Result<()> {
        let text = format!("{}{content}", reply_mention(message));
        self.sent.lock().unwrap().push(text);
        self.answer(InputKey::new(message.author_id, message.channel_id));
        Ok(())
    }

    async fn direct_message(&self, user: UserId, content: &str) -> Result<()> {
        self.directs.lock().unwrap().push((user, content.to_string()));
        Ok(())
    }
}

pub struct TestBed {
    pub framework: Arc<Framework>,
    pub transport: Arc<MockTransport>,
    pub dispatcher: Arc<Dispatcher>,
}

impl TestBed {
    pub fn new() -> Self {
        Self::with_registry(|_| {})
    }

    /// Defaults plus whatever `setup` registers
    pub fn with_registry<F>(setup: F) -> Self
    where
        F: FnOnce(&mut Registry),
    {
        let mut builder = Framework::builder()
            .owner(OWNER)
            .prefix(Some("!".to_string()));
        builder
            .registry_mut()
            .register_defaults()
            .expect("default registration");
        setup(builder.registry_mut());

        let framework = builder.build();
        framework.set_bot_user(BOT, BOT_NAME);
        let transport = Arc::new(MockTransport::new(Arc::clone(&framework)));
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&framework)));
        Self {
            framework,
            transport,
            dispatcher,
        }
    }

    pub fn transport_handle(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    pub fn inhibit<F>(&mut self, inhibitor: F)
    where
        F: Fn(&CommandMessage) -> Option<Inhibition> + Send + Sync + 'static,
    {
        Arc::get_mut(&mut self.dispatcher)
            .expect("dispatcher not shared yet")
            .add_inhibitor(inhibitor);
    }

    /// A guild message from `user`
    pub fn incoming(&self, user: UserId, content: &str) -> IncomingMessage {
        IncomingMessage {
            id: MessageId(100),
            author_id: user,
            author_is_bot: false,
            channel_id: CHANNEL,
            guild_id: Some(GUILD),
            content: content.to_string(),
        }
    }

    fn wrap(&self, message: IncomingMessage) -> CommandMessage {
        CommandMessage::new(
            Arc::clone(&self.framework),
            self.transport_handle(),
            message,
        )
    }

    /// A guild message from [`USER`]
    pub fn message(&self, content: &str) -> CommandMessage {
        self.message_from(USER, content)
    }

    pub fn message_from(&self, user: UserId, content: &str) -> CommandMessage {
        self.wrap(self.incoming(user, content))
    }

    pub fn dm(&self, content: &str) -> CommandMessage {
        self.wrap(self.dm_incoming(content))
    }

    fn dm_incoming(&self, content: &str) -> IncomingMessage {
        IncomingMessage {
            channel_id: DM_CHANNEL,
            guild_id: None,
            ..self.incoming(USER, content)
        }
    }

    pub fn command(&self, name: &str) -> Arc<RegisteredCommand> {
        self.framework
            .registry()
            .resolve_command(name)
            .expect("command is registered")
    }

    pub async fn dispatch(&self, content: &str) -> DispatchOutcome {
        self.dispatch_from(USER, content).await
    }

    pub async fn dispatch_from(&self, user: UserId, content: &str) -> DispatchOutcome {
        self.dispatch_incoming(self.incoming(user, content)).await
    }

    pub async fn dispatch_dm(&self, content: &str) -> DispatchOutcome {
        self.dispatch_incoming(self.dm_incoming(content)).await
    }

    pub async fn dispatch_incoming(&self, message: IncomingMessage) -> DispatchOutcome {
        self.dispatcher
            .handle_message(message, self.transport_handle())
            .await
    }

    /// Deliver `answers` from [`USER`] in the guild channel as prompts open up
    pub fn deliver_later<I, S>(&self, answers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let answers: Vec<String> = answers.into_iter().map(Into::into).collect();
        let framework = Arc::clone(&self.framework);
        let key = InputKey::new(USER, CHANNEL);
        tokio::spawn(async move {
            for answer in answers {
                while !framework.prompts().deliver(key, &answer) {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
        });
    }
}
