use anyhow::Result;
use dotenvy::dotenv;
use log::{debug, error, info, warn};
use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::sync::Arc;

use commando::commands::{DispatchOutcome, Dispatcher, IncomingMessage};
use commando::core::Config;
use commando::framework::{Framework, FrameworkBuilder};
use commando::settings::{MemoryProvider, SettingsProvider, SettingsSync, SqliteProvider};
use commando::transport::{SerenityTransport, Transport};

struct Handler {
    dispatcher: Arc<Dispatcher>,
}

impl Handler {
    fn new(dispatcher: Dispatcher) -> Self {
        Handler {
            dispatcher: Arc::new(dispatcher),
        }
    }

    fn framework(&self) -> &Arc<Framework> {
        self.dispatcher.framework()
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let transport: Arc<dyn Transport> = Arc::new(SerenityTransport::new(ctx.http.clone()));
        let outcome = self
            .dispatcher
            .handle_message(IncomingMessage::from(&msg), transport)
            .await;

        match outcome {
            DispatchOutcome::Ignored | DispatchOutcome::PromptReply | DispatchOutcome::Awaiting => {}
            other => debug!("Message {} from {} finished as {other:?}", msg.id, msg.author.id),
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);

        if let Some(shard) = ready.shard {
            info!("⚡ Shard: {}/{}", shard[0] + 1, shard[1]);
        }

        self.framework().set_bot_user(ready.user.id, ready.user.name.clone());

        let registry = self.framework().registry();
        info!(
            "📚 {} commands in {} groups",
            registry.len(),
            registry.groups().len()
        );
        if self.framework().owners().is_empty() {
            warn!("No BOT_OWNERS configured; owner-only commands are unusable");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting Commando bot...");

    let mut builder = FrameworkBuilder::from_config(&config);
    builder.registry_mut().register_defaults()?;
    let framework = builder.build();

    let provider: Arc<dyn SettingsProvider> = match &config.settings_database_path {
        Some(path) => {
            info!("💾 Using SQLite settings at {path}");
            Arc::new(SqliteProvider::open(path.as_str()).await?)
        }
        None => {
            info!("💾 SETTINGS_DATABASE_PATH not set - settings are kept in memory");
            Arc::new(MemoryProvider::new())
        }
    };
    let _settings_task = SettingsSync::new(provider, Arc::clone(&framework))
        .start()
        .await?;

    let handler = Handler::new(Dispatcher::new(framework));

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            error!("This could indicate:");
            error!("  - Invalid bot token format");
            error!("  - Network issues reaching Discord API");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Bot configured successfully. Connecting to Discord gateway...");
    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        error!("This could be due to:");
        error!("  - Invalid bot token");
        error!("  - Network connectivity issues");
        error!("  - Discord API outage");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
