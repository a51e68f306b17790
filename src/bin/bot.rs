use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use serenity::async_trait;
use serenity::client::bridge::gateway::event::ShardStageUpdateEvent;
use serenity::gateway::ConnectionStage;
use serenity::model::application::interaction::Interaction;
use serenity::model::gateway::Ready;
use serenity::model::guild::{Guild, UnavailableGuild};
use serenity::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use warden::client::{invocation_from, InteractionResponder, SerenityApi, ShardManagerContainer};
use warden::commands::{register_global_commands, Dispatcher};
use warden::config::Config;
use warden::model::GuildInfo;
use warden::notifier::Notifier;
use warden::shutdown::{shut_down, shutdown_signal};

struct Handler {
    dispatcher: Arc<Dispatcher>,
    notifier: Arc<Notifier>,
    registered: AtomicBool,
}

impl Handler {
    fn new(dispatcher: Dispatcher, notifier: Arc<Notifier>) -> Self {
        Handler {
            dispatcher: Arc::new(dispatcher),
            notifier,
            registered: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);

        if let Some(shard) = ready.shard {
            info!("⚡ Shard: {}/{}", shard[0] + 1, shard[1]);
        }

        // Ready fires again after every reconnect; register once per process
        if !self.registered.swap(true, Ordering::SeqCst) {
            if let Err(e) = register_global_commands(&ctx.http).await {
                error!("❌ Failed to register global slash commands: {}", e);
            } else {
                info!("✅ Successfully registered slash commands globally");
            }
        }

        let api = SerenityApi::from_context(&ctx).await;
        self.notifier.online(&api).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::ApplicationCommand(command) = interaction else {
            return;
        };

        let invocation = invocation_from(&command);
        let api = SerenityApi::from_context(&ctx).await;
        let responder = InteractionResponder::new(ctx.http.clone(), command);

        if let Err(e) = self.dispatcher.dispatch(&invocation, &api, &responder).await {
            error!("Error handling slash command '{}': {}", invocation.command, e);
        }
    }

    async fn guild_create(&self, ctx: Context, guild: Guild, is_new: bool) {
        if !is_new {
            return;
        }

        info!("➕ Joined guild {} ({})", guild.name, guild.id);
        let api = SerenityApi::from_context(&ctx).await;
        self.notifier.guild_joined(&api, &GuildInfo::from(&guild)).await;
    }

    async fn guild_delete(&self, ctx: Context, incomplete: UnavailableGuild, full: Option<Guild>) {
        if incomplete.unavailable {
            warn!("⚠️ Guild {} became unavailable", incomplete.id);
            return;
        }

        let info = full
            .as_ref()
            .map(GuildInfo::from)
            .unwrap_or_else(|| GuildInfo::unknown(incomplete.id));
        info!("➖ Removed from guild {} ({})", info.name, info.id);

        let api = SerenityApi::from_context(&ctx).await;
        self.notifier.guild_left(&api, &info).await;
    }

    async fn shard_stage_update(&self, ctx: Context, event: ShardStageUpdateEvent) {
        match event.new {
            ConnectionStage::Disconnected => {
                warn!("🔌 Shard {} disconnected", event.shard_id.0);
                let api = SerenityApi::from_context(&ctx).await;
                self.notifier.offline(&api).await;
            }
            ConnectionStage::Connected => {
                let api = SerenityApi::from_context(&ctx).await;
                self.notifier.reconnected(&api).await;
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting Warden Discord Bot...");
    if config.owner_id.is_none() {
        warn!("BOT_OWNER_ID is not set, /updatechannel is disabled");
    }
    if config.notify_channel_id.is_none() {
        warn!("NOTIFY_CHANNEL_ID is not set, status notifications are disabled");
    }

    let notifier = Arc::new(Notifier::new(config.notify_channel_id));
    let handler = Handler::new(Dispatcher::new(&config), notifier.clone());

    let intents = GatewayIntents::GUILDS;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {}", e);
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    {
        let mut data = client.data.write().await;
        data.insert::<ShardManagerContainer>(client.shard_manager.clone());
    }

    let shard_manager = client.shard_manager.clone();
    let api = SerenityApi::new(
        client.cache_and_http.http.clone(),
        client.cache_and_http.cache.clone(),
        Some(shard_manager.clone()),
        0,
    );

    info!("Establishing WebSocket connection to Discord gateway...");
    info!("Gateway intents: {:?}", intents);

    tokio::select! {
        result = client.start() => {
            if let Err(why) = result {
                error!("Gateway connection failed: {:?}", why);
                return Err(anyhow::anyhow!("Failed to establish gateway connection: {}", why));
            }
        }
        signal = shutdown_signal() => {
            return shut_down(signal, &notifier, &api, &shard_manager).await;
        }
    }

    Ok(())
}
