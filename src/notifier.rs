//! # Feature: Status Notifications
//!
//! Posts online/offline and guild join/leave notices to one configured channel.
//! Delivery is best effort: failures are logged and never reach users.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Presence tracking so a disconnect followed by shutdown announces offline once

use log::{debug, info, warn};
use serenity::model::id::ChannelId;
use tokio::sync::Mutex;

use crate::discord::DiscordApi;
use crate::embed::{EmbedCard, COLOUR_LEFT, COLOUR_OFFLINE, COLOUR_ONLINE};
use crate::error::NotifyError;
use crate::model::GuildInfo;

/// Last presence the notifier announced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Unknown,
    Online,
    Offline,
}

pub struct Notifier {
    channel: Option<ChannelId>,
    presence: Mutex<Presence>,
}

impl Notifier {
    pub fn new(channel: Option<u64>) -> Self {
        Notifier {
            channel: channel.map(ChannelId),
            presence: Mutex::new(Presence::Unknown),
        }
    }

    pub async fn presence(&self) -> Presence {
        *self.presence.lock().await
    }

    /// Moves to `next`, returning whether anything changed
    async fn transition(&self, next: Presence, allowed_from: &[Presence]) -> bool {
        let mut presence = self.presence.lock().await;
        if *presence == next || !allowed_from.contains(&presence) {
            return false;
        }
        *presence = next;
        true
    }

    /// Announces the bot coming online; repeated calls while online are ignored
    pub async fn online(&self, api: &dyn DiscordApi) {
        if self.transition(Presence::Online, &[Presence::Unknown, Presence::Offline]).await {
            let embed = online_embed(&api.bot_user().tag);
            self.deliver(api, "online", &embed).await;
        }
    }

    /// Announces a reconnect, but only after an offline notice went out
    pub async fn reconnected(&self, api: &dyn DiscordApi) {
        if self.transition(Presence::Online, &[Presence::Offline]).await {
            let embed = online_embed(&api.bot_user().tag);
            self.deliver(api, "online", &embed).await;
        }
    }

    /// Announces the bot going offline at most once per outage
    pub async fn offline(&self, api: &dyn DiscordApi) {
        if self.transition(Presence::Offline, &[Presence::Unknown, Presence::Online]).await {
            let embed = offline_embed(&api.bot_user().tag);
            self.deliver(api, "offline", &embed).await;
        } else {
            debug!("Offline notification already sent, skipping");
        }
    }

    pub async fn guild_joined(&self, api: &dyn DiscordApi, guild: &GuildInfo) {
        let embed = guild_joined_embed(&api.bot_user().tag, guild);
        self.deliver(api, "server join", &embed).await;
    }

    pub async fn guild_left(&self, api: &dyn DiscordApi, guild: &GuildInfo) {
        let embed = guild_left_embed(&api.bot_user().tag, guild);
        self.deliver(api, "server leave", &embed).await;
    }

    async fn deliver(&self, api: &dyn DiscordApi, kind: &str, embed: &EmbedCard) {
        match self.try_deliver(api, embed).await {
            Ok(name) => info!("{} notification sent to channel {}", capitalize(kind), name),
            Err(NotifyError::Disabled) => {
                debug!("No notification channel configured, dropping {} notification", kind)
            }
            Err(e) => warn!("Failed to send {} notification: {}", kind, e),
        }
    }

    async fn try_deliver(&self, api: &dyn DiscordApi, embed: &EmbedCard) -> Result<String, NotifyError> {
        let channel = self.channel.ok_or(NotifyError::Disabled)?;
        let name = api
            .text_channel_name(channel)
            .await?
            .ok_or(NotifyError::NotTextChannel(channel.0))?;
        api.send_embed(channel, embed).await?;
        Ok(name)
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn relative_time(unix_seconds: Option<i64>) -> String {
    match unix_seconds {
        Some(seconds) => format!("<t:{}:R>", seconds),
        None => "Unknown".to_string(),
    }
}

pub fn online_embed(bot_tag: &str) -> EmbedCard {
    EmbedCard::new("🟢 Bot Online")
        .colour(COLOUR_ONLINE)
        .description("The bot is now online and ready to serve!")
        .footer(format!("{} - Online Notification", bot_tag))
}

pub fn offline_embed(bot_tag: &str) -> EmbedCard {
    EmbedCard::new("🔴 Bot Going Offline")
        .colour(COLOUR_OFFLINE)
        .description("The bot is going offline for maintenance or updates. It will be back online soon!")
        .footer(format!("{} - Offline Notification", bot_tag))
}

pub fn guild_joined_embed(bot_tag: &str, guild: &GuildInfo) -> EmbedCard {
    let embed = EmbedCard::new("🎉 Bot Added to New Server")
        .colour(COLOUR_ONLINE)
        .description(format!("The bot has been added to **{}**", guild.name))
        .inline_field("👥 Members", guild.member_count.to_string())
        .inline_field("🆔 Server ID", guild.id.0.to_string())
        .inline_field("📅 Created", relative_time(Some(guild.created_at())))
        .footer(format!("{} - Server Join Notification", bot_tag));

    match &guild.icon_url {
        Some(icon) => embed.thumbnail(icon.clone()),
        None => embed,
    }
}

pub fn guild_left_embed(bot_tag: &str, guild: &GuildInfo) -> EmbedCard {
    let embed = EmbedCard::new("👋 Bot Removed from Server")
        .colour(COLOUR_LEFT)
        .description(format!("The bot has been removed from **{}**", guild.name))
        .inline_field("👥 Members", guild.member_count.to_string())
        .inline_field("🆔 Server ID", guild.id.0.to_string())
        .inline_field("📅 Joined", relative_time(guild.joined_at))
        .footer(format!("{} - Server Leave Notification", bot_tag));

    match &guild.icon_url {
        Some(icon) => embed.thumbnail(icon.clone()),
        None => embed,
    }
}
