//! The seam between command logic and the Discord client.
//!
//! Handlers and the notifier only talk to [`DiscordApi`] and [`Responder`],
//! so they can be exercised against in-memory fakes.

use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use serenity::model::permissions::Permissions;
use std::time::Duration;

use crate::embed::{EmbedCard, Reply, Visibility};
use crate::error::ApiError;
use crate::model::{BotUser, GuildInfo, RoleSummary};

/// Desired state of `SEND_MESSAGES` in a role's channel overwrite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPermission {
    Denied,
    /// Neither allowed nor denied; falls back to the role's guild permissions
    Inherit,
}

/// Computes the new `(allow, deny)` pair for an overwrite, touching only
/// `SEND_MESSAGES`
pub fn send_overwrite(
    current: Option<(Permissions, Permissions)>,
    state: SendPermission,
) -> (Permissions, Permissions) {
    let (mut allow, mut deny) = current.unwrap_or((Permissions::empty(), Permissions::empty()));
    allow.remove(Permissions::SEND_MESSAGES);
    match state {
        SendPermission::Denied => deny.insert(Permissions::SEND_MESSAGES),
        SendPermission::Inherit => deny.remove(Permissions::SEND_MESSAGES),
    }
    (allow, deny)
}

#[async_trait]
pub trait DiscordApi: Send + Sync {
    /// Last measured gateway heartbeat round trip
    async fn latency(&self) -> Option<Duration>;

    fn bot_user(&self) -> BotUser;

    /// Snapshot of the guilds the bot is connected to
    fn guilds(&self) -> Vec<GuildInfo>;

    fn roles(&self, guild: GuildId) -> Vec<RoleSummary>;

    /// First text channel of the guild where the bot may send messages
    fn broadcast_channel(&self, guild: GuildId) -> Option<ChannelId>;

    async fn ban(&self, guild: GuildId, user: UserId, reason: &str) -> Result<(), ApiError>;

    async fn kick(&self, guild: GuildId, user: UserId, reason: &str) -> Result<(), ApiError>;

    /// Applies a timeout of `duration_ms`, or lifts it when `None`.
    /// `reason` goes to the guild's audit log.
    async fn set_timeout(
        &self,
        guild: GuildId,
        user: UserId,
        duration_ms: Option<u64>,
        reason: Option<&str>,
    ) -> Result<(), ApiError>;

    async fn set_send_permission(
        &self,
        channel: ChannelId,
        role: RoleId,
        state: SendPermission,
    ) -> Result<(), ApiError>;

    /// Name of the channel if it exists and accepts messages
    async fn text_channel_name(&self, channel: ChannelId) -> Result<Option<String>, ApiError>;

    async fn send_embed(&self, channel: ChannelId, embed: &EmbedCard) -> Result<(), ApiError>;
}

/// Replies to the interaction currently being handled
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, reply: Reply) -> Result<(), ApiError>;

    /// Acknowledges the interaction now and answers later through [`Responder::edit`]
    async fn defer(&self, visibility: Visibility) -> Result<(), ApiError>;

    async fn edit(&self, reply: Reply) -> Result<(), ApiError>;
}
