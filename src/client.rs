//! serenity-backed implementations of [`DiscordApi`] and [`Responder`],
//! plus conversions from gateway payloads into the crate's own types.

use serenity::async_trait;
use serenity::builder::{CreateEmbed, EditMember};
use serenity::cache::Cache;
use serenity::client::bridge::gateway::{ShardId, ShardManager};
use serenity::http::Http;
use serenity::json::hashmap_to_json_map;
use serenity::model::application::interaction::application_command::{
    ApplicationCommandInteraction, CommandDataOptionValue,
};
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::channel::{
    Channel, ChannelType, GuildChannel, PermissionOverwrite, PermissionOverwriteType,
};
use serenity::model::guild::Guild;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use serenity::model::permissions::Permissions;
use serenity::model::user::User;
use serenity::model::Timestamp;
use serenity::prelude::{Context, Mutex, TypeMapKey};
use std::sync::Arc;
use std::time::Duration;

use crate::discord::{send_overwrite, DiscordApi, Responder, SendPermission};
use crate::embed::{EmbedCard, Reply, Visibility};
use crate::error::ApiError;
use crate::model::{
    sized_avatar_url, user_tag, BotUser, GuildInfo, Invocation, OptionValue, RoleSummary, UserRef,
};

pub struct ShardManagerContainer;

impl TypeMapKey for ShardManagerContainer {
    type Value = Arc<Mutex<ShardManager>>;
}

impl From<&User> for UserRef {
    fn from(user: &User) -> Self {
        UserRef {
            id: user.id,
            name: user.name.clone(),
            tag: user_tag(&user.name, user.discriminator),
            avatar_url: sized_avatar_url(&user.face(), 4096),
        }
    }
}

impl From<&Guild> for GuildInfo {
    fn from(guild: &Guild) -> Self {
        GuildInfo {
            id: guild.id,
            name: guild.name.clone(),
            member_count: guild.member_count,
            channel_count: guild.channels.len(),
            icon_url: guild.icon_url(),
            joined_at: Some(guild.joined_at.unix_timestamp()),
        }
    }
}

/// Builds an [`Invocation`] from a slash command interaction
pub fn invocation_from(command: &ApplicationCommandInteraction) -> Invocation {
    let options = command
        .data
        .options
        .iter()
        .filter_map(|option| {
            let value = match option.resolved.as_ref()? {
                CommandDataOptionValue::User(user, _) => OptionValue::User(UserRef::from(user)),
                CommandDataOptionValue::Integer(value) => OptionValue::Integer(*value),
                CommandDataOptionValue::String(value) => OptionValue::String(value.clone()),
                CommandDataOptionValue::Channel(channel) => OptionValue::Channel(channel.id),
                _ => return None,
            };
            Some((option.name.clone(), value))
        })
        .collect();

    Invocation {
        command: command.data.name.clone(),
        invoker: UserRef::from(&command.user),
        permissions: command
            .member
            .as_ref()
            .and_then(|member| member.permissions)
            .unwrap_or_else(Permissions::empty),
        guild_id: command.guild_id,
        channel_id: command.channel_id,
        options,
    }
}

pub fn create_embed(card: &EmbedCard) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed.title(&card.title).colour(card.colour);

    if let Some(description) = &card.description {
        embed.description(description);
    }
    if let Some(url) = &card.image {
        embed.image(url);
    }
    if let Some(url) = &card.thumbnail {
        embed.thumbnail(url);
    }
    for field in &card.fields {
        embed.field(&field.name, &field.value, field.inline);
    }
    if let Some(text) = &card.footer {
        embed.footer(|footer| footer.text(text));
    }
    if let Some(at) = card.timestamp {
        if let Ok(timestamp) = Timestamp::from_unix_timestamp(at.timestamp()) {
            embed.timestamp(timestamp);
        }
    }

    embed
}

fn accepts_messages(kind: ChannelType) -> bool {
    matches!(
        kind,
        ChannelType::Text
            | ChannelType::News
            | ChannelType::PublicThread
            | ChannelType::PrivateThread
            | ChannelType::NewsThread
    )
}

#[derive(Clone)]
pub struct SerenityApi {
    http: Arc<Http>,
    cache: Arc<Cache>,
    shard_manager: Option<Arc<Mutex<ShardManager>>>,
    shard_id: u64,
}

impl SerenityApi {
    pub fn new(
        http: Arc<Http>,
        cache: Arc<Cache>,
        shard_manager: Option<Arc<Mutex<ShardManager>>>,
        shard_id: u64,
    ) -> Self {
        SerenityApi {
            http,
            cache,
            shard_manager,
            shard_id,
        }
    }

    pub async fn from_context(ctx: &Context) -> Self {
        let shard_manager = ctx.data.read().await.get::<ShardManagerContainer>().cloned();
        Self::new(ctx.http.clone(), ctx.cache.clone(), shard_manager, ctx.shard_id)
    }

    fn cache_http(&self) -> (&Arc<Cache>, &Http) {
        (&self.cache, self.http.as_ref())
    }

    fn cached_guilds(&self) -> Vec<Guild> {
        self.cache
            .guilds()
            .into_iter()
            .filter_map(|id| self.cache.guild(id))
            .collect()
    }
}

#[async_trait]
impl DiscordApi for SerenityApi {
    async fn latency(&self) -> Option<Duration> {
        let manager = self.shard_manager.as_ref()?.lock().await;
        let runners = manager.runners.lock().await;
        runners
            .get(&ShardId(self.shard_id))
            .and_then(|runner| runner.latency)
    }

    fn bot_user(&self) -> BotUser {
        let me = self.cache.current_user();
        BotUser {
            id: me.id,
            tag: user_tag(&me.name, me.discriminator),
        }
    }

    fn guilds(&self) -> Vec<GuildInfo> {
        self.cached_guilds().iter().map(GuildInfo::from).collect()
    }

    fn roles(&self, guild_id: GuildId) -> Vec<RoleSummary> {
        let Some(guild) = self.cache.guild(guild_id) else {
            return Vec::new();
        };

        guild
            .roles
            .values()
            .map(|role| RoleSummary {
                id: role.id,
                name: role.name.clone(),
                position: role.position,
                member_count: guild
                    .members
                    .values()
                    .filter(|member| member.roles.contains(&role.id))
                    .count(),
            })
            .collect()
    }

    fn broadcast_channel(&self, guild_id: GuildId) -> Option<ChannelId> {
        let guild = self.cache.guild(guild_id)?;
        let me = guild.members.get(&self.cache.current_user_id())?;

        let mut candidates: Vec<&GuildChannel> = guild
            .channels
            .values()
            .filter_map(|channel| match channel {
                Channel::Guild(channel) if channel.kind == ChannelType::Text => Some(channel),
                _ => None,
            })
            .filter(|channel| {
                guild
                    .user_permissions_in(channel, me)
                    .map_or(false, |permissions| permissions.contains(Permissions::SEND_MESSAGES))
            })
            .collect();
        candidates.sort_by_key(|channel| (channel.position, channel.id.0));

        candidates.first().map(|channel| channel.id)
    }

    async fn ban(&self, guild: GuildId, user: UserId, reason: &str) -> Result<(), ApiError> {
        guild.ban_with_reason(&self.http, user, 0, reason).await?;
        Ok(())
    }

    async fn kick(&self, guild: GuildId, user: UserId, reason: &str) -> Result<(), ApiError> {
        guild.kick_with_reason(&self.http, user, reason).await?;
        Ok(())
    }

    async fn set_timeout(
        &self,
        guild: GuildId,
        user: UserId,
        duration_ms: Option<u64>,
        reason: Option<&str>,
    ) -> Result<(), ApiError> {
        let mut edit = EditMember::default();
        match duration_ms {
            Some(ms) => {
                let until = chrono::Utc::now() + chrono::Duration::milliseconds(ms as i64);
                edit.disable_communication_until(until.to_rfc3339());
            }
            None => {
                edit.enable_communication();
            }
        }

        // GuildId::edit_member has no audit log reason
        let map = hashmap_to_json_map(edit.0);
        self.http.edit_member(guild.0, user.0, &map, reason).await?;
        Ok(())
    }

    async fn set_send_permission(
        &self,
        channel: ChannelId,
        role: RoleId,
        state: SendPermission,
    ) -> Result<(), ApiError> {
        let current = channel
            .to_channel(self.cache_http())
            .await?
            .guild()
            .and_then(|channel| {
                channel.permission_overwrites.into_iter().find(|overwrite| {
                    matches!(overwrite.kind, PermissionOverwriteType::Role(id) if id == role)
                })
            })
            .map(|overwrite| (overwrite.allow, overwrite.deny));

        let (allow, deny) = send_overwrite(current, state);
        channel
            .create_permission(
                &self.http,
                &PermissionOverwrite {
                    allow,
                    deny,
                    kind: PermissionOverwriteType::Role(role),
                },
            )
            .await?;
        Ok(())
    }

    async fn text_channel_name(&self, channel: ChannelId) -> Result<Option<String>, ApiError> {
        match channel.to_channel(self.cache_http()).await? {
            Channel::Guild(channel) if accepts_messages(channel.kind) => Ok(Some(channel.name)),
            Channel::Private(channel) => Ok(Some(channel.name())),
            _ => Ok(None),
        }
    }

    async fn send_embed(&self, channel: ChannelId, card: &EmbedCard) -> Result<(), ApiError> {
        let embed = create_embed(card);
        channel
            .send_message(&self.http, |message| message.set_embed(embed))
            .await?;
        Ok(())
    }
}

/// Answers one application command interaction
pub struct InteractionResponder {
    http: Arc<Http>,
    command: ApplicationCommandInteraction,
}

impl InteractionResponder {
    pub fn new(http: Arc<Http>, command: ApplicationCommandInteraction) -> Self {
        InteractionResponder { http, command }
    }
}

#[async_trait]
impl Responder for InteractionResponder {
    async fn respond(&self, reply: Reply) -> Result<(), ApiError> {
        let private = reply.is_private();
        let embed = reply.embed.as_ref().map(create_embed);

        self.command
            .create_interaction_response(&self.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|message| {
                        message.ephemeral(private);
                        if let Some(content) = reply.content {
                            message.content(content);
                        }
                        if let Some(embed) = embed {
                            message.set_embed(embed);
                        }
                        message
                    })
            })
            .await?;
        Ok(())
    }

    async fn defer(&self, visibility: Visibility) -> Result<(), ApiError> {
        self.command
            .create_interaction_response(&self.http, |response| {
                response
                    .kind(InteractionResponseType::DeferredChannelMessageWithSource)
                    .interaction_response_data(|message| {
                        message.ephemeral(visibility == Visibility::Private)
                    })
            })
            .await?;
        Ok(())
    }

    async fn edit(&self, reply: Reply) -> Result<(), ApiError> {
        let embed = reply.embed.as_ref().map(create_embed);

        self.command
            .edit_original_interaction_response(&self.http, |response| {
                if let Some(content) = reply.content {
                    response.content(content);
                }
                if let Some(embed) = embed {
                    response.set_embed(embed);
                }
                response
            })
            .await?;
        Ok(())
    }
}
