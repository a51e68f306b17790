//! Platform-neutral views of the Discord objects the commands work with.

use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use serenity::model::permissions::Permissions;

/// Milliseconds between the Unix epoch and the Discord epoch (2015-01-01)
pub const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

/// Unix time in seconds encoded in a snowflake id
pub fn snowflake_unix_seconds(id: u64) -> i64 {
    (((id >> 22) + DISCORD_EPOCH_MS) / 1000) as i64
}

/// `name#1234` for legacy accounts, the bare name for migrated usernames
pub fn user_tag(name: &str, discriminator: u16) -> String {
    if discriminator == 0 {
        name.to_string()
    } else {
        format!("{}#{:04}", name, discriminator)
    }
}

/// Rewrites a CDN avatar url to request the given size
pub fn sized_avatar_url(url: &str, size: u16) -> String {
    let base = url.split('?').next().unwrap_or(url);
    format!("{}?size={}", base, size)
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserRef {
    pub id: UserId,
    pub name: String,
    pub tag: String,
    pub avatar_url: String,
}

/// The bot's own account
#[derive(Debug, Clone, PartialEq)]
pub struct BotUser {
    pub id: UserId,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    User(UserRef),
    Integer(i64),
    String(String),
    Channel(ChannelId),
}

/// One slash command invocation, detached from the gateway event it came from
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: String,
    pub invoker: UserRef,
    pub permissions: Permissions,
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub options: Vec<(String, OptionValue)>,
}

impl Invocation {
    pub fn new(command: impl Into<String>, invoker: UserRef, channel_id: ChannelId) -> Self {
        Invocation {
            command: command.into(),
            invoker,
            permissions: Permissions::empty(),
            guild_id: None,
            channel_id,
            options: Vec::new(),
        }
    }

    pub fn in_guild(mut self, guild_id: GuildId) -> Self {
        self.guild_id = Some(guild_id);
        self
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.options.push((name.into(), value));
        self
    }

    fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options
            .iter()
            .find(|(option, _)| option == name)
            .map(|(_, value)| value)
    }

    pub fn user_option(&self, name: &str) -> Option<&UserRef> {
        match self.option(name) {
            Some(OptionValue::User(user)) => Some(user),
            _ => None,
        }
    }

    pub fn integer_option(&self, name: &str) -> Option<i64> {
        match self.option(name) {
            Some(OptionValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn string_option(&self, name: &str) -> Option<&str> {
        match self.option(name) {
            Some(OptionValue::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn channel_option(&self, name: &str) -> Option<ChannelId> {
        match self.option(name) {
            Some(OptionValue::Channel(channel)) => Some(*channel),
            _ => None,
        }
    }

    pub fn has_permission(&self, required: Permissions) -> bool {
        self.permissions.contains(required)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuildInfo {
    pub id: GuildId,
    pub name: String,
    pub member_count: u64,
    pub channel_count: usize,
    pub icon_url: Option<String>,
    /// Unix seconds at which the bot joined, when known
    pub joined_at: Option<i64>,
}

impl GuildInfo {
    /// Placeholder for a guild the cache no longer holds
    pub fn unknown(id: GuildId) -> Self {
        GuildInfo {
            id,
            name: "Unknown Server".to_string(),
            member_count: 0,
            channel_count: 0,
            icon_url: None,
            joined_at: None,
        }
    }

    pub fn created_at(&self) -> i64 {
        snowflake_unix_seconds(self.id.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleSummary {
    pub id: RoleId,
    pub name: String,
    pub position: i64,
    pub member_count: usize,
}

impl RoleSummary {
    pub fn mention(&self) -> String {
        format!("<@&{}>", self.id.0)
    }
}
