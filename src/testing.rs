//! Recording fakes for the Discord seam, shared by the unit tests.

use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::discord::{DiscordApi, Responder, SendPermission};
use crate::embed::{EmbedCard, Reply, Visibility};
use crate::error::ApiError;
use crate::model::{BotUser, GuildInfo, RoleSummary, UserRef};

pub const BOT_ID: u64 = 900;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Ban { guild: GuildId, user: UserId, reason: String },
    Kick { guild: GuildId, user: UserId, reason: String },
    Timeout { guild: GuildId, user: UserId, duration_ms: Option<u64>, reason: Option<String> },
    SendPermission { channel: ChannelId, role: RoleId, state: SendPermission },
    SendEmbed { channel: ChannelId, title: String },
}

#[derive(Default)]
pub struct FakeDiscord {
    pub calls: Mutex<Vec<Call>>,
    pub guilds: Vec<GuildInfo>,
    pub roles: Vec<RoleSummary>,
    pub broadcast_channels: HashMap<GuildId, ChannelId>,
    pub text_channels: HashMap<ChannelId, String>,
    pub failing_channels: HashSet<ChannelId>,
    pub latency: Option<Duration>,
    pub fail_mutations: bool,
}

impl FakeDiscord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        FakeDiscord {
            fail_mutations: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| !matches!(call, Call::SendEmbed { .. }))
            .count()
    }

    pub fn sent_titles(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SendEmbed { title, .. } => Some(title),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        if self.fail_mutations {
            Err(ApiError::Discord(serenity::Error::Other("Missing Permissions")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DiscordApi for FakeDiscord {
    async fn latency(&self) -> Option<Duration> {
        self.latency
    }

    fn bot_user(&self) -> BotUser {
        BotUser {
            id: UserId(BOT_ID),
            tag: "Warden#0001".to_string(),
        }
    }

    fn guilds(&self) -> Vec<GuildInfo> {
        self.guilds.clone()
    }

    fn roles(&self, _guild: GuildId) -> Vec<RoleSummary> {
        self.roles.clone()
    }

    fn broadcast_channel(&self, guild: GuildId) -> Option<ChannelId> {
        self.broadcast_channels.get(&guild).copied()
    }

    async fn ban(&self, guild: GuildId, user: UserId, reason: &str) -> Result<(), ApiError> {
        self.record(Call::Ban {
            guild,
            user,
            reason: reason.to_string(),
        })
    }

    async fn kick(&self, guild: GuildId, user: UserId, reason: &str) -> Result<(), ApiError> {
        self.record(Call::Kick {
            guild,
            user,
            reason: reason.to_string(),
        })
    }

    async fn set_timeout(
        &self,
        guild: GuildId,
        user: UserId,
        duration_ms: Option<u64>,
        reason: Option<&str>,
    ) -> Result<(), ApiError> {
        self.record(Call::Timeout {
            guild,
            user,
            duration_ms,
            reason: reason.map(str::to_string),
        })
    }

    async fn set_send_permission(
        &self,
        channel: ChannelId,
        role: RoleId,
        state: SendPermission,
    ) -> Result<(), ApiError> {
        self.record(Call::SendPermission { channel, role, state })
    }

    async fn text_channel_name(&self, channel: ChannelId) -> Result<Option<String>, ApiError> {
        Ok(self.text_channels.get(&channel).cloned())
    }

    async fn send_embed(&self, channel: ChannelId, embed: &EmbedCard) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(Call::SendEmbed {
            channel,
            title: embed.title.clone(),
        });
        if self.failing_channels.contains(&channel) {
            Err(ApiError::Discord(serenity::Error::Other("Missing Access")))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Respond(Reply),
    Defer(Visibility),
    Edit(Reply),
}

#[derive(Default)]
pub struct FakeResponder {
    pub responses: Mutex<Vec<Response>>,
}

impl FakeResponder {
    pub fn responses(&self) -> Vec<Response> {
        self.responses.lock().unwrap().clone()
    }

    /// The reply the user ends up seeing, whether sent directly or by editing
    pub fn final_reply(&self) -> Option<Reply> {
        self.responses()
            .into_iter()
            .rev()
            .find_map(|response| match response {
                Response::Respond(reply) | Response::Edit(reply) => Some(reply),
                Response::Defer(_) => None,
            })
    }
}

#[async_trait]
impl Responder for FakeResponder {
    async fn respond(&self, reply: Reply) -> Result<(), ApiError> {
        self.responses.lock().unwrap().push(Response::Respond(reply));
        Ok(())
    }

    async fn defer(&self, visibility: Visibility) -> Result<(), ApiError> {
        self.responses.lock().unwrap().push(Response::Defer(visibility));
        Ok(())
    }

    async fn edit(&self, reply: Reply) -> Result<(), ApiError> {
        self.responses.lock().unwrap().push(Response::Edit(reply));
        Ok(())
    }
}

pub fn user(id: u64, name: &str) -> UserRef {
    UserRef {
        id: UserId(id),
        name: name.to_string(),
        tag: name.to_string(),
        avatar_url: format!("https://cdn.discordapp.com/avatars/{}/hash.png?size=4096", id),
    }
}

pub fn guild(id: u64, name: &str, members: u64) -> GuildInfo {
    GuildInfo {
        id: GuildId(id),
        name: name.to_string(),
        member_count: members,
        channel_count: 3,
        icon_url: None,
        joined_at: Some(1_700_000_000),
    }
}
