//! Moderation slash commands: /ban, /kick, /mute, /unmute, /lock, /unlock
//!
//! Each handler checks one permission, performs one Discord call and
//! answers with a public confirmation.

use log::info;
use serenity::async_trait;
use serenity::model::id::{GuildId, RoleId};
use serenity::model::permissions::Permissions;

use super::{CommandContext, SlashCommand};
use crate::discord::SendPermission;
use crate::embed::{EmbedCard, Reply};
use crate::error::CommandError;
use crate::model::{Invocation, UserRef};

pub const NO_REASON: &str = "No reason provided";

/// Discord refuses timeouts longer than 28 days
pub const MAX_MUTE_MINUTES: i64 = 28 * 24 * 60;

pub fn handlers() -> Vec<Box<dyn SlashCommand>> {
    vec![
        Box::new(Ban),
        Box::new(Kick),
        Box::new(Mute),
        Box::new(Unmute),
        Box::new(Lock),
        Box::new(Unlock),
    ]
}

fn require(
    invocation: &Invocation,
    permission: Permissions,
    denial: &'static str,
) -> Result<(), CommandError> {
    if invocation.has_permission(permission) {
        Ok(())
    } else {
        Err(CommandError::Denied(denial))
    }
}

fn guild(invocation: &Invocation) -> Result<GuildId, CommandError> {
    invocation.guild_id.ok_or(CommandError::GuildOnly)
}

fn target(invocation: &Invocation) -> Result<&UserRef, CommandError> {
    invocation
        .user_option("user")
        .ok_or(CommandError::MissingOption("user"))
}

fn reason(invocation: &Invocation) -> &str {
    invocation
        .string_option("reason")
        .filter(|reason| !reason.trim().is_empty())
        .unwrap_or(NO_REASON)
}

pub fn minutes_to_millis(minutes: u64) -> u64 {
    minutes * 60 * 1000
}

pub struct Ban;

#[async_trait]
impl SlashCommand for Ban {
    fn name(&self) -> &'static str {
        "ban"
    }

    fn guild_only(&self) -> bool {
        true
    }

    fn authorize(&self, invocation: &Invocation) -> Result<(), CommandError> {
        require(
            invocation,
            Permissions::BAN_MEMBERS,
            "You do not have permission to ban members!",
        )
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        ctx: &CommandContext<'_>,
    ) -> Result<Reply, CommandError> {
        let guild_id = guild(invocation)?;
        let user = target(invocation)?;
        let reason = reason(invocation);

        ctx.api
            .ban(guild_id, user.id, reason)
            .await
            .map_err(|e| CommandError::mutation("ban user", e))?;

        info!("🔨 {} banned {} in guild {}: {}", invocation.invoker.tag, user.tag, guild_id, reason);
        Ok(Reply::embed(
            EmbedCard::new("User Banned")
                .description(format!("{} has been banned\nReason: {}", user.tag, reason)),
        ))
    }
}

pub struct Kick;

#[async_trait]
impl SlashCommand for Kick {
    fn name(&self) -> &'static str {
        "kick"
    }

    fn guild_only(&self) -> bool {
        true
    }

    fn authorize(&self, invocation: &Invocation) -> Result<(), CommandError> {
        require(
            invocation,
            Permissions::KICK_MEMBERS,
            "You do not have permission to kick members!",
        )
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        ctx: &CommandContext<'_>,
    ) -> Result<Reply, CommandError> {
        let guild_id = guild(invocation)?;
        let user = target(invocation)?;
        let reason = reason(invocation);

        ctx.api
            .kick(guild_id, user.id, reason)
            .await
            .map_err(|e| CommandError::mutation("kick user", e))?;

        info!("👢 {} kicked {} in guild {}: {}", invocation.invoker.tag, user.tag, guild_id, reason);
        Ok(Reply::embed(
            EmbedCard::new("User Kicked")
                .description(format!("{} has been kicked\nReason: {}", user.tag, reason)),
        ))
    }
}

pub struct Mute;

#[async_trait]
impl SlashCommand for Mute {
    fn name(&self) -> &'static str {
        "mute"
    }

    fn guild_only(&self) -> bool {
        true
    }

    fn authorize(&self, invocation: &Invocation) -> Result<(), CommandError> {
        require(
            invocation,
            Permissions::MODERATE_MEMBERS,
            "You do not have permission to mute members!",
        )
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        ctx: &CommandContext<'_>,
    ) -> Result<Reply, CommandError> {
        let guild_id = guild(invocation)?;
        let user = target(invocation)?;
        let minutes = invocation
            .integer_option("duration")
            .ok_or(CommandError::MissingOption("duration"))?;
        if !(1..=MAX_MUTE_MINUTES).contains(&minutes) {
            return Err(CommandError::InvalidOption(format!(
                "Duration must be between 1 and {} minutes!",
                MAX_MUTE_MINUTES
            )));
        }
        let reason = reason(invocation);

        ctx.api
            .set_timeout(guild_id, user.id, Some(minutes_to_millis(minutes as u64)), Some(reason))
            .await
            .map_err(|e| CommandError::mutation("mute user", e))?;

        info!("🔇 {} muted {} for {}m in guild {}", invocation.invoker.tag, user.tag, minutes, guild_id);
        Ok(Reply::embed(EmbedCard::new("User Muted").description(format!(
            "{} has been muted for {} minutes\nReason: {}",
            user.tag, minutes, reason
        ))))
    }
}

pub struct Unmute;

#[async_trait]
impl SlashCommand for Unmute {
    fn name(&self) -> &'static str {
        "unmute"
    }

    fn guild_only(&self) -> bool {
        true
    }

    fn authorize(&self, invocation: &Invocation) -> Result<(), CommandError> {
        require(
            invocation,
            Permissions::MODERATE_MEMBERS,
            "You do not have permission to unmute members!",
        )
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        ctx: &CommandContext<'_>,
    ) -> Result<Reply, CommandError> {
        let guild_id = guild(invocation)?;
        let user = target(invocation)?;

        ctx.api
            .set_timeout(guild_id, user.id, None, None)
            .await
            .map_err(|e| CommandError::mutation("unmute user", e))?;

        info!("🔊 {} unmuted {} in guild {}", invocation.invoker.tag, user.tag, guild_id);
        Ok(Reply::embed(
            EmbedCard::new("User Unmuted").description(format!("{} has been unmuted", user.tag)),
        ))
    }
}

/// Shared body of /lock and /unlock: rewrites the @everyone overwrite
async fn set_channel_lock(
    invocation: &Invocation,
    ctx: &CommandContext<'_>,
    state: SendPermission,
) -> Result<Reply, CommandError> {
    let guild_id = guild(invocation)?;
    let channel = invocation
        .channel_option("channel")
        .unwrap_or(invocation.channel_id);
    // @everyone shares its id with the guild
    let everyone = RoleId(guild_id.0);

    let (action, title, verb) = match state {
        SendPermission::Denied => ("lock channel", "Channel Locked", "locked"),
        SendPermission::Inherit => ("unlock channel", "Channel Unlocked", "unlocked"),
    };

    ctx.api
        .set_send_permission(channel, everyone, state)
        .await
        .map_err(|e| CommandError::mutation(action, e))?;

    info!("🔒 {} {} channel {} in guild {}", invocation.invoker.tag, verb, channel, guild_id);
    Ok(Reply::embed(
        EmbedCard::new(title).description(format!("<#{}> has been {}", channel.0, verb)),
    ))
}

pub struct Lock;

#[async_trait]
impl SlashCommand for Lock {
    fn name(&self) -> &'static str {
        "lock"
    }

    fn guild_only(&self) -> bool {
        true
    }

    fn authorize(&self, invocation: &Invocation) -> Result<(), CommandError> {
        require(
            invocation,
            Permissions::MANAGE_CHANNELS,
            "You do not have permission to lock channels!",
        )
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        ctx: &CommandContext<'_>,
    ) -> Result<Reply, CommandError> {
        set_channel_lock(invocation, ctx, SendPermission::Denied).await
    }
}

pub struct Unlock;

#[async_trait]
impl SlashCommand for Unlock {
    fn name(&self) -> &'static str {
        "unlock"
    }

    fn guild_only(&self) -> bool {
        true
    }

    fn authorize(&self, invocation: &Invocation) -> Result<(), CommandError> {
        require(
            invocation,
            Permissions::MANAGE_CHANNELS,
            "You do not have permission to unlock channels!",
        )
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        ctx: &CommandContext<'_>,
    ) -> Result<Reply, CommandError> {
        set_channel_lock(invocation, ctx, SendPermission::Inherit).await
    }
}
