//! Utility slash commands: /ping, /uptime, /stats, /avatar, /help, /invite, /listroles

use serenity::async_trait;
use serenity::model::id::{GuildId, UserId};
use std::time::Duration;
use sysinfo::{Pid, System};

use super::registry::COMMANDS;
use super::{CommandContext, SlashCommand};
use crate::embed::{EmbedCard, Reply};
use crate::error::CommandError;
use crate::model::{Invocation, RoleSummary};

/// Upper bound on roles listed by /listroles
pub const MAX_LISTED_ROLES: usize = 20;

pub fn handlers() -> Vec<Box<dyn SlashCommand>> {
    vec![
        Box::new(Ping),
        Box::new(Uptime),
        Box::new(Stats),
        Box::new(Avatar),
        Box::new(Help),
        Box::new(Invite),
        Box::new(ListRoles),
    ]
}

pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{}h {}m {}s", hours, minutes, seconds)
}

fn format_latency(latency: Option<Duration>) -> String {
    match latency {
        Some(latency) => format!("{}ms", latency.as_millis()),
        None => "n/a".to_string(),
    }
}

/// Resident memory of this process in MiB
pub fn process_memory_mb() -> Option<u64> {
    let pid = Pid::from_u32(std::process::id());
    let mut system = System::new();
    system.refresh_process(pid);
    system
        .process(pid)
        .map(|process| process.memory() / 1024 / 1024)
}

pub fn invite_url(bot_id: UserId) -> String {
    format!(
        "https://discord.com/api/oauth2/authorize?client_id={}&permissions=8&scope=bot%20applications.commands",
        bot_id.0
    )
}

pub fn help_text() -> String {
    COMMANDS
        .iter()
        .map(|command| format!("**/{}** - {}", command.name, command.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Highest roles first, without @everyone, capped at [`MAX_LISTED_ROLES`]
pub fn top_roles(guild_id: GuildId, mut roles: Vec<RoleSummary>) -> Vec<RoleSummary> {
    roles.retain(|role| role.id.0 != guild_id.0);
    roles.sort_by(|a, b| b.position.cmp(&a.position).then(a.id.0.cmp(&b.id.0)));
    roles.truncate(MAX_LISTED_ROLES);
    roles
}

pub struct Ping;

#[async_trait]
impl SlashCommand for Ping {
    fn name(&self) -> &'static str {
        "ping"
    }

    async fn execute(
        &self,
        _invocation: &Invocation,
        ctx: &CommandContext<'_>,
    ) -> Result<Reply, CommandError> {
        let latency = ctx.api.latency().await;
        Ok(Reply::embed(
            EmbedCard::new("🏓 Pong!").description(format!("Latency: {}", format_latency(latency))),
        ))
    }
}

pub struct Uptime;

#[async_trait]
impl SlashCommand for Uptime {
    fn name(&self) -> &'static str {
        "uptime"
    }

    async fn execute(
        &self,
        _invocation: &Invocation,
        ctx: &CommandContext<'_>,
    ) -> Result<Reply, CommandError> {
        Ok(Reply::embed(
            EmbedCard::new("Bot Uptime").description(format_uptime(ctx.uptime())),
        ))
    }
}

pub struct Stats;

#[async_trait]
impl SlashCommand for Stats {
    fn name(&self) -> &'static str {
        "stats"
    }

    async fn execute(
        &self,
        _invocation: &Invocation,
        ctx: &CommandContext<'_>,
    ) -> Result<Reply, CommandError> {
        let guilds = ctx.api.guilds();
        let members: u64 = guilds.iter().map(|guild| guild.member_count).sum();
        let channels: usize = guilds.iter().map(|guild| guild.channel_count).sum();
        let latency = ctx.api.latency().await;
        let memory = process_memory_mb()
            .map(|mb| format!("{}MB", mb))
            .unwrap_or_else(|| "n/a".to_string());

        Ok(Reply::embed(
            EmbedCard::new("📊 Bot Statistics")
                .inline_field("🏠 Servers", guilds.len().to_string())
                .inline_field("👥 Users", members.to_string())
                .inline_field("📺 Channels", channels.to_string())
                .inline_field("🏓 Latency", format_latency(latency))
                .inline_field("⏱️ Uptime", format_uptime(ctx.uptime()))
                .inline_field("💾 Memory Usage", memory),
        ))
    }
}

pub struct Avatar;

#[async_trait]
impl SlashCommand for Avatar {
    fn name(&self) -> &'static str {
        "avatar"
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        _ctx: &CommandContext<'_>,
    ) -> Result<Reply, CommandError> {
        let user = invocation
            .user_option("user")
            .unwrap_or(&invocation.invoker);

        Ok(Reply::embed(
            EmbedCard::new(format!("{}'s Avatar", user.name)).image(user.avatar_url.clone()),
        ))
    }
}

pub struct Help;

#[async_trait]
impl SlashCommand for Help {
    fn name(&self) -> &'static str {
        "help"
    }

    async fn execute(
        &self,
        _invocation: &Invocation,
        _ctx: &CommandContext<'_>,
    ) -> Result<Reply, CommandError> {
        Ok(Reply::embed(
            EmbedCard::new("Available Commands").description(help_text()),
        ))
    }
}

pub struct Invite;

#[async_trait]
impl SlashCommand for Invite {
    fn name(&self) -> &'static str {
        "invite"
    }

    async fn execute(
        &self,
        _invocation: &Invocation,
        ctx: &CommandContext<'_>,
    ) -> Result<Reply, CommandError> {
        let url = invite_url(ctx.api.bot_user().id);
        Ok(Reply::embed(EmbedCard::new("Bot Invite Link").description(format!(
            "[Click here to invite me to your server!]({})",
            url
        ))))
    }
}

pub struct ListRoles;

#[async_trait]
impl SlashCommand for ListRoles {
    fn name(&self) -> &'static str {
        "listroles"
    }

    fn guild_only(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        ctx: &CommandContext<'_>,
    ) -> Result<Reply, CommandError> {
        let guild_id = invocation.guild_id.ok_or(CommandError::GuildOnly)?;
        let roles = top_roles(guild_id, ctx.api.roles(guild_id));

        let description = if roles.is_empty() {
            "No roles found".to_string()
        } else {
            roles
                .iter()
                .map(|role| format!("{} - {} members", role.mention(), role.member_count))
                .collect::<Vec<_>>()
                .join("\n")
        };

        Ok(Reply::embed(
            EmbedCard::new("Server Roles").description(description),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Dispatcher;
    use crate::model::OptionValue;
    use crate::testing::{guild, user, FakeDiscord, FakeResponder};
    use serenity::model::id::{ChannelId, RoleId};
    use std::time::Instant;

    async fn run(invocation: &Invocation, api: &FakeDiscord, started_at: Instant) -> Reply {
        let dispatcher = Dispatcher::with_commands(handlers(), started_at);
        let responder = FakeResponder::default();
        dispatcher.dispatch(invocation, api, &responder).await.unwrap();
        assert!(api.calls().is_empty(), "informational commands never mutate");
        responder.final_reply().unwrap()
    }

    fn role(id: u64, position: i64) -> RoleSummary {
        RoleSummary {
            id: RoleId(id),
            name: format!("role-{}", id),
            position,
            member_count: id as usize,
        }
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0h 0m 0s");
        assert_eq!(format_uptime(Duration::from_secs(3725)), "1h 2m 5s");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "25h 1m 1s");
    }

    #[test]
    fn test_top_roles_orders_and_caps() {
        let guild_id = GuildId(1);
        let mut roles: Vec<RoleSummary> = (2..40).map(|id| role(id, id as i64)).collect();
        roles.push(role(1, 0));

        let top = top_roles(guild_id, roles);

        assert_eq!(top.len(), MAX_LISTED_ROLES);
        assert!(top.iter().all(|r| r.id != RoleId(1)));
        assert!(top.windows(2).all(|pair| pair[0].position > pair[1].position));
        assert_eq!(top[0].id, RoleId(39));
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = help_text();
        assert_eq!(help.lines().count(), COMMANDS.len());
        assert!(help.contains("**/mute** - Mute a user"));
    }

    #[test]
    fn test_invite_url() {
        assert_eq!(
            invite_url(UserId(900)),
            "https://discord.com/api/oauth2/authorize?client_id=900&permissions=8&scope=bot%20applications.commands"
        );
    }

    #[tokio::test]
    async fn test_avatar_defaults_to_invoker() {
        let api = FakeDiscord::new();
        let invocation = Invocation::new("avatar", user(1, "kermit"), ChannelId(2));

        let reply = run(&invocation, &api, Instant::now()).await;
        let card = reply.embed.unwrap();

        assert_eq!(card.title, "kermit's Avatar");
        assert_eq!(card.image, Some(user(1, "kermit").avatar_url));
    }

    #[tokio::test]
    async fn test_avatar_of_other_user() {
        let api = FakeDiscord::new();
        let invocation = Invocation::new("avatar", user(1, "kermit"), ChannelId(2))
            .with_option("user", OptionValue::User(user(3, "piggy")));

        let card = run(&invocation, &api, Instant::now()).await.embed.unwrap();

        assert_eq!(card.title, "piggy's Avatar");
        assert_eq!(card.image, Some(user(3, "piggy").avatar_url));
    }

    #[tokio::test]
    async fn test_ping_reports_latency() {
        let api = FakeDiscord {
            latency: Some(Duration::from_millis(42)),
            ..FakeDiscord::new()
        };
        let invocation = Invocation::new("ping", user(1, "kermit"), ChannelId(2));

        let reply = run(&invocation, &api, Instant::now()).await;

        assert!(!reply.is_private());
        assert!(reply.text().contains("Latency: 42ms"));
    }

    #[tokio::test]
    async fn test_uptime_since_start() {
        let api = FakeDiscord::new();
        let started_at = Instant::now()
            .checked_sub(Duration::from_secs(3725))
            .unwrap();
        let invocation = Invocation::new("uptime", user(1, "kermit"), ChannelId(2));

        let reply = run(&invocation, &api, started_at).await;

        assert!(reply.text().contains("1h 2m 5s"));
    }

    #[tokio::test]
    async fn test_stats_snapshot() {
        let api = FakeDiscord {
            guilds: vec![guild(1, "one", 10), guild(2, "two", 32)],
            ..FakeDiscord::new()
        };
        let invocation = Invocation::new("stats", user(1, "kermit"), ChannelId(2));

        let card = run(&invocation, &api, Instant::now()).await.embed.unwrap();

        assert_eq!(card.field_value("🏠 Servers"), Some("2"));
        assert_eq!(card.field_value("👥 Users"), Some("42"));
        assert_eq!(card.field_value("📺 Channels"), Some("6"));
        assert_eq!(card.field_value("🏓 Latency"), Some("n/a"));
        assert_eq!(card.fields.len(), 6);
    }

    #[tokio::test]
    async fn test_listroles() {
        let api = FakeDiscord {
            roles: vec![role(5, 1), role(10, 0), role(7, 3)],
            ..FakeDiscord::new()
        };
        let invocation =
            Invocation::new("listroles", user(1, "kermit"), ChannelId(2)).in_guild(GuildId(10));

        let reply = run(&invocation, &api, Instant::now()).await;

        assert_eq!(
            reply.embed.unwrap().description.unwrap(),
            "<@&7> - 7 members\n<@&5> - 5 members"
        );
    }

    #[tokio::test]
    async fn test_listroles_empty() {
        let api = FakeDiscord::new();
        let invocation =
            Invocation::new("listroles", user(1, "kermit"), ChannelId(2)).in_guild(GuildId(10));

        let reply = run(&invocation, &api, Instant::now()).await;

        assert!(reply.text().contains("No roles found"));
    }
}
