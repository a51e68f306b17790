//! Owner-only /updatechannel: posts an announcement to every guild.

use log::{info, warn};
use serenity::async_trait;
use serenity::model::id::UserId;
use std::time::Duration;
use tokio::time::sleep;

use super::{CommandContext, SlashCommand};
use crate::discord::DiscordApi;
use crate::embed::{EmbedCard, Reply};
use crate::error::CommandError;
use crate::model::Invocation;

/// Pause between guilds to stay clear of Discord's rate limits
pub const BROADCAST_PACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

impl BroadcastReport {
    pub fn total(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Sends `embed` to one channel per guild, one guild at a time.
///
/// Guilds without a usable channel and failed sends are counted, never fatal.
pub async fn broadcast(api: &dyn DiscordApi, embed: &EmbedCard, pace: Duration) -> BroadcastReport {
    let mut guilds = api.guilds();
    guilds.sort_by_key(|guild| guild.id.0);

    let mut report = BroadcastReport::default();
    for (index, guild) in guilds.iter().enumerate() {
        if index > 0 {
            sleep(pace).await;
        }

        let Some(channel) = api.broadcast_channel(guild.id) else {
            report.failed += 1;
            info!("No suitable channel found in {}", guild.name);
            continue;
        };

        match api.send_embed(channel, embed).await {
            Ok(()) => {
                report.delivered += 1;
                info!("Channel update sent to {} in {}", channel, guild.name);
            }
            Err(e) => {
                report.failed += 1;
                warn!("Failed to send channel update to {}: {}", guild.name, e);
            }
        }
    }

    report
}

pub struct UpdateChannel {
    owner_id: Option<UserId>,
    pace: Duration,
}

impl UpdateChannel {
    pub fn new(owner_id: Option<u64>) -> Self {
        UpdateChannel {
            owner_id: owner_id.map(UserId),
            pace: BROADCAST_PACE,
        }
    }
}

#[async_trait]
impl SlashCommand for UpdateChannel {
    fn name(&self) -> &'static str {
        "updatechannel"
    }

    fn authorize(&self, invocation: &Invocation) -> Result<(), CommandError> {
        if self.owner_id == Some(invocation.invoker.id) {
            Ok(())
        } else {
            Err(CommandError::Denied("Only the bot owner can use this command!"))
        }
    }

    fn defers(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        ctx: &CommandContext<'_>,
    ) -> Result<Reply, CommandError> {
        let message = invocation
            .string_option("message")
            .ok_or(CommandError::MissingOption("message"))?;
        let bot = ctx.api.bot_user();

        let announcement = EmbedCard::new("📢 Bot Update")
            .description(message)
            .footer(format!("Update from {}", bot.tag));

        info!("📢 Broadcasting update from {}", invocation.invoker.tag);
        let report = broadcast(ctx.api, &announcement, self.pace).await;
        info!(
            "📢 Broadcast finished: {} delivered, {} failed",
            report.delivered, report.failed
        );

        Ok(Reply::private_embed(
            EmbedCard::new("Channel Update Results")
                .inline_field("✅ Successful", report.delivered.to_string())
                .inline_field("❌ Failed", report.failed.to_string())
                .inline_field("📊 Total Servers", report.total().to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Dispatcher;
    use crate::model::OptionValue;
    use crate::testing::{guild, user, Call, FakeDiscord, FakeResponder, Response};
    use crate::embed::Visibility;
    use serenity::model::id::{ChannelId, GuildId};
    use std::time::Instant;

    fn dispatcher() -> Dispatcher {
        Dispatcher::with_commands(vec![Box::new(UpdateChannel::new(Some(1)))], Instant::now())
    }

    fn five_guilds_three_reachable() -> FakeDiscord {
        let mut api = FakeDiscord {
            guilds: (1..=5).map(|id| guild(id, &format!("guild-{}", id), 10)).collect(),
            ..FakeDiscord::new()
        };
        api.broadcast_channels.insert(GuildId(1), ChannelId(101));
        api.broadcast_channels.insert(GuildId(3), ChannelId(103));
        api.broadcast_channels.insert(GuildId(4), ChannelId(104));
        api
    }

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_counts_and_paces() {
        let api = five_guilds_three_reachable();
        let embed = EmbedCard::new("📢 Bot Update");

        let started = tokio::time::Instant::now();
        let report = broadcast(&api, &embed, BROADCAST_PACE).await;

        assert_eq!(report, BroadcastReport { delivered: 3, failed: 2 });
        assert!(started.elapsed() >= Duration::from_secs(4));
        assert_eq!(
            api.calls()
                .iter()
                .filter_map(|call| match call {
                    Call::SendEmbed { channel, .. } => Some(*channel),
                    _ => None,
                })
                .collect::<Vec<_>>(),
            vec![ChannelId(101), ChannelId(103), ChannelId(104)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_survives_send_failures() {
        let mut api = five_guilds_three_reachable();
        api.failing_channels.insert(ChannelId(103));

        let report = broadcast(&api, &EmbedCard::new("x"), BROADCAST_PACE).await;

        assert_eq!(report, BroadcastReport { delivered: 2, failed: 3 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_updatechannel_reports_results() {
        let api = five_guilds_three_reachable();
        let responder = FakeResponder::default();
        let invocation = Invocation::new("updatechannel", user(1, "owner"), ChannelId(9))
            .with_option("message", OptionValue::String("v2 is live".into()));

        dispatcher().dispatch(&invocation, &api, &responder).await.unwrap();

        let responses = responder.responses();
        assert_eq!(responses[0], Response::Defer(Visibility::Private));
        let reply = responder.final_reply().unwrap();
        assert!(reply.is_private());
        let card = reply.embed.unwrap();
        assert_eq!(card.field_value("✅ Successful"), Some("3"));
        assert_eq!(card.field_value("❌ Failed"), Some("2"));
        assert_eq!(card.field_value("📊 Total Servers"), Some("5"));
        assert_eq!(api.sent_titles(), vec!["📢 Bot Update"; 3]);
    }

    #[tokio::test]
    async fn test_updatechannel_rejects_non_owner() {
        let api = five_guilds_three_reachable();
        let responder = FakeResponder::default();
        let invocation = Invocation::new("updatechannel", user(2, "intruder"), ChannelId(9))
            .with_option("message", OptionValue::String("hi".into()));

        dispatcher().dispatch(&invocation, &api, &responder).await.unwrap();

        assert_eq!(
            responder.responses(),
            vec![Response::Respond(Reply::private(
                "Only the bot owner can use this command!"
            ))]
        );
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_unset_owner_denies_everyone() {
        let command = UpdateChannel::new(None);
        let invocation = Invocation::new("updatechannel", user(1, "owner"), ChannelId(9));

        assert!(command.authorize(&invocation).is_err());
    }
}
