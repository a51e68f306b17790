//! # Command System
//!
//! Slash command registry and dispatch.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Handler objects per command, typed errors mapped to replies centrally

pub mod broadcast;
pub mod moderation;
pub mod registry;
pub mod utility;

use log::{error, info, warn};
use serenity::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::discord::{DiscordApi, Responder};
use crate::embed::{Reply, Visibility};
use crate::error::{ApiError, CommandError};
use crate::model::Invocation;

pub use registry::{create_slash_commands, register_global_commands, CommandDescriptor, COMMANDS};

pub const UNKNOWN_COMMAND: &str = "Unknown command. Use `/help` to see available commands.";

/// What a handler may use while executing
pub struct CommandContext<'a> {
    pub api: &'a dyn DiscordApi,
    pub started_at: Instant,
}

impl CommandContext<'_> {
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[async_trait]
pub trait SlashCommand: Send + Sync {
    fn name(&self) -> &'static str;

    /// Commands that only make sense inside a guild are refused in DMs before authorization
    fn guild_only(&self) -> bool {
        false
    }

    /// An error is answered privately and ends the invocation
    fn authorize(&self, _invocation: &Invocation) -> Result<(), CommandError> {
        Ok(())
    }

    /// Long-running commands acknowledge first and edit the reply afterwards
    fn defers(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        ctx: &CommandContext<'_>,
    ) -> Result<Reply, CommandError>;
}

pub struct Dispatcher {
    commands: HashMap<&'static str, Box<dyn SlashCommand>>,
    started_at: Instant,
}

impl Dispatcher {
    pub fn new(config: &Config) -> Self {
        let mut commands: Vec<Box<dyn SlashCommand>> = Vec::new();
        commands.extend(moderation::handlers());
        commands.extend(utility::handlers());
        commands.push(Box::new(broadcast::UpdateChannel::new(config.owner_id)));

        Self::with_commands(commands, Instant::now())
    }

    pub fn with_commands(commands: Vec<Box<dyn SlashCommand>>, started_at: Instant) -> Self {
        Dispatcher {
            commands: commands
                .into_iter()
                .map(|command| (command.name(), command))
                .collect(),
            started_at,
        }
    }

    pub fn handles(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub async fn dispatch(
        &self,
        invocation: &Invocation,
        api: &dyn DiscordApi,
        responder: &dyn Responder,
    ) -> Result<(), ApiError> {
        let Some(command) = self.commands.get(invocation.command.as_str()) else {
            warn!(
                "Ignoring unknown slash command '{}' from user: {}",
                invocation.command, invocation.invoker.id
            );
            return responder.respond(Reply::private(UNKNOWN_COMMAND)).await;
        };

        info!(
            "Processing slash command: {} from user: {}",
            invocation.command, invocation.invoker.id
        );

        if command.guild_only() && invocation.guild_id.is_none() {
            return responder
                .respond(Reply::private(CommandError::GuildOnly.user_message()))
                .await;
        }

        if let Err(e) = command.authorize(invocation) {
            info!("🚫 /{} refused for user {}: {}", invocation.command, invocation.invoker.id, e);
            return responder.respond(Reply::private(e.user_message())).await;
        }

        let deferred = command.defers();
        if deferred {
            responder.defer(Visibility::Private).await?;
        }

        let ctx = CommandContext {
            api,
            started_at: self.started_at,
        };
        let reply = match command.execute(invocation, &ctx).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Error handling slash command '{}': {}", invocation.command, e);
                Reply::private(e.user_message())
            }
        };

        if deferred {
            responder.edit(reply).await
        } else {
            responder.respond(reply).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OptionValue;
    use crate::testing::{user, FakeDiscord, FakeResponder, Response};
    use serenity::model::id::{ChannelId, GuildId};
    use serenity::model::permissions::Permissions;

    fn config() -> Config {
        Config {
            discord_token: "token".into(),
            owner_id: Some(1),
            notify_channel_id: None,
            log_level: "info".into(),
        }
    }

    #[test]
    fn test_every_registered_command_has_a_handler() {
        let dispatcher = Dispatcher::new(&config());

        for descriptor in COMMANDS {
            assert!(dispatcher.handles(descriptor.name), "No handler for /{}", descriptor.name);
        }
        assert_eq!(dispatcher.commands.len(), COMMANDS.len());
    }

    #[tokio::test]
    async fn test_unknown_command_replies_privately() {
        let dispatcher = Dispatcher::new(&config());
        let api = FakeDiscord::new();
        let responder = FakeResponder::default();
        let invocation = Invocation::new("dance", user(7, "animal"), ChannelId(3));

        dispatcher.dispatch(&invocation, &api, &responder).await.unwrap();

        assert_eq!(
            responder.responses(),
            vec![Response::Respond(Reply::private(UNKNOWN_COMMAND))]
        );
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_mutation_becomes_generic_private_reply() {
        let dispatcher = Dispatcher::new(&config());
        let api = FakeDiscord::failing();
        let responder = FakeResponder::default();
        let invocation = Invocation::new("kick", user(7, "animal"), ChannelId(3))
            .in_guild(GuildId(10))
            .with_permissions(Permissions::KICK_MEMBERS)
            .with_option("user", OptionValue::User(user(8, "beaker")));

        dispatcher.dispatch(&invocation, &api, &responder).await.unwrap();

        assert_eq!(api.mutation_count(), 1);
        let reply = responder.final_reply().unwrap();
        assert!(reply.is_private());
        assert_eq!(reply.content.as_deref(), Some("Failed to kick user!"));
    }

    #[tokio::test]
    async fn test_deferred_command_edits_reply() {
        let dispatcher = Dispatcher::new(&config());
        let api = FakeDiscord::new();
        let responder = FakeResponder::default();
        let invocation = Invocation::new("updatechannel", user(1, "owner"), ChannelId(3))
            .with_option("message", OptionValue::String("v2 is live".into()));

        dispatcher.dispatch(&invocation, &api, &responder).await.unwrap();

        let responses = responder.responses();
        assert_eq!(responses[0], Response::Defer(Visibility::Private));
        assert!(matches!(responses[1], Response::Edit(_)));
        assert_eq!(responses.len(), 2);
    }
}
