//! The static slash command table and its registration with Discord.

use anyhow::Result;
use log::info;
use serenity::builder::CreateApplicationCommand;
use serenity::http::Http;
use serenity::model::application::command::{Command, CommandOptionType};
use serenity::model::permissions::Permissions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    User,
    Integer,
    String,
    Channel,
}

impl OptionKind {
    fn option_type(self) -> CommandOptionType {
        match self {
            OptionKind::User => CommandOptionType::User,
            OptionKind::Integer => CommandOptionType::Integer,
            OptionKind::String => CommandOptionType::String,
            OptionKind::Channel => CommandOptionType::Channel,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CommandParam {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: OptionKind,
    pub required: bool,
    /// Longest accepted string value, enforced by the Discord client
    pub max_length: Option<u16>,
}

#[derive(Debug, Clone, Copy)]
pub struct CommandDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [CommandParam],
    /// Hides the command from members lacking this permission
    pub default_permission: Option<Permissions>,
}

const fn param(
    name: &'static str,
    description: &'static str,
    kind: OptionKind,
    required: bool,
) -> CommandParam {
    CommandParam {
        name,
        description,
        kind,
        required,
        max_length: None,
    }
}

impl CommandParam {
    const fn max_length(self, max_length: u16) -> Self {
        CommandParam {
            max_length: Some(max_length),
            ..self
        }
    }
}

/// Discord's limit on an embed description
pub const EMBED_DESCRIPTION_LIMIT: u16 = 4096;

/// Every slash command the bot registers, in registration order
pub const COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor {
        name: "avatar",
        description: "Get user avatar",
        params: &[param("user", "The user to get avatar from", OptionKind::User, false)],
        default_permission: None,
    },
    CommandDescriptor {
        name: "help",
        description: "Show all available commands",
        params: &[],
        default_permission: None,
    },
    CommandDescriptor {
        name: "mute",
        description: "Mute a user",
        params: &[
            param("user", "The user to mute", OptionKind::User, true),
            param("duration", "Mute duration in minutes", OptionKind::Integer, true),
            param("reason", "Reason for the mute", OptionKind::String, false),
        ],
        default_permission: Some(Permissions::MODERATE_MEMBERS),
    },
    CommandDescriptor {
        name: "lock",
        description: "Lock a channel",
        params: &[param("channel", "The channel to lock", OptionKind::Channel, false)],
        default_permission: Some(Permissions::MANAGE_CHANNELS),
    },
    CommandDescriptor {
        name: "unlock",
        description: "Unlock a channel",
        params: &[param("channel", "The channel to unlock", OptionKind::Channel, false)],
        default_permission: Some(Permissions::MANAGE_CHANNELS),
    },
    CommandDescriptor {
        name: "ban",
        description: "Ban a user",
        params: &[
            param("user", "The user to ban", OptionKind::User, true),
            param("reason", "Reason for the ban", OptionKind::String, false),
        ],
        default_permission: Some(Permissions::BAN_MEMBERS),
    },
    CommandDescriptor {
        name: "kick",
        description: "Kick a user",
        params: &[
            param("user", "The user to kick", OptionKind::User, true),
            param("reason", "Reason for the kick", OptionKind::String, false),
        ],
        default_permission: Some(Permissions::KICK_MEMBERS),
    },
    CommandDescriptor {
        name: "unmute",
        description: "Unmute a user",
        params: &[param("user", "The user to unmute", OptionKind::User, true)],
        default_permission: Some(Permissions::MODERATE_MEMBERS),
    },
    CommandDescriptor {
        name: "ping",
        description: "Check bot latency",
        params: &[],
        default_permission: None,
    },
    CommandDescriptor {
        name: "uptime",
        description: "Check bot uptime",
        params: &[],
        default_permission: None,
    },
    CommandDescriptor {
        name: "stats",
        description: "Show bot statistics",
        params: &[],
        default_permission: None,
    },
    CommandDescriptor {
        name: "invite",
        description: "Get bot invite link",
        params: &[],
        default_permission: None,
    },
    CommandDescriptor {
        name: "listroles",
        description: "List all roles in the server",
        params: &[],
        default_permission: None,
    },
    CommandDescriptor {
        name: "updatechannel",
        description: "Send update message to channels in all servers (Bot owner only)",
        params: &[param("message", "The update message to send", OptionKind::String, true)
            .max_length(EMBED_DESCRIPTION_LIMIT)],
        default_permission: None,
    },
];

pub fn descriptor(name: &str) -> Option<&'static CommandDescriptor> {
    COMMANDS.iter().find(|command| command.name == name)
}

/// Builds the registration payload for one command
pub fn create_command(descriptor: &CommandDescriptor) -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command
        .name(descriptor.name)
        .description(descriptor.description);

    if let Some(permission) = descriptor.default_permission {
        command.default_member_permissions(permission);
    }

    for param in descriptor.params {
        command.create_option(|option| {
            option
                .name(param.name)
                .description(param.description)
                .kind(param.kind.option_type())
                .required(param.required);
            if let Some(max_length) = param.max_length {
                option.max_length(max_length);
            }
            option
        });
    }

    command
}

/// Creates all slash command definitions
pub fn create_slash_commands() -> Vec<CreateApplicationCommand> {
    COMMANDS.iter().map(create_command).collect()
}

/// Replaces the global command set with [`COMMANDS`]
pub async fn register_global_commands(http: &Http) -> Result<()> {
    let slash_commands = create_slash_commands();

    let registered = Command::set_global_application_commands(http, |commands| {
        for command in slash_commands {
            commands.add_application_command(command);
        }
        commands
    })
    .await?;

    info!("Global slash commands registered successfully ({} commands)", registered.len());
    Ok(())
}
