use thiserror::Error;

/// Failure of a call against the Discord API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Discord(#[from] serenity::Error),
}

/// Why a slash command did not produce its normal reply.
///
/// Every variant maps to exactly one private message through
/// [`CommandError::user_message`]; the underlying cause is only logged.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("permission denied: {0}")]
    Denied(&'static str),
    #[error("failed to {action}: {source}")]
    Mutation {
        action: &'static str,
        #[source]
        source: ApiError,
    },
    #[error("missing required option `{0}`")]
    MissingOption(&'static str),
    #[error("invalid option: {0}")]
    InvalidOption(String),
    #[error("command used outside of a guild")]
    GuildOnly,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CommandError {
    pub fn mutation(action: &'static str, source: ApiError) -> Self {
        CommandError::Mutation { action, source }
    }

    pub fn user_message(&self) -> String {
        match self {
            CommandError::Denied(message) => message.to_string(),
            CommandError::Mutation { action, .. } => format!("Failed to {}!", action),
            CommandError::MissingOption(name) => format!("Missing required option `{}`.", name),
            CommandError::InvalidOption(message) => message.clone(),
            CommandError::GuildOnly => "This command can only be used in a server!".to_string(),
            CommandError::Api(_) => {
                "❌ Sorry, I encountered an error processing your command. Please try again.".to_string()
            }
        }
    }
}

/// Reasons a status notification was not delivered
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no notification channel configured")]
    Disabled,
    #[error("channel {0} does not accept messages")]
    NotTextChannel(u64),
    #[error(transparent)]
    Api(#[from] ApiError),
}
