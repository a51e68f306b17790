use anyhow::Result;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    /// The only user allowed to run `/updatechannel`
    pub owner_id: Option<u64>,
    /// Channel receiving online/offline and guild join/leave notices
    pub notify_channel_id: Option<u64>,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            discord_token: lookup("DISCORD_TOKEN")
                .filter(|token| !token.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("DISCORD_TOKEN environment variable not set"))?,
            owner_id: parse_id("BOT_OWNER_ID", lookup("BOT_OWNER_ID"))?,
            notify_channel_id: parse_id("NOTIFY_CHANNEL_ID", lookup("NOTIFY_CHANNEL_ID"))?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_id(key: &str, value: Option<String>) -> Result<Option<u64>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{} must be a Discord snowflake id, got '{}': {}", key, raw, e)),
    }
}
