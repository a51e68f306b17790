//! Graceful shutdown on SIGINT/SIGTERM.

use log::{error, info};
use serenity::async_trait;
use serenity::client::bridge::gateway::ShardManager;
use serenity::prelude::Mutex;
use std::sync::Arc;

use crate::discord::DiscordApi;
use crate::notifier::Notifier;

/// Stops every gateway connection the process holds
#[async_trait]
pub trait Shards: Send + Sync {
    async fn shutdown_all(&self);
}

#[async_trait]
impl Shards for Arc<Mutex<ShardManager>> {
    async fn shutdown_all(&self) {
        self.lock().await.shutdown_all().await;
    }
}

/// Resolves with the name of the first termination signal received
pub async fn shutdown_signal() -> &'static str {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}

/// Announces offline once, then closes every shard.
///
/// Notification failures are logged by the notifier and never stop the shutdown.
pub async fn shut_down(
    signal: &str,
    notifier: &Notifier,
    api: &dyn DiscordApi,
    shards: &dyn Shards,
) -> anyhow::Result<()> {
    info!("🛑 Received {}, shutting down...", signal);
    notifier.offline(api).await;
    shards.shutdown_all().await;
    info!("👋 Shutdown complete");
    Ok(())
}
