//! Gateway: the main event loop connecting channels, statistics and the
//! AI provider.
//!
//! Includes periodic statistics saves and graceful shutdown.

mod guard;
mod pipeline;

#[cfg(test)]
mod tests;

pub use guard::{validate_message, RateLimiter};

use crate::api::{self, ApiState};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use zapbot_core::{
    config::{ApiConfig, Config, LimitsConfig},
    context::ContextTracker,
    message::{IncomingMessage, OutgoingMessage},
    traits::{Channel, Provider},
};
use zapbot_stats::StatsEngine;

/// The central gateway that routes messages between channels and handlers.
pub struct Gateway {
    pub(super) provider: Arc<dyn Provider>,
    pub(super) channels: HashMap<String, Arc<dyn Channel>>,
    pub(super) stats: StatsEngine,
    pub(super) context: ContextTracker,
    pub(super) limiter: RateLimiter,
    pub(super) limits: LimitsConfig,
    save_interval: Duration,
    api_config: ApiConfig,
    api_state: ApiState,
}

impl Gateway {
    pub fn new(
        provider: Arc<dyn Provider>,
        channels: HashMap<String, Arc<dyn Channel>>,
        stats: StatsEngine,
        config: &Config,
        api_state: ApiState,
    ) -> Self {
        Self {
            provider,
            channels,
            stats,
            context: ContextTracker::new(config.context.max_messages),
            limiter: RateLimiter::from_config(&config.limits),
            limits: config.limits.clone(),
            save_interval: Duration::from_secs(config.stats.save_interval_secs.max(1)),
            api_config: config.api.clone(),
            api_state,
        }
    }

    /// Run the main event loop until Ctrl-C.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "zapbot gateway running | provider: {} | channels: {} | groups: {}",
            self.provider.name(),
            self.channels.keys().cloned().collect::<Vec<_>>().join(", "),
            self.stats.group_count(),
        );

        let (tx, mut rx) = mpsc::channel::<IncomingMessage>(256);

        for (name, channel) in &self.channels {
            let mut channel_rx = channel
                .start()
                .await
                .map_err(|e| anyhow::anyhow!("failed to start channel {name}: {e}"))?;
            let tx = tx.clone();
            let channel_name = name.clone();

            tokio::spawn(async move {
                while let Some(msg) = channel_rx.recv().await {
                    if tx.send(msg).await.is_err() {
                        info!("gateway receiver dropped, stopping {channel_name} forwarder");
                        break;
                    }
                }
            });

            info!("Channel started: {name}");
        }

        drop(tx);

        let save_handle = {
            let stats = self.stats.clone();
            let every = self.save_interval;
            tokio::spawn(async move { Self::periodic_save(stats, every).await })
        };

        let api_handle = {
            let config = self.api_config.clone();
            let state = self.api_state.clone();
            tokio::spawn(async move { api::serve(config, state).await })
        };

        loop {
            tokio::select! {
                Some(incoming) = rx.recv() => {
                    let gw = self.clone();
                    tokio::spawn(async move {
                        gw.handle_message(incoming).await;
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown(&save_handle, &api_handle).await;
        Ok(())
    }

    /// Save every group on a fixed interval. The first tick is skipped.
    async fn periodic_save(stats: StatsEngine, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            stats.save_all().await;
        }
    }

    /// Graceful shutdown: stop background tasks and channels, then write
    /// every group's statistics one last time.
    async fn shutdown(&self, save_handle: &JoinHandle<()>, api_handle: &JoinHandle<()>) {
        info!("Shutting down...");

        save_handle.abort();
        api_handle.abort();

        for (name, channel) in &self.channels {
            if let Err(e) = channel.stop().await {
                warn!("failed to stop channel {name}: {e}");
            }
        }

        let saved = self.stats.save_all().await;
        info!("Shutdown complete ({saved} group(s) saved).");
    }

    /// Send a prepared message through the channel the event came from.
    pub(super) async fn send(&self, incoming: &IncomingMessage, msg: OutgoingMessage) {
        match self.channels.get(&incoming.channel) {
            Some(channel) => {
                if let Err(e) = channel.send(msg).await {
                    error!("failed to send message to {}: {e}", incoming.chat_id);
                }
            }
            None => warn!("no channel named {} to reply on", incoming.channel),
        }
    }

    /// Send plain text back to the chat the event came from.
    pub(super) async fn send_text(&self, incoming: &IncomingMessage, text: &str) {
        self.send(incoming, OutgoingMessage::text(&incoming.chat_id, text))
            .await;
    }
}
