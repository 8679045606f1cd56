//! Market event loop - drives the handler from a chat-event channel

use log::{debug, info};
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::time::{interval, Duration};

use super::handler::{ChatEvent, MarketHandler, RECYCLE_CANCELLED};
use super::profile::{ProfileStore, StatusOracle};

/// Market runner tuning
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// How often expired confirmation windows are swept, in milliseconds
    pub confirm_sweep_interval_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            confirm_sweep_interval_ms: 1000,
        }
    }
}

/// One outbound reply
#[derive(Debug, Clone)]
pub struct Reply {
    pub group_id: String,
    pub user_id: String,
    pub text: String,
}

/// Drives a [`MarketHandler`] from an event channel until it closes
pub struct MarketRunner<P, S> {
    handler: MarketHandler<P, S>,
    events: Receiver<ChatEvent>,
    replies: Sender<Reply>,
    runner_config: RunnerConfig,
}

impl<P: ProfileStore + 'static, S: StatusOracle + 'static> MarketRunner<P, S> {
    pub fn new(
        handler: MarketHandler<P, S>,
        events: Receiver<ChatEvent>,
        replies: Sender<Reply>,
        runner_config: RunnerConfig,
    ) -> Self {
        Self {
            handler,
            events,
            replies,
            runner_config,
        }
    }

    pub fn handler(&self) -> &MarketHandler<P, S> {
        &self.handler
    }

    /// Run until the event channel closes or the reply sink goes away
    pub async fn run(mut self) {
        info!("Starting market event loop");
        let mut sweep = interval(Duration::from_millis(
            self.runner_config.confirm_sweep_interval_ms,
        ));

        loop {
            tokio::select! {
                maybe_event = self.events.recv() => {
                    let Some(event) = maybe_event else {
                        info!("Event channel closed, stopping market loop");
                        break;
                    };
                    if let Some(text) = self.handler.handle_event(&event).await {
                        let reply = Reply {
                            group_id: event.group_id,
                            user_id: event.user_id,
                            text,
                        };
                        if self.replies.send(reply).await.is_err() {
                            info!("Reply sink closed, stopping market loop");
                            break;
                        }
                    }
                }
                _ = sweep.tick() => {
                    for (group_id, user_id) in self.handler.take_expired_confirmations().await {
                        debug!("Recycle confirmation timed out for {}@{}", user_id, group_id);
                        let reply = Reply {
                            group_id,
                            user_id,
                            text: RECYCLE_CANCELLED.to_string(),
                        };
                        if self.replies.send(reply).await.is_err() {
                            info!("Reply sink closed, stopping market loop");
                            return;
                        }
                    }
                }
            }
        }
    }
}
