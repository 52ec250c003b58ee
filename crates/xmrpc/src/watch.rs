//! Caller-side tip polling that drives a [`ListenerRegistry`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use xmrpc_core::rpc::types::ChainHeight;
use xmrpc_core::units::xmr_to_decimal;
use xmrpc_core::{ChainTipObserver, CoreError, DaemonRpc, DeliveryMode, ListenerRegistry};

/// Remembers the last tip hash seen and reports when it changes.
///
/// The first observation only sets the baseline.
#[derive(Debug, Default)]
pub struct TipTracker {
    last_hash: Option<String>,
}

impl TipTracker {
    pub fn observe(&mut self, tip: &ChainHeight) -> bool {
        match self.last_hash.as_deref() {
            Some(last) if last == tip.hash => false,
            Some(_) => {
                self.last_hash = Some(tip.hash.clone());
                true
            }
            None => {
                self.last_hash = Some(tip.hash.clone());
                false
            }
        }
    }
}

/// Logs the header of every new tip.
pub struct HeaderLogger {
    rpc: Arc<dyn DaemonRpc>,
}

impl HeaderLogger {
    pub fn new(rpc: Arc<dyn DaemonRpc>) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl ChainTipObserver for HeaderLogger {
    async fn on_new_block(&self) -> Result<(), CoreError> {
        let header = self.rpc.get_last_block_header(false).await?.block_header;
        tracing::info!(
            height = header.height,
            hash = %header.hash,
            reward = %xmr_to_decimal(header.reward),
            txs = header.num_txes,
            "new block"
        );
        Ok(())
    }
}

/// Poll `/get_height` every `interval` and notify observers on each new tip
/// until Ctrl-C.
pub async fn run(
    rpc: Arc<dyn DaemonRpc>,
    interval: Duration,
    mode: DeliveryMode,
) -> eyre::Result<()> {
    let registry = ListenerRegistry::new(mode);
    registry
        .add_observer(Arc::new(HeaderLogger::new(Arc::clone(&rpc))))
        .await;

    let mut tracker = TipTracker::default();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tracing::info!(interval_secs = interval.as_secs(), ?mode, "watching for new blocks");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("stopping watch");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        let tip = match rpc.get_height().await {
            Ok(tip) => tip,
            Err(err) => {
                tracing::warn!(error = %err, "get_height failed; retrying next tick");
                continue;
            }
        };
        if tracker.observe(&tip) {
            if let Err(err) = registry.notify().await {
                tracing::warn!(height = tip.height, error = %err, "new tip delivery failed");
            }
        }
    }
}
