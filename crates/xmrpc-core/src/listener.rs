//! New-chain-tip notification fan-out.
//!
//! The registry never polls. Whoever learns about a new tip (for example a
//! loop around `get_height`) calls [`ListenerRegistry::notify`], which hands
//! the event to every registered observer according to the registry's
//! [`DeliveryMode`].

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::CoreError;

/// How [`ListenerRegistry::notify`] reaches its observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// One at a time in registration order; `notify` waits for all of them
    /// and stops at the first failure.
    #[default]
    Sequential,
    /// One spawned task per observer; `notify` returns once every task is
    /// launched. Failures are logged inside the task.
    Concurrent,
}

#[async_trait]
pub trait ChainTipObserver: Send + Sync {
    async fn on_new_block(&self) -> Result<(), CoreError>;
}

/// Adapter turning an async closure into a [`ChainTipObserver`].
pub struct FnObserver<F>(F);

pub fn observer_fn<F, Fut>(f: F) -> FnObserver<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CoreError>> + Send + 'static,
{
    FnObserver(f)
}

#[async_trait]
impl<F, Fut> ChainTipObserver for FnObserver<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CoreError>> + Send + 'static,
{
    async fn on_new_block(&self) -> Result<(), CoreError> {
        (self.0)().await
    }
}

/// Append-only set of observers plus the delivery mode chosen at construction.
///
/// Registration and notification may interleave freely: `notify` works on a
/// snapshot, so an observer added mid-delivery is seen by the next call only.
#[derive(Default)]
pub struct ListenerRegistry {
    mode: DeliveryMode,
    observers: RwLock<Vec<Arc<dyn ChainTipObserver>>>,
}

impl ListenerRegistry {
    pub fn new(mode: DeliveryMode) -> Self {
        Self {
            mode,
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    /// Register `observer`. Duplicates are allowed and delivered twice.
    pub async fn add_observer(&self, observer: Arc<dyn ChainTipObserver>) {
        self.observers.write().await.push(observer);
    }

    pub async fn len(&self) -> usize {
        self.observers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.observers.read().await.is_empty()
    }

    /// Deliver one new-tip event.
    ///
    /// Sequential mode returns the first observer error and skips the rest.
    /// Concurrent mode always returns `Ok` and must run inside a tokio runtime.
    pub async fn notify(&self) -> Result<(), CoreError> {
        let snapshot: Vec<Arc<dyn ChainTipObserver>> = self.observers.read().await.clone();
        debug!(observers = snapshot.len(), mode = ?self.mode, "notifying chain tip observers");

        match self.mode {
            DeliveryMode::Sequential => {
                for (index, observer) in snapshot.iter().enumerate() {
                    observer.on_new_block().await.map_err(|err| {
                        warn!(observer = index, error = %err, "observer failed; stopping delivery");
                        err
                    })?;
                }
            }
            DeliveryMode::Concurrent => {
                for (index, observer) in snapshot.into_iter().enumerate() {
                    tokio::spawn(async move {
                        if let Err(err) = observer.on_new_block().await {
                            warn!(observer = index, error = %err, "observer failed");
                        }
                    });
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
