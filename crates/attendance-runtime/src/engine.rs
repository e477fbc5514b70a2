use std::sync::Arc;

use attendance_core::{Action, AppState, Clock, Store};
use chrono::NaiveDateTime;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("store task exited")]
    ChannelClosed,
}

/// Message sent from views and timer loops to the store task.
struct DispatchRequest {
    action: Action,
    reply: oneshot::Sender<Arc<AppState>>,
}

/// Clone-safe handle to the store task.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<DispatchRequest>,
    state_rx: watch::Receiver<Arc<AppState>>,
    clock: Arc<dyn Clock>,
}

impl StoreHandle {
    /// Apply an action and wait for the resulting snapshot.
    pub async fn dispatch(&self, action: Action) -> Result<Arc<AppState>, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(DispatchRequest {
                action,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<AppState> {
        Arc::clone(&self.state_rx.borrow())
    }

    /// Receiver that observes every new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.state_rx.clone()
    }

    /// Current time from the store's clock.
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }
}

/// Spawn the store on a tokio task.
///
/// The task owns the [`Store`] and applies requests strictly one at a time,
/// publishing each new snapshot before replying. It exits once every
/// [`StoreHandle`] has been dropped.
pub fn spawn_store(mut store: Store) -> StoreHandle {
    let clock = Arc::clone(store.clock());
    let (state_tx, state_rx) = watch::channel(store.snapshot());
    let (tx, mut rx) = mpsc::channel::<DispatchRequest>(16);

    tokio::spawn(async move {
        tracing::info!("store task started");
        while let Some(DispatchRequest { action, reply }) = rx.recv().await {
            let snapshot = store.apply(action);
            state_tx.send_replace(Arc::clone(&snapshot));
            let _ = reply.send(snapshot);
        }
        tracing::info!("store task exiting");
    });

    StoreHandle {
        tx,
        state_rx,
        clock,
    }
}
