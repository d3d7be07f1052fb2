//! Matching trigger: one worker task runs every matching pass.
//!
//! Callers enqueue a request and wait for its reply. The worker takes the
//! first queued request, gathers whatever else is already waiting, runs a
//! single pass for all of them and answers each with that pass's outcome.
//! Requests that arrive while a pass is running wait for the next one.

use orderbook::Trade;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::exchange::Exchange;
use crate::types::{now_millis, TradeEvent};

type Reply = oneshot::Sender<Result<Vec<Trade>, TriggerError>>;

#[derive(Debug, Clone, Error)]
pub enum TriggerError {
    #[error("matching pass failed: {0}")]
    PassFailed(String),

    #[error("matching worker is not running")]
    WorkerGone,
}

#[derive(Clone)]
pub struct MatchTrigger {
    tx: mpsc::Sender<Reply>,
}

impl MatchTrigger {
    /// Starts the worker. It stops once every `MatchTrigger` clone is dropped.
    pub fn spawn(
        exchange: Arc<Exchange>,
        trade_broadcaster: broadcast::Sender<TradeEvent>,
        queue_depth: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(queue_depth.max(1));
        let handle = tokio::spawn(run_worker(exchange, trade_broadcaster, rx));
        (Self { tx }, handle)
    }

    /// Asks for a matching pass and waits for it to finish.
    pub async fn request(&self) -> Result<Vec<Trade>, TriggerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(reply_tx)
            .await
            .map_err(|_| TriggerError::WorkerGone)?;
        reply_rx.await.map_err(|_| TriggerError::WorkerGone)?
    }
}

async fn run_worker(
    exchange: Arc<Exchange>,
    trade_broadcaster: broadcast::Sender<TradeEvent>,
    mut rx: mpsc::Receiver<Reply>,
) {
    while let Some(first) = rx.recv().await {
        let mut waiters = vec![first];
        while let Ok(next) = rx.try_recv() {
            waiters.push(next);
        }

        let outcome = match exchange.run_matching_pass().await {
            Ok(trades) => {
                let timestamp = now_millis();
                for trade in &trades {
                    // no subscribers is fine
                    let _ = trade_broadcaster.send(TradeEvent {
                        trade: *trade,
                        timestamp,
                    });
                }
                Ok(trades)
            }
            Err(e) => {
                error!(error = %e, "matching pass failed");
                Err(TriggerError::PassFailed(e.to_string()))
            }
        };

        if waiters.len() > 1 {
            debug!(waiters = waiters.len(), "coalesced matching requests");
        }
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }

    info!("matching worker stopped");
}
