//! API types for REST and WebSocket interfaces.

use orderbook::{OrderId, Price, Trade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall clock in milliseconds for event timestamps.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Request to submit a new limit order.
///
/// `side` also accepts the key `type` and the values `buyer`/`seller`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitOrderRequest {
    #[serde(alias = "type")]
    pub side: String,
    pub price: Decimal,
    #[serde(alias = "quantity")]
    pub qty: i64,
}

/// Response after submitting an order.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitOrderResponse {
    pub order_id: OrderId,
    pub message: String,
    /// Trades from the matching pass that ran after this submission. The
    /// pass may be shared with concurrent submissions.
    pub trades: Vec<Trade>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MatchResponse {
    pub trades: Vec<Trade>,
}

/// Resting interest summary for health and monitoring.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookStats {
    pub resting_orders: usize,
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
    pub trades: usize,
}

/// Trade execution event for WebSocket streaming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvent {
    pub trade: Trade,
    pub timestamp: u64,
}

/// WebSocket message types.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WebSocketMessage {
    #[serde(rename = "trade")]
    Trade(TradeEvent),
    #[serde(rename = "error")]
    Error { message: String },
    #[serde(rename = "ping")]
    Ping { timestamp: u64 },
    #[serde(rename = "pong")]
    Pong { timestamp: u64 },
}
