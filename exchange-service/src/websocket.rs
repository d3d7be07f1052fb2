//! WebSocket trade stream.
//!
//! Forwards every trade the matching worker broadcasts. Uses tokio::select!
//! to handle client messages, broadcasts and heartbeats on one task.

use axum::extract::ws::{Message, WebSocket};
use futures::{sink::SinkExt, stream::StreamExt};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::types::{now_millis, WebSocketMessage};
use crate::AppState;

pub async fn handle_trade_stream(socket: WebSocket, state: AppState) {
    info!("New trade stream connection");

    let (mut sender, mut receiver) = socket.split();
    let mut trade_rx = state.trade_broadcaster.subscribe();
    let mut ping_interval = interval(Duration::from_secs(30));

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(WebSocketMessage::Ping { timestamp }) = serde_json::from_str(&text) {
                            let pong = WebSocketMessage::Pong { timestamp };
                            if let Ok(pong_json) = serde_json::to_string(&pong) {
                                let _ = sender.send(Message::Text(pong_json)).await;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Binary(_))) | Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Trade stream connection closed");
                        break;
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error in trade stream: {}", e);
                        break;
                    }
                }
            }

            trade_result = trade_rx.recv() => {
                match trade_result {
                    Ok(trade_event) => {
                        let ws_msg = WebSocketMessage::Trade(trade_event);
                        if let Ok(json) = serde_json::to_string(&ws_msg) {
                            if sender.send(Message::Text(json)).await.is_err() {
                                warn!("Failed to send trade update");
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Trade stream subscriber lagged");
                        let notice = WebSocketMessage::Error {
                            message: format!("{skipped} trades dropped"),
                        };
                        if let Ok(json) = serde_json::to_string(&notice) {
                            let _ = sender.send(Message::Text(json)).await;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            _ = ping_interval.tick() => {
                let ping = WebSocketMessage::Ping { timestamp: now_millis() };
                if let Ok(ping_json) = serde_json::to_string(&ping) {
                    if sender.send(Message::Text(ping_json)).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    info!("Trade stream handler ended");
}
