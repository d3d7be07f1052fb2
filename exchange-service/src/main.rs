use axum::{
    extract::{rejection::JsonRejection, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use orderbook::Side;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

mod config;
mod error;
mod exchange;
mod logging;
mod trigger;
mod types;
mod websocket;

use config::Config;
use error::AppError;
use exchange::Exchange;
use trigger::MatchTrigger;
use types::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    logging::setup_logging(&config.log_level);

    let exchange = Arc::new(Exchange::open(config.journal.as_deref())?);
    let (trade_tx, _) = broadcast::channel(1000);
    let (trigger, _worker) =
        MatchTrigger::spawn(exchange.clone(), trade_tx.clone(), config.trigger_queue);

    // a previous run may have stopped with a crossed book
    match trigger.request().await {
        Ok(trades) => info!(trades = trades.len(), "Initial order matching completed"),
        Err(e) => error!(error = %e, "Initial order matching failed"),
    }

    let app = app(AppState {
        exchange,
        trigger,
        trade_broadcaster: trade_tx,
    });

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Matching service starting on http://{}", addr);
    info!(" Available endpoints:");
    info!("  GET  /health - Health check and book summary");
    info!("  POST /api/order - Submit order");
    info!("  POST /api/match - Run a matching pass");
    info!("  GET  /api/orders/pending - Resting orders");
    info!("  GET  /api/orders/completed - Completed volume by price");
    info!("  WS   /api/trades/stream - Trade stream");

    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Clone)]
pub(crate) struct AppState {
    exchange: Arc<Exchange>,
    trigger: MatchTrigger,
    trade_broadcaster: broadcast::Sender<TradeEvent>,
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/order", post(submit_order))
        .route("/api/match", post(trigger_matching))
        .route("/api/orders/pending", get(pending_orders))
        .route("/api/orders/completed", get(completed_orders))
        .route("/api/trades/stream", get(trade_stream))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "exchange-service",
        "version": env!("CARGO_PKG_VERSION"),
        "book": state.exchange.stats().await,
        "timestamp": now_millis(),
    }))
}

async fn submit_order(
    State(state): State<AppState>,
    payload: Result<Json<SubmitOrderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected unreadable order");
        AppError::from(rejection)
    })?;
    let side: Side = request.side.parse().map_err(|e| {
        warn!(side = %request.side, "rejected order with unknown side");
        AppError::from(e)
    })?;

    let order_id = state
        .exchange
        .submit_order(side, request.price, request.qty)
        .await?;

    // the order is in; a failed pass is logged, not returned
    let trades = match state.trigger.request().await {
        Ok(trades) => trades,
        Err(e) => {
            warn!(%order_id, error = %e, "matching after submission failed");
            Vec::new()
        }
    };

    let message = match side {
        Side::Buy => "Buyer order placed successfully!",
        Side::Sell => "Seller order placed successfully!",
    };

    Ok((
        StatusCode::CREATED,
        Json(SubmitOrderResponse {
            order_id,
            message: message.to_string(),
            trades,
        }),
    ))
}

async fn trigger_matching(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let trades = state.trigger.request().await?;
    Ok(Json(MatchResponse { trades }))
}

async fn pending_orders(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.exchange.open_orders().await)
}

async fn completed_orders(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.exchange.completed_by_price().await)
}

async fn trade_stream(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| websocket::handle_trade_stream(socket, state))
}
