use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use orderbook::BookError;
use serde_json::json;
use thiserror::Error;

use crate::trigger::TriggerError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store failure: {0}")]
    StoreFailure(String),

    #[error(transparent)]
    Trigger(#[from] TriggerError),
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::InvalidArgument(msg) => AppError::InvalidArgument(msg),
            BookError::NotFound(id) => AppError::NotFound(format!("order {id}")),
            BookError::StoreFailure(e) => AppError::StoreFailure(e.to_string()),
        }
    }
}

// unreadable bodies are bad input like any other
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidArgument(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::StoreFailure(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_FAILURE"),
            AppError::Trigger(TriggerError::PassFailed(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "MATCHING_FAILED")
            }
            AppError::Trigger(TriggerError::WorkerGone) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
        };

        let body = Json(json!({
            "error": code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderbook::{JournalError, OrderId};

    #[test]
    fn book_errors_map_to_status_codes() {
        let cases = [
            (BookError::InvalidArgument("qty".into()), StatusCode::BAD_REQUEST),
            (BookError::NotFound(OrderId(3)), StatusCode::NOT_FOUND),
            (
                BookError::StoreFailure(JournalError::Unavailable("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
        assert_eq!(
            AppError::from(TriggerError::WorkerGone).into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
