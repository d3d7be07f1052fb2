use thiserror::Error;

use crate::journal::JournalError;
use crate::types::OrderId;

#[derive(Debug, Error)]
pub enum BookError {
    /// Bad side, price or quantity. Nothing was persisted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Mutation referenced an order that is no longer resting.
    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error("store failure: {0}")]
    StoreFailure(#[from] JournalError),
}

pub type Result<T> = std::result::Result<T, BookError>;
