//! Defines the endpoint for deleting a transaction.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    Error, UserID,
    database_id::TransactionId,
    transaction::{TransactionState, delete_transaction},
};

/// A route handler for deleting one of the user's transactions.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transaction(user_id, transaction_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
