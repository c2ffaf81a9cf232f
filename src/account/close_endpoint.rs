//! Defines the endpoint for closing an account.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    Error, UserID,
    account::{AccountId, AccountState, core::close_account},
};

/// A route handler for closing one of the user's accounts.
///
/// The account and its transactions are kept so that historical summaries do not change.
pub async fn close_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<AccountId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    close_account(user_id, account_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
