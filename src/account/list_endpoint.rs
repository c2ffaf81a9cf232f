//! Defines the endpoint for listing the user's accounts.

use axum::{Extension, Json, extract::State};

use crate::{
    Error, UserID,
    account::{Account, AccountState, get_accounts_for_user},
};

/// A route handler that responds with the user's accounts ordered by name.
pub async fn get_accounts_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Account>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_accounts_for_user(user_id, &connection).map(Json)
}
