//! Defines the endpoint for creating a new account.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{
    Error, UserID,
    account::{AccountState, NewAccount, create_account},
    money::parse_amount,
};

/// The request body for creating an account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountForm {
    /// The account name.
    pub name: String,
    /// The opening balance as a decimal string, e.g. "1024.50".
    pub balance: String,
    /// The date of the opening balance, defaults to today (UTC).
    pub balance_date: Option<Date>,
    /// The ISO 4217 currency code.
    pub currency: String,
}

/// A route handler for creating a new account, responds with the created account.
pub async fn create_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<AccountForm>,
) -> Result<Response, Error> {
    let new_account = NewAccount {
        balance: parse_amount(&form.balance)?,
        balance_date: form
            .balance_date
            .unwrap_or_else(|| OffsetDateTime::now_utc().date()),
        currency: form.currency,
        name: form.name,
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let account = create_account(user_id, new_account, &connection)?;
    tracing::info!("user {user_id} created account {}", account.id);

    Ok((StatusCode::CREATED, Json(account)).into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, UserID,
        account::{AccountState, create_account_endpoint, create_endpoint::AccountForm},
        db::initialize,
        test_utils::parse_json_body,
        user::create_user,
    };

    fn get_test_state() -> (AccountState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("test@example.com", &conn).unwrap();

        (
            AccountState {
                db_connection: Arc::new(Mutex::new(conn)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn can_create_account() {
        let (state, user_id) = get_test_state();
        let form = AccountForm {
            name: "test account".to_owned(),
            balance: "123.45".to_owned(),
            balance_date: Some(date!(2025 - 01 - 31)),
            currency: "NZD".to_owned(),
        };

        let response = create_account_endpoint(State(state), Extension(user_id), Json(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = parse_json_body(response).await;
        assert_eq!(body["name"], "test account");
        assert_eq!(body["balance"], "123.45");
        assert_eq!(body["balanceDate"], "2025-01-31");
    }

    #[tokio::test]
    async fn rejects_non_numeric_balance() {
        let (state, user_id) = get_test_state();
        let form = AccountForm {
            name: "test account".to_owned(),
            balance: "a lot".to_owned(),
            balance_date: None,
            currency: "NZD".to_owned(),
        };

        let result = create_account_endpoint(State(state), Extension(user_id), Json(form)).await;

        assert_eq!(
            result.map(|response| response.status()),
            Err(Error::InvalidAmount("a lot".to_owned()))
        );
    }
}
