//! Defines the endpoint for recording a new transaction.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use time::Date;

use crate::{
    Error, UserID,
    account::AccountId,
    category::CategoryId,
    money::parse_amount,
    transaction::{Transaction, TransactionState, create_transaction},
};

/// The request body for recording a transaction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    /// The account the money moved in or out of.
    pub account_id: AccountId,
    /// The signed amount as a decimal string, negative for spending.
    pub amount: String,
    /// When the transaction happened.
    pub date: Date,
    /// What the transaction was for.
    #[serde(default)]
    pub description: String,
    /// The category to file the transaction under.
    pub category_id: Option<CategoryId>,
    /// Who was paid or who paid.
    pub payee: Option<String>,
    /// The currency code, defaults to the account's currency.
    pub currency: Option<String>,
    /// Whether the money moved between two of the user's own accounts.
    #[serde(default)]
    pub is_transfer: bool,
}

/// A route handler for recording a transaction, responds with the stored transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<TransactionForm>,
) -> Result<Response, Error> {
    let amount = parse_amount(&form.amount)?;
    let builder = Transaction::build(form.account_id, amount, form.date)
        .description(form.description.trim())
        .category_id(form.category_id)
        .payee(form.payee)
        .currency(form.currency)
        .transfer(form.is_transfer);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(user_id, builder, &connection)?;
    tracing::debug!("user {user_id} recorded transaction {}", transaction.id);

    Ok((StatusCode::CREATED, Json(transaction)).into_response())
}
