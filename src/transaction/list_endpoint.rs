//! Defines the endpoint for listing transactions in a date range.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;
use time::Date;

use crate::{
    Error, UserID,
    timezone::get_local_today,
    transaction::{
        DateRange, Transaction, TransactionState, get_transactions_in_range, month_bounds,
    },
};

/// The optional period to list transactions for.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionListQuery {
    /// The first day to include.
    pub start: Option<Date>,
    /// The last day to include.
    pub end: Option<Date>,
}

/// A route handler that lists the user's transactions, oldest first.
///
/// Without a `start` and `end` the current calendar month in the server's timezone is used.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let range = match (query.start, query.end) {
        (Some(start), Some(end)) => DateRange::new(start, end)?,
        (start, end) => {
            let today = get_local_today(&state.local_timezone)
                .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
            let month = month_bounds(today.year(), today.month().into())?;
            DateRange::new(start.unwrap_or(month.start), end.unwrap_or(month.end))?
        }
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_transactions_in_range(user_id, range, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
    };
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error,
        test_utils::{TestUser, create_test_user},
        transaction::{
            Transaction, TransactionState, create_transaction, get_transactions_endpoint,
            list_endpoint::TransactionListQuery,
        },
    };

    #[tokio::test]
    async fn lists_transactions_in_range() {
        let TestUser {
            connection,
            user,
            account,
        } = create_test_user();
        let inside = create_transaction(
            user.id,
            Transaction::build(account.id, dec!(-5), date!(2025 - 06 - 10)),
            &connection,
        )
        .unwrap();
        create_transaction(
            user.id,
            Transaction::build(account.id, dec!(-5), date!(2025 - 07 - 10)),
            &connection,
        )
        .unwrap();
        let state = TransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let transactions = get_transactions_endpoint(
            State(state),
            Extension(user.id),
            Query(TransactionListQuery {
                start: Some(date!(2025 - 06 - 01)),
                end: Some(date!(2025 - 06 - 30)),
            }),
        )
        .await
        .unwrap();

        assert_eq!(transactions.0, vec![inside]);
    }

    #[tokio::test]
    async fn rejects_inverted_range() {
        let TestUser {
            connection, user, ..
        } = create_test_user();
        let state = TransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let result = get_transactions_endpoint(
            State(state),
            Extension(user.id),
            Query(TransactionListQuery {
                start: Some(date!(2025 - 06 - 30)),
                end: Some(date!(2025 - 06 - 01)),
            }),
        )
        .await;

        assert_eq!(
            result.map(|json| json.0),
            Err(Error::InvalidDateRange {
                start: date!(2025 - 06 - 30),
                end: date!(2025 - 06 - 01)
            })
        );
    }
}
