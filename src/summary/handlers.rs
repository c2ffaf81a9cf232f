//! The endpoint for the period summary.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    Error, UserID,
    account::get_accounts_for_user,
    category::get_categories_for_user,
    summary::{
        SummaryState,
        aggregation::{SummaryData, compute_period_summary},
    },
    timezone::get_local_today,
    transaction::{DateRange, get_transactions_up_to, month_bounds},
};

/// The period to summarise.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    /// The first day of the period, defaults to the start of the current month.
    pub start: Option<Date>,
    /// The last day of the period, defaults to the end of the current month.
    pub end: Option<Date>,
}

/// Load the user's rows and summarise `period`.
///
/// # Errors
/// Returns [Error::SqlError] if a query fails.
pub fn get_period_summary(
    user_id: UserID,
    period: DateRange,
    connection: &Connection,
) -> Result<SummaryData, Error> {
    let transactions = get_transactions_up_to(user_id, period.end, connection)?;
    let accounts = get_accounts_for_user(user_id, connection)?;
    let categories = get_categories_for_user(user_id, true, connection)?;

    Ok(compute_period_summary(
        &transactions,
        &accounts,
        &categories,
        &period,
    ))
}

/// A route handler that returns the summary of a period.
pub async fn get_summary_endpoint(
    State(state): State<SummaryState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryData>, Error> {
    let period = match (query.start, query.end) {
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

    get_period_summary(user_id, period, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        category::{CategoryName, NewCategory, create_category},
        summary::handlers::get_period_summary,
        test_utils::{TestUser, create_test_user},
        transaction::{DateRange, Transaction, create_transaction},
    };

    #[test]
    fn summarises_stored_transactions() {
        let TestUser {
            connection,
            user,
            account,
        } = create_test_user();
        let salary = create_category(
            user.id,
            NewCategory::income(CategoryName::new_unchecked("Salary")),
            &connection,
        )
        .unwrap();
        for (amount, date, category_id) in [
            (dec!(1000.00), date!(2025 - 03 - 01), Some(salary.id)),
            (dec!(-250.00), date!(2025 - 03 - 02), None),
        ] {
            create_transaction(
                user.id,
                Transaction::build(account.id, amount, date).category_id(category_id),
                &connection,
            )
            .unwrap();
        }
        let period = DateRange::new(date!(2025 - 03 - 01), date!(2025 - 03 - 31)).unwrap();

        let summary = get_period_summary(user.id, period, &connection).unwrap();

        assert_eq!(summary.income, dec!(1000.00));
        assert_eq!(summary.expenses, dec!(250.00));
        assert_eq!(summary.net_worth, dec!(750.00));
        assert_eq!(summary.categories.len(), 2);
    }
}
