//! Endpoints for reading a month's budget and planning amounts.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    Error, UserID,
    budget::{
        BudgetState,
        core::{BudgetCategory, set_planned_amount},
        overview::{BudgetOverview, get_budget_overview},
    },
    category::CategoryId,
    money::parse_amount,
    timezone::get_local_today,
};

/// Selects a month, missing parts default to the current month.
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    /// The calendar year.
    pub year: Option<i32>,
    /// The month number, 1 to 12.
    pub month: Option<u8>,
}

/// The request body for planning an amount for a category.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedAmountForm {
    /// The category to plan for.
    pub category_id: CategoryId,
    /// The planned amount as a decimal string.
    pub amount: String,
    /// The calendar year, defaults to the current year.
    pub year: Option<i32>,
    /// The month number, defaults to the current month.
    pub month: Option<u8>,
}

fn resolve_month(
    local_timezone: &str,
    year: Option<i32>,
    month: Option<u8>,
) -> Result<(i32, u8), Error> {
    if let (Some(year), Some(month)) = (year, month) {
        return Ok((year, month));
    }

    let today = get_local_today(local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(local_timezone.to_owned()))?;

    Ok((
        year.unwrap_or(today.year()),
        month.unwrap_or(today.month().into()),
    ))
}

/// A route handler that returns the user's budget for a month.
pub async fn get_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<BudgetOverview>, Error> {
    let (year, month) = resolve_month(&state.local_timezone, query.year, query.month)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_budget_overview(user_id, year, month, &connection).map(Json)
}

/// A route handler that creates or replaces the planned amount for a category.
pub async fn set_planned_amount_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<PlannedAmountForm>,
) -> Result<Json<BudgetCategory>, Error> {
    let amount = parse_amount(&form.amount)?;
    let (year, month) = resolve_month(&state.local_timezone, form.year, form.month)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    set_planned_amount(user_id, form.category_id, year, month, amount, &connection).map(Json)
}
