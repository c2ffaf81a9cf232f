//! Monthly budgets: planned amounts per category compared with actual activity.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod core;
mod handlers;
mod overview;
mod reconciliation;

pub use core::{
    Budget, BudgetCategory, BudgetId, BudgetKind, create_budget_tables, get_budget_categories,
    get_monthly_budget, get_or_create_monthly_budget, set_planned_amount,
};
pub use handlers::{get_budget_endpoint, set_planned_amount_endpoint};
pub use overview::{BudgetOverview, BudgetTotals, CategoryBudgetView, get_budget_overview};
pub use reconciliation::{CategoryBudgetRow, category_activity, compute_category_budget_row};

#[cfg(test)]
pub(crate) use reconciliation::test_helpers;

/// The state needed by the budget endpoints.
#[derive(Debug, Clone)]
pub struct BudgetState {
    /// The database connection for reading and writing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
