//! Income, expenses, savings rate and net worth for a period.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod aggregation;
mod handlers;

pub use aggregation::{
    AccountBalance, CategoryBreakdown, SummaryData, UNCATEGORISED_LABEL, compute_period_summary,
};
pub use handlers::{get_period_summary, get_summary_endpoint};

/// The state needed by the summary endpoint.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
