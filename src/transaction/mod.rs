//! Transaction management for the budgeting application.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing and querying transactions
//! - JSON endpoints for recording, listing and deleting transactions
//! - The `DateRange` type used to select reporting periods

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod core;
mod create_endpoint;
mod delete_endpoint;
mod list_endpoint;
mod range;

pub use core::{
    Transaction, TransactionBuilder, create_transaction, create_transaction_table,
    delete_transaction, get_transaction, get_transactions_in_range, get_transactions_up_to,
    map_transaction_row,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use list_endpoint::get_transactions_endpoint;
pub use range::{DateRange, month_bounds};

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
