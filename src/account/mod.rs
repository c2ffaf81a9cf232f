//! Bank accounts, credit cards and other places money is kept.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod close_endpoint;
mod core;
mod create_endpoint;
mod list_endpoint;

pub use close_endpoint::close_account_endpoint;
pub use core::{
    Account, AccountId, NewAccount, create_account, create_account_table, get_account,
    get_accounts_for_user, normalise_currency,
};
pub use create_endpoint::create_account_endpoint;
pub use list_endpoint::get_accounts_endpoint;

/// The state needed by the account endpoints.
#[derive(Debug, Clone)]
pub struct AccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
