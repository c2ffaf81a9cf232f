//! Category management for labelling transactions as income or spending.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod create;
mod db;
mod domain;
mod edit;
mod list;

pub use create::create_category_endpoint;
pub use db::{
    archive_category, create_category, create_category_table, get_categories_for_user,
    get_category, reorder_categories, update_category,
};
pub use domain::{Category, CategoryId, CategoryName, CategoryUpdate, NewCategory};
pub use edit::{archive_category_endpoint, reorder_categories_endpoint, update_category_endpoint};
pub use list::get_categories_endpoint;

/// The state needed by the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
