//! Creates the application's database schema.

use rusqlite::{Connection, TransactionBehavior};

use crate::{
    Error,
    account::create_account_table,
    budget::create_budget_tables,
    category::create_category_table,
    subscription::create_subscription_tables,
    transaction::create_transaction_table,
    user::create_user_table,
};

/// Create all the tables for the domain models if they do not exist yet.
///
/// Foreign key enforcement is switched on for `connection`.
///
/// # Errors
/// Returns an [Error::SqlError] if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so must come first.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        rusqlite::Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_account_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_tables(&transaction)?;
    create_subscription_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}
