//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error, UserID,
    account::{AccountId, get_account, normalise_currency},
    category::{CategoryId, get_category},
    database_id::TransactionId,
    money::get_decimal,
    transaction::DateRange,
};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// The account the money moved in or out of.
    pub account_id: AccountId,
    /// The amount of money spent (negative) or earned (positive).
    pub amount: Decimal,
    /// The ISO 4217 currency code of `amount`.
    pub currency: String,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The ID of the category the transaction belongs to.
    pub category_id: Option<CategoryId>,
    /// Who was paid or who paid.
    pub payee: Option<String>,
    /// Whether the money moved between two of the user's own accounts.
    ///
    /// Transfers are left out of income and expense totals so that they are
    /// not counted twice.
    pub is_transfer: bool,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(account_id: AccountId, amount: Decimal, date: Date) -> TransactionBuilder {
        TransactionBuilder {
            account_id,
            amount,
            date,
            description: String::new(),
            category_id: None,
            payee: None,
            currency: None,
            is_transfer: false,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// # Examples
///
/// ```ignore
/// use rust_decimal_macros::dec;
/// use time::macros::date;
///
/// use crate::transaction::Transaction;
///
/// let builder = Transaction::build(account.id, dec!(-45.99), date!(2025-01-15))
///     .description("Coffee shop purchase")
///     .category_id(Some(eating_out.id));
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The account the money moved in or out of.
    pub account_id: AccountId,

    /// The monetary amount of the transaction.
    ///
    /// Positive values represent income/credits, negative values represent
    /// expenses/debits.
    pub amount: Decimal,

    /// The date when the transaction occurred.
    pub date: Date,

    /// A human-readable description of the transaction.
    pub description: String,

    /// The category of the transaction, e.g. "Groceries", "Transport", "Rent".
    pub category_id: Option<CategoryId>,

    /// Who was paid or who paid.
    pub payee: Option<String>,

    /// The currency code, defaults to the account's currency.
    pub currency: Option<String>,

    /// Whether the transaction moves money between the user's own accounts.
    pub is_transfer: bool,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Set the category id for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Set the payee for the transaction.
    pub fn payee(mut self, payee: Option<String>) -> Self {
        self.payee = payee;
        self
    }

    /// Set the currency code for the transaction.
    pub fn currency(mut self, currency: Option<String>) -> Self {
        self.currency = currency;
        self
    }

    /// Mark the transaction as a transfer between the user's own accounts.
    pub fn transfer(mut self, is_transfer: bool) -> Self {
        self.is_transfer = is_transfer;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str =
    "id, user_id, account_id, amount, currency, date, description, category_id, payee, is_transfer";

/// Create a new transaction for `user_id` in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAccount] if the account is not one of the user's accounts,
/// - [Error::InvalidCategory] if the category is not one of the user's categories,
/// - [Error::InvalidCurrency] if the currency code is malformed or is not the account's currency,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let account = match get_account(user_id, builder.account_id, connection) {
        Ok(account) => account,
        Err(Error::NotFound) => return Err(Error::InvalidAccount(builder.account_id)),
        Err(error) => return Err(error),
    };

    if let Some(category_id) = builder.category_id {
        match get_category(user_id, category_id, connection) {
            Ok(_) => {}
            Err(Error::NotFound) => return Err(Error::InvalidCategory(category_id)),
            Err(error) => return Err(error),
        }
    }

    let currency = match builder.currency {
        Some(currency) => normalise_currency(&currency)?,
        None => account.currency.clone(),
    };

    if currency != account.currency {
        tracing::warn!(
            "rejected {currency} transaction for account {} which uses {}",
            account.id,
            account.currency
        );
        return Err(Error::InvalidCurrency(currency));
    }

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (user_id, account_id, amount, currency, date, description, category_id, payee, is_transfer)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                user_id,
                builder.account_id,
                builder.amount.to_string(),
                currency,
                builder.date,
                builder.description,
                builder.category_id,
                builder.payee,
                builder.is_transfer,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve one of the user's transactions by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((id, user_id), map_transaction_row)?;

    Ok(transaction)
}

/// Get the user's transactions dated within `range`, oldest first.
///
/// Transfers are included, callers decide whether to skip them.
pub fn get_transactions_in_range(
    user_id: UserID,
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date ASC, id ASC"
        ))?
        .query_map((user_id, range.start, range.end), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Get all of the user's transactions dated on or before `cutoff`, oldest first.
pub fn get_transactions_up_to(
    user_id: UserID,
    cutoff: Date,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = ?1 AND date <= ?2
             ORDER BY date ASC, id ASC"
        ))?
        .query_map((user_id, cutoff), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Delete one of the user's transactions.
///
/// # Errors
/// Returns [Error::DeleteMissingTransaction] if the user has no such transaction.
pub fn delete_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                account_id INTEGER NOT NULL,
                amount TEXT NOT NULL,
                currency TEXT NOT NULL,
                date TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                category_id INTEGER,
                payee TEXT,
                is_transfer INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
                );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);
        CREATE INDEX IF NOT EXISTS idx_transaction_category ON \"transaction\"(category_id);",
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        account_id: row.get(2)?,
        amount: get_decimal(row, 3)?,
        currency: row.get(4)?,
        date: row.get(5)?,
        description: row.get(6)?,
        category_id: row.get(7)?,
        payee: row.get(8)?,
        is_transfer: row.get(9)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
