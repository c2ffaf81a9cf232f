use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, UserID, money::get_decimal};

/// Database identifier for an account.
pub type AccountId = i64;

/// A bank account, credit card or cash wallet owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The user that owns the account.
    pub user_id: UserID,
    /// The display name of the account, unique per user.
    pub name: String,
    /// The balance last reported for the account.
    ///
    /// Summaries derive balances from transactions instead of reading this field.
    pub balance: Decimal,
    /// The date `balance` was last updated.
    pub balance_date: Date,
    /// The ISO 4217 currency code, e.g. "NZD".
    pub currency: String,
    /// Whether the account is open. Closed accounts keep their transactions.
    pub is_active: bool,
}

/// The data needed to create an account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    /// The display name of the account.
    pub name: String,
    /// The opening balance.
    pub balance: Decimal,
    /// The date of the opening balance.
    pub balance_date: Date,
    /// The ISO 4217 currency code.
    pub currency: String,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            balance TEXT NOT NULL,
            balance_date TEXT NOT NULL,
            currency TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_account_user ON account(user_id);",
    )?;

    Ok(())
}

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        balance: get_decimal(row, 3)?,
        balance_date: row.get(4)?,
        currency: row.get(5)?,
        is_active: row.get(6)?,
    })
}

/// Check that `currency` looks like an ISO 4217 code and return it in uppercase.
///
/// # Errors
/// Returns [Error::InvalidCurrency] if `currency` is not three ASCII letters.
pub fn normalise_currency(currency: &str) -> Result<String, Error> {
    let currency = currency.trim().to_ascii_uppercase();

    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(currency)
    } else {
        Err(Error::InvalidCurrency(currency))
    }
}

/// Create an account for `user_id`.
///
/// # Errors
/// Returns:
/// - [Error::InvalidCurrency] if the currency code is malformed,
/// - [Error::DuplicateAccountName] if the user already has an account with the same name,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_account(
    user_id: UserID,
    new_account: NewAccount,
    connection: &Connection,
) -> Result<Account, Error> {
    let currency = normalise_currency(&new_account.currency)?;

    connection
        .prepare(
            "INSERT INTO account (user_id, name, balance, balance_date, currency)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, user_id, name, balance, balance_date, currency, is_active",
        )?
        .query_row(
            (
                user_id,
                &new_account.name,
                new_account.balance.to_string(),
                new_account.balance_date,
                currency,
            ),
            map_row_to_account,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(error, Some(_))
                if error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Error::DuplicateAccountName(new_account.name.clone())
            }
            error => error.into(),
        })
}

/// Get the user's accounts ordered by name.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_accounts_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, balance, balance_date, currency, is_active
             FROM account WHERE user_id = :user_id ORDER BY name ASC",
        )?
        .query_map(&[(":user_id", &user_id)], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}

/// Get one of the user's accounts.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not exist or belongs to another user.
pub fn get_account(
    user_id: UserID,
    account_id: AccountId,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, balance, balance_date, currency, is_active
             FROM account WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((account_id, user_id), map_row_to_account)
        .map_err(|error| error.into())
}

/// Mark one of the user's accounts as closed.
///
/// # Errors
/// Returns [Error::UpdateMissingAccount] if the user has no such account.
pub fn close_account(
    user_id: UserID,
    account_id: AccountId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE account SET is_active = 0 WHERE id = ?1 AND user_id = ?2",
        (account_id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingAccount);
    }

    Ok(())
}
