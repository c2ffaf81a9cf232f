//! Code for creating the user table and fetching users from the database.
//!
//! Users are registered by the external auth provider. This service only
//! needs their ID and email address, e.g. to match invitations to invitees.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for UserID {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for UserID {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(UserID)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's email address, stored in lowercase.
    pub email: String,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Normalise an email address for storage and comparison.
///
/// # Errors
///
/// Returns [Error::InvalidEmail] if `email` is not of the form `local@domain`.
pub(crate) fn normalise_email(email: &str) -> Result<String, Error> {
    let email = email.trim().to_lowercase();

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(Error::InvalidEmail(email)),
    }
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns:
/// - [Error::InvalidEmail] if `email` is not a valid email address,
/// - [Error::DuplicateEmail] if another user already has `email`,
/// - [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(email: &str, connection: &Connection) -> Result<User, Error> {
    let email = normalise_email(email)?;

    connection
        .execute(
            "INSERT INTO user (email, created_at) VALUES (?1, ?2)",
            (&email, OffsetDateTime::now_utc()),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Error::DuplicateEmail(email.clone())
            }
            error => error.into(),
        })?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User { id, email })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id)], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`, ignoring case.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has the email address.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    let email = normalise_email(email)?;

    connection
        .prepare("SELECT id, email FROM user WHERE email = :email")?
        .query_row(&[(":email", &email)], map_user_row)
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
    })
}
