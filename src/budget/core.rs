//! Stores monthly budgets and the planned amount for each category.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error, UserID,
    budget::reconciliation::category_activity,
    category::{CategoryId, get_category},
    database_id::DatabaseId,
    money::get_decimal,
    transaction::{get_transactions_in_range, month_bounds},
};

/// Database identifier for a budget.
pub type BudgetId = DatabaseId;

/// Whether a budget belongs to one user or is shared through a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetKind {
    /// A budget for a single user.
    Personal,
    /// A budget shared by the members of a subscription.
    Shared,
}

impl BudgetKind {
    fn as_str(&self) -> &'static str {
        match self {
            BudgetKind::Personal => "personal",
            BudgetKind::Shared => "shared",
        }
    }
}

impl Display for BudgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for BudgetKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BudgetKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "personal" => Ok(BudgetKind::Personal),
            "shared" => Ok(BudgetKind::Shared),
            other => Err(FromSqlError::Other(
                format!("unknown budget kind \"{other}\"").into(),
            )),
        }
    }
}

/// A spending plan for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The user the budget belongs to.
    pub user_id: UserID,
    /// Personal or shared.
    pub kind: BudgetKind,
    /// The first day of the month.
    pub start_date: Date,
    /// The last day of the month.
    pub end_date: Date,
    /// The sum of the planned amounts of the expense categories.
    pub total_amount: Decimal,
}

/// The planned amount for a category in a budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategory {
    /// The ID of the row.
    pub id: DatabaseId,
    /// The budget the row belongs to.
    pub budget_id: BudgetId,
    /// The category being planned for.
    pub category_id: CategoryId,
    /// The amount the user plans to spend or earn.
    pub planned_amount: Decimal,
    /// The activity when the row was last written.
    ///
    /// This is a cache, reports recompute the figure from transactions.
    pub spent_amount: Decimal,
}

/// Create the budget tables in the database.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_budget_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('personal', 'shared')),
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            total_amount TEXT NOT NULL DEFAULT '0',
            UNIQUE(user_id, kind, start_date),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS budget_category (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            budget_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            planned_amount TEXT NOT NULL DEFAULT '0',
            spent_amount TEXT NOT NULL DEFAULT '0',
            UNIQUE(budget_id, category_id),
            FOREIGN KEY(budget_id) REFERENCES budget(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
        );",
    )
}

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        total_amount: get_decimal(row, 5)?,
    })
}

fn map_budget_category_row(row: &Row) -> Result<BudgetCategory, rusqlite::Error> {
    Ok(BudgetCategory {
        id: row.get(0)?,
        budget_id: row.get(1)?,
        category_id: row.get(2)?,
        planned_amount: get_decimal(row, 3)?,
        spent_amount: get_decimal(row, 4)?,
    })
}

/// Get the user's personal budget for a month, creating it if it does not exist.
///
/// The budget is keyed by (user, kind, first day of the month), so calling this
/// repeatedly always returns the same budget.
///
/// # Errors
/// Returns [Error::InvalidMonth] or [Error::InvalidYear] for a bad month, or
/// [Error::SqlError] if there is some other SQL error.
pub fn get_or_create_monthly_budget(
    user_id: UserID,
    year: i32,
    month: u8,
    connection: &Connection,
) -> Result<Budget, Error> {
    let range = month_bounds(year, month)?;

    // The no-op update makes RETURNING yield the existing row on conflict.
    let budget = connection
        .prepare(
            "INSERT INTO budget (user_id, kind, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, kind, start_date) DO UPDATE SET end_date = excluded.end_date
             RETURNING id, user_id, kind, start_date, end_date, total_amount",
        )?
        .query_row(
            (user_id, BudgetKind::Personal, range.start, range.end),
            map_budget_row,
        )?;

    Ok(budget)
}

/// Get the user's personal budget for a month without creating it.
pub fn get_monthly_budget(
    user_id: UserID,
    year: i32,
    month: u8,
    connection: &Connection,
) -> Result<Option<Budget>, Error> {
    let range = month_bounds(year, month)?;

    match connection
        .prepare(
            "SELECT id, user_id, kind, start_date, end_date, total_amount FROM budget
             WHERE user_id = ?1 AND kind = ?2 AND start_date = ?3",
        )?
        .query_row((user_id, BudgetKind::Personal, range.start), map_budget_row)
    {
        Ok(budget) => Ok(Some(budget)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Get the planned amounts recorded in a budget.
pub fn get_budget_categories(
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<Vec<BudgetCategory>, Error> {
    connection
        .prepare(
            "SELECT id, budget_id, category_id, planned_amount, spent_amount
             FROM budget_category WHERE budget_id = ?1 ORDER BY category_id ASC",
        )?
        .query_map([budget_id], map_budget_category_row)?
        .map(|maybe_row| maybe_row.map_err(|error| error.into()))
        .collect()
}

/// Set the planned amount for one of the user's categories in a month.
///
/// The month's budget and the category's row are created on the first write.
/// The row's cached spent amount is refreshed from the month's transactions and
/// the budget total is recomputed, all in one database transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if `planned_amount` is negative,
/// - [Error::InvalidCategory] if the category is not one of the user's categories,
/// - [Error::InvalidMonth] or [Error::InvalidYear] for a bad month,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn set_planned_amount(
    user_id: UserID,
    category_id: CategoryId,
    year: i32,
    month: u8,
    planned_amount: Decimal,
    connection: &Connection,
) -> Result<BudgetCategory, Error> {
    if planned_amount < Decimal::ZERO {
        return Err(Error::InvalidAmount(planned_amount.to_string()));
    }

    let category = match get_category(user_id, category_id, connection) {
        Ok(category) => category,
        Err(Error::NotFound) => return Err(Error::InvalidCategory(category_id)),
        Err(error) => return Err(error),
    };

    let transaction = connection.unchecked_transaction()?;

    let budget = get_or_create_monthly_budget(user_id, year, month, &transaction)?;
    let range = month_bounds(year, month)?;
    let transactions = get_transactions_in_range(user_id, range, &transaction)?;
    let spent_amount = category_activity(&category, &transactions);

    let row = transaction
        .prepare(
            "INSERT INTO budget_category (budget_id, category_id, planned_amount, spent_amount)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(budget_id, category_id) DO UPDATE SET
                planned_amount = excluded.planned_amount,
                spent_amount = excluded.spent_amount
             RETURNING id, budget_id, category_id, planned_amount, spent_amount",
        )?
        .query_row(
            (
                budget.id,
                category_id,
                planned_amount.to_string(),
                spent_amount.to_string(),
            ),
            map_budget_category_row,
        )?;

    let total_amount = expense_planned_total(budget.id, &transaction)?;
    transaction.execute(
        "UPDATE budget SET total_amount = ?1 WHERE id = ?2",
        (total_amount.to_string(), budget.id),
    )?;

    transaction.commit()?;

    tracing::debug!(
        "user {user_id} planned {planned_amount} for category {category_id} in {}",
        budget.start_date
    );

    Ok(row)
}

/// Sum the planned amounts of the expense categories in a budget.
fn expense_planned_total(budget_id: BudgetId, connection: &Connection) -> Result<Decimal, Error> {
    let mut statement = connection.prepare(
        "SELECT bc.planned_amount FROM budget_category bc
         INNER JOIN category c ON c.id = bc.category_id
         WHERE bc.budget_id = ?1 AND c.is_income = 0",
    )?;

    let amounts = statement
        .query_map([budget_id], |row| get_decimal(row, 0))?
        .collect::<Result<Vec<Decimal>, rusqlite::Error>>()?;

    Ok(amounts.into_iter().sum())
}
