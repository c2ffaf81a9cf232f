//! Database operations for categories.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error, UserID,
    category::{Category, CategoryId, CategoryName, CategoryUpdate, NewCategory},
};

const CATEGORY_COLUMNS: &str = "id, user_id, name, is_income, exclude_from_budget, \
    exclude_from_totals, is_archived, archived_at, display_order";

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            is_income INTEGER NOT NULL DEFAULT 0,
            exclude_from_budget INTEGER NOT NULL DEFAULT 0,
            exclude_from_totals INTEGER NOT NULL DEFAULT 0,
            is_archived INTEGER NOT NULL DEFAULT 0,
            archived_at TEXT,
            display_order INTEGER NOT NULL DEFAULT 0,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_category_user_order ON category(user_id, display_order);",
    )?;

    Ok(())
}

fn map_unique_name_error(name: &CategoryName) -> impl FnOnce(rusqlite::Error) -> Error + '_ {
    move |error| match error {
        rusqlite::Error::SqliteFailure(sql_error, Some(_))
            if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Error::DuplicateCategoryName(name.to_string())
        }
        error => error.into(),
    }
}

/// Create a category for `user_id` at the end of the user's list.
///
/// # Errors
/// Returns [Error::DuplicateCategoryName] if the user already has a category with the same name.
pub fn create_category(
    user_id: UserID,
    new_category: NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO category (user_id, name, is_income, exclude_from_budget, exclude_from_totals, display_order)
             VALUES (?1, ?2, ?3, ?4, ?5,
                (SELECT COALESCE(MAX(display_order) + 1, 0) FROM category WHERE user_id = ?1))
             RETURNING {CATEGORY_COLUMNS}"
        ))?
        .query_row(
            (
                user_id,
                new_category.name.as_ref(),
                new_category.is_income,
                new_category.exclude_from_budget,
                new_category.exclude_from_totals,
            ),
            map_category_row,
        )
        .map_err(map_unique_name_error(&new_category.name))
}

/// Retrieve one of the user's categories by ID.
///
/// # Errors
/// Returns [Error::NotFound] if the category does not exist or belongs to another user.
pub fn get_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((category_id, user_id), map_category_row)
        .map_err(|error| error.into())
}

/// Retrieve the user's categories ordered by display order, then name.
///
/// Archived categories are only included if `include_archived` is true.
pub fn get_categories_for_user(
    user_id: UserID,
    include_archived: bool,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category
             WHERE user_id = ?1 AND (?2 OR is_archived = 0)
             ORDER BY display_order ASC, name ASC"
        ))?
        .query_map((user_id, include_archived), map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Apply `update` to one of the user's categories and return the updated category.
///
/// # Errors
/// Returns:
/// - [Error::UpdateMissingCategory] if the user has no such category,
/// - [Error::DuplicateCategoryName] if the new name is already used by another category.
pub fn update_category(
    user_id: UserID,
    category_id: CategoryId,
    update: CategoryUpdate,
    connection: &Connection,
) -> Result<Category, Error> {
    let current = match get_category(user_id, category_id, connection) {
        Ok(category) => category,
        Err(Error::NotFound) => return Err(Error::UpdateMissingCategory),
        Err(error) => return Err(error),
    };

    let name = update.name.unwrap_or(current.name);

    connection
        .prepare(&format!(
            "UPDATE category
             SET name = ?1, is_income = ?2, exclude_from_budget = ?3, exclude_from_totals = ?4
             WHERE id = ?5 AND user_id = ?6
             RETURNING {CATEGORY_COLUMNS}"
        ))?
        .query_row(
            (
                name.as_ref(),
                update.is_income.unwrap_or(current.is_income),
                update
                    .exclude_from_budget
                    .unwrap_or(current.exclude_from_budget),
                update
                    .exclude_from_totals
                    .unwrap_or(current.exclude_from_totals),
                category_id,
                user_id,
            ),
            map_category_row,
        )
        .map_err(map_unique_name_error(&name))
}

/// Archive one of the user's categories.
///
/// Archiving an already archived category keeps the original archive timestamp.
///
/// # Errors
/// Returns [Error::UpdateMissingCategory] if the user has no such category.
pub fn archive_category(
    user_id: UserID,
    category_id: CategoryId,
    archived_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "UPDATE category
             SET is_archived = 1, archived_at = COALESCE(archived_at, ?1)
             WHERE id = ?2 AND user_id = ?3
             RETURNING {CATEGORY_COLUMNS}"
        ))?
        .query_row((archived_at, category_id, user_id), map_category_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingCategory,
            error => error.into(),
        })
}

/// Set the display order of the user's categories to the order of `category_ids`.
///
/// Categories not listed keep their current position value.
///
/// # Errors
/// Returns [Error::UpdateMissingCategory] if any ID is not one of the user's
/// categories, in which case no category is changed.
pub fn reorder_categories(
    user_id: UserID,
    category_ids: &[CategoryId],
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    for (position, category_id) in category_ids.iter().enumerate() {
        let rows_affected = transaction.execute(
            "UPDATE category SET display_order = ?1 WHERE id = ?2 AND user_id = ?3",
            (position as i64, category_id, user_id),
        )?;

        if rows_affected == 0 {
            // Dropping the transaction rolls back the earlier updates.
            return Err(Error::UpdateMissingCategory);
        }
    }

    transaction.commit()?;
    Ok(())
}

pub(crate) fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(2)?;

    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: CategoryName::new_unchecked(&raw_name),
        is_income: row.get(3)?,
        exclude_from_budget: row.get(4)?,
        exclude_from_totals: row.get(5)?,
        is_archived: row.get(6)?,
        archived_at: row.get(7)?,
        order: row.get(8)?,
    })
}
