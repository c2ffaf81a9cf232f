//! Endpoints for changing, archiving and reordering categories.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    Error, UserID,
    category::{
        Category, CategoryId, CategoryState, CategoryUpdate, archive_category, reorder_categories,
        update_category,
    },
};

/// The request body for reordering categories.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryOrderForm {
    /// Category IDs in their new display order.
    pub category_ids: Vec<CategoryId>,
}

/// Apply a partial update to a category.
pub async fn update_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<CategoryId>,
    Json(update): Json<CategoryUpdate>,
) -> Result<Json<Category>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    update_category(user_id, category_id, update, &connection).map(Json)
}

/// Archive a category. Its transactions keep referring to it.
pub async fn archive_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<CategoryId>,
) -> Result<Json<Category>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    archive_category(user_id, category_id, OffsetDateTime::now_utc(), &connection).map(Json)
}

/// Save a new display order for the user's categories.
pub async fn reorder_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<CategoryOrderForm>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    reorder_categories(user_id, &form.category_ids, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
