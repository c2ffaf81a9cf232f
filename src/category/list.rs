//! Category listing endpoint.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    Error, UserID,
    category::{Category, CategoryState, get_categories_for_user},
};

/// Query parameters for listing categories.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryListQuery {
    /// Whether archived categories should be included.
    #[serde(default)]
    pub include_archived: bool,
}

/// Respond with the user's categories in display order.
pub async fn get_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_categories_for_user(user_id, query.include_archived, &connection).map(Json)
}
