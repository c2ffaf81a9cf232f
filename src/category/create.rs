//! Category creation endpoint.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    Error, UserID,
    category::{CategoryState, NewCategory, create_category},
};

/// Handle category creation, responds with the new category.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Json(new_category): Json<NewCategory>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = create_category(user_id, new_category, &connection)?;

    Ok((StatusCode::CREATED, Json(category)).into_response())
}
