use crate::domain::{Item, NewItem};
use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

const ITEM_NOT_FOUND: &str = "Item not found";

/// Handler for listing items (GET /api/items), ordered by id.
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>, AppError> {
    // ---
    let items = state.repository().list_items().await?;
    Ok(Json(items))
}

/// Handler for creating an item (POST /api/items).
///
/// Responds with `201 Created` and the stored item, including its assigned
/// id and creation time. Malformed JSON is rejected by the extractor before
/// this runs.
#[tracing::instrument(skip_all, fields(name = %new_item.name))]
pub async fn create_item(
    State(state): State<AppState>,
    Json(new_item): Json<NewItem>,
) -> Result<(StatusCode, Json<Item>), AppError> {
    // ---
    let item = state.repository().create_item(new_item).await?;
    state.metrics().record_item_created();
    tracing::info!(item_id = item.id, "Item created");

    Ok((StatusCode::CREATED, Json(item)))
}

/// Handler for fetching an item by id (GET /api/items/{id}).
///
/// - `200 OK` with the item as JSON if it exists.
/// - `404 Not Found` with `{"error": "Item not found"}` otherwise.
#[tracing::instrument(skip_all, fields(item_id = id))]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Item>, AppError> {
    // ---
    state
        .repository()
        .get_item(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(ITEM_NOT_FOUND))
}

/// Handler for replacing an item's fields (PUT /api/items/{id}).
///
/// The id and creation time are preserved.
#[tracing::instrument(skip_all, fields(item_id = id))]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<NewItem>,
) -> Result<Json<Item>, AppError> {
    // ---
    let item = state
        .repository()
        .update_item(id, update)
        .await?
        .ok_or(AppError::NotFound(ITEM_NOT_FOUND))?;
    tracing::info!(item_id = item.id, "Item updated");

    Ok(Json(item))
}

/// Handler for deleting an item (DELETE /api/items/{id}).
///
/// - `204 No Content` if the item was deleted.
/// - `404 Not Found` if it did not exist.
#[tracing::instrument(skip_all, fields(item_id = id))]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    // ---
    if state.repository().delete_item(id).await? {
        tracing::info!(item_id = id, "Item deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(ITEM_NOT_FOUND))
    }
}
