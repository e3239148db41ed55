//! Recipe view counters.

use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::get,
};

use crate::api::dto::RecipeViewsResponse;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

const MAX_RECIPE_ID_LEN: usize = 128;

/// # Routes
/// - `GET /{id}/views` - Current view count (0 when never viewed)
/// - `POST /{id}/views` - Record one view and return the new count
pub fn recipe_routes() -> Router<AppState> {
    Router::new().route("/{id}/views", get(get_views).post(record_view))
}

pub async fn get_views(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> AppResult<Json<RecipeViewsResponse>> {
    validate_recipe_id(&recipe_id)?;
    let views = state.services.cache.get_recipe_views(&recipe_id).await;
    Ok(Json(RecipeViewsResponse { recipe_id, views }))
}

pub async fn record_view(
    State(state): State<AppState>,
    Path(recipe_id): Path<String>,
) -> AppResult<Json<RecipeViewsResponse>> {
    validate_recipe_id(&recipe_id)?;
    let views = state.services.cache.increment_recipe_views(&recipe_id).await;
    Ok(Json(RecipeViewsResponse { recipe_id, views }))
}

fn validate_recipe_id(recipe_id: &str) -> AppResult<()> {
    if recipe_id.trim().is_empty() || recipe_id.len() > MAX_RECIPE_ID_LEN {
        return Err(AppError::Validation {
            field: "id".to_string(),
            reason: format!("Recipe id must be 1 to {MAX_RECIPE_ID_LEN} characters"),
        });
    }
    Ok(())
}
