//! Recipe counter DTOs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeViewsResponse {
    pub recipe_id: String,
    pub views: i64,
}
