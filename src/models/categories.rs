use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::platform::store::{Order, RelationalStore};

pub const TABLE: &str = "categories";

/// Référentiel en lecture seule côté coeur.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub nom: String,
}

pub async fn get_all_categories(store: &dyn RelationalStore) -> Result<Vec<Category>, ApiError> {
    let rows = store.select(TABLE, &[], Some(Order::asc("nom"))).await?;
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(ApiError::from))
        .collect()
}
