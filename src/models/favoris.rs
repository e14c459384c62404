use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{annonces, categories, images};
use crate::platform::store::{Filter, RelationalStore};

pub const TABLE: &str = "favoris";

/// Ligne favori. L'identité côté client est la paire (user_id, annonce_id) ;
/// l'id de ligne reste un détail du store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favori {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub annonce_id: Uuid,
}

/// Annonce favorite renvoyée au client, indexée par l'id de l'annonce
/// (c'est lui qu'attend DELETE /favoris/:id).
#[derive(Debug, Serialize)]
pub struct FavoriAnnonce {
    pub id: Uuid,
    pub titre: String,
    pub description: String,
    pub prix: f64,
    pub localite: String,
    pub created_at: DateTime<Utc>,
    pub categorie: Option<String>,
    pub images: Vec<String>,
}

pub async fn is_favori(
    store: &dyn RelationalStore,
    user_id: Uuid,
    annonce_id: Uuid,
) -> Result<bool, ApiError> {
    let rows = store
        .select(
            TABLE,
            &[
                Filter::eq("user_id", user_id.to_string()),
                Filter::eq("annonce_id", annonce_id.to_string()),
            ],
            None,
        )
        .await?;
    Ok(!rows.is_empty())
}

pub async fn add_favori(
    store: &dyn RelationalStore,
    user_id: Uuid,
    annonce_id: Uuid,
) -> Result<Favori, ApiError> {
    let row = serde_json::json!({
        "user_id": user_id,
        "annonce_id": annonce_id,
    });
    let inserted = store.insert(TABLE, row).await?;
    Ok(serde_json::from_value(inserted)?)
}

/// Renvoie le nombre de lignes supprimées (0 = favori inexistant).
pub async fn remove_favori(
    store: &dyn RelationalStore,
    user_id: Uuid,
    annonce_id: Uuid,
) -> Result<u64, ApiError> {
    let deleted = store
        .delete(
            TABLE,
            &[
                Filter::eq("user_id", user_id.to_string()),
                Filter::eq("annonce_id", annonce_id.to_string()),
            ],
        )
        .await?;
    Ok(deleted)
}

/// Favoris d'un utilisateur, joints aux annonces côté application.
/// Un favori dont l'annonce a disparu (référence faible) est écarté.
pub async fn get_favoris_by_user(
    store: &dyn RelationalStore,
    user_id: Uuid,
) -> Result<Vec<FavoriAnnonce>, ApiError> {
    let rows = store
        .select(TABLE, &[Filter::eq("user_id", user_id.to_string())], None)
        .await?;
    let category_names: std::collections::HashMap<i64, String> =
        categories::get_all_categories(store)
            .await?
            .into_iter()
            .map(|c| (c.id, c.nom))
            .collect();

    let mut favoris = Vec::new();
    for row in rows {
        let favori: Favori = serde_json::from_value(row)?;
        let Some(annonce) = annonces::get_annonce_row(store, favori.annonce_id).await? else {
            continue;
        };
        let urls = images::get_images_by_annonce_id(store, annonce.id)
            .await?
            .into_iter()
            .map(|img| img.url)
            .collect();
        favoris.push(FavoriAnnonce {
            id: annonce.id,
            titre: annonce.titre,
            description: annonce.description,
            prix: annonce.prix,
            localite: annonce.localite,
            created_at: annonce.created_at,
            categorie: category_names.get(&annonce.category_id).cloned(),
            images: urls,
        });
    }
    Ok(favoris)
}
