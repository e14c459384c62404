use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::platform::object_store::{BUCKET_NAME, ObjectStore};
use crate::platform::store::{Filter, Order, RelationalStore};

pub const TABLE: &str = "images";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: Uuid,
    pub annonce_id: Uuid,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Téléverse les octets puis insère la ligne de métadonnées.
/// Si l'insertion échoue, l'objet déjà stocké est retiré (rollback best-effort).
pub async fn upload_image(
    store: &dyn RelationalStore,
    objects: &dyn ObjectStore,
    data: Vec<u8>,
    content_type: &str,
    annonce_id: Uuid,
) -> Result<Image, ApiError> {
    let path = format!(
        "{annonce_id}/{}-{}",
        Uuid::new_v4(),
        Utc::now().timestamp_millis()
    );
    let url = objects.upload(&path, data, content_type).await?;

    let row = serde_json::json!({
        "id": Uuid::new_v4(),
        "annonce_id": annonce_id,
        "url": url,
        "uploaded_at": Utc::now(),
    });

    match store.insert(TABLE, row).await {
        Ok(inserted) => Ok(serde_json::from_value(inserted)?),
        Err(err) => {
            if let Err(remove_err) = objects.remove(&path).await {
                tracing::warn!(error = %remove_err, path, "rollback de l'objet impossible");
            }
            Err(err.into())
        }
    }
}

pub async fn get_images_by_annonce_id(
    store: &dyn RelationalStore,
    annonce_id: Uuid,
) -> Result<Vec<Image>, ApiError> {
    let rows = store
        .select(
            TABLE,
            &[Filter::eq("annonce_id", annonce_id.to_string())],
            Some(Order::asc("uploaded_at")),
        )
        .await?;
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(ApiError::from))
        .collect()
}

pub async fn find_image(
    store: &dyn RelationalStore,
    image_id: Uuid,
    annonce_id: Uuid,
) -> Result<Option<Image>, ApiError> {
    let rows = store
        .select(
            TABLE,
            &[
                Filter::eq("id", image_id.to_string()),
                Filter::eq("annonce_id", annonce_id.to_string()),
            ],
            None,
        )
        .await?;
    match rows.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

/// Supprime d'abord les octets (best-effort : un échec est journalisé et
/// n'empêche pas la suite), puis la ligne de métadonnées.
pub async fn delete_image(
    store: &dyn RelationalStore,
    objects: &dyn ObjectStore,
    image: &Image,
) -> Result<(), ApiError> {
    match object_path_from_url(&image.url) {
        Some(path) => {
            if let Err(err) = objects.remove(&path).await {
                tracing::warn!(error = %err, path, image_id = %image.id,
                    "octets non supprimés du stockage, suppression de la ligne quand même");
            }
        }
        None => {
            tracing::warn!(url = %image.url, image_id = %image.id,
                "chemin objet indéductible depuis l'URL");
        }
    }

    let deleted = store
        .delete(
            TABLE,
            &[
                Filter::eq("id", image.id.to_string()),
                Filter::eq("annonce_id", image.annonce_id.to_string()),
            ],
        )
        .await?;
    if deleted == 0 {
        tracing::warn!(image_id = %image.id, "ligne image déjà absente à la suppression");
    }
    Ok(())
}

/// Retrouve le chemin dans le bucket à partir de l'URL publique stockée.
pub(crate) fn object_path_from_url(url: &str) -> Option<String> {
    let marker = format!("/object/public/{BUCKET_NAME}/");
    if let Some(idx) = url.find(&marker) {
        return Some(url[idx + marker.len()..].to_string());
    }
    let fallback = format!("/{BUCKET_NAME}/");
    url.find(&fallback)
        .map(|idx| url[idx + fallback.len()..].to_string())
}
