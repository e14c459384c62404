use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{categories, dto, images, users};
use crate::platform::store::{Filter, Order, RelationalStore};

pub const TABLE: &str = "annonces";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annonce {
    pub id: Uuid,
    pub titre: String,
    pub description: String,
    pub prix: f64,
    pub localite: String,
    pub category_id: i64,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Coordonnées publiques du vendeur, embarquées dans le fil d'annonces.
#[derive(Debug, Serialize)]
pub struct VendeurInfo {
    pub pseudo: String,
    pub localite: Option<String>,
    pub telephone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageRef {
    pub id: Uuid,
    pub url: String,
}

/// Annonce enrichie des données liées, jointes côté application
/// (le store ne fait que des filtres d'égalité).
#[derive(Debug, Serialize)]
pub struct AnnonceDetail {
    #[serde(flatten)]
    pub annonce: Annonce,
    pub categorie: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendeur: Option<VendeurInfo>,
    pub images: Vec<ImageRef>,
}

pub async fn create_annonce(
    store: &dyn RelationalStore,
    new: &dto::NewAnnonce,
    user_id: Uuid,
) -> Result<Annonce, ApiError> {
    let row = serde_json::json!({
        "titre": new.titre,
        "description": new.description,
        "prix": new.prix,
        "localite": new.localite,
        "category_id": new.category_id,
        "user_id": user_id,
        "created_at": Utc::now(),
    });
    let inserted = store.insert(TABLE, row).await?;
    Ok(serde_json::from_value(inserted)?)
}

/// Ligne brute, sans jointure. Sert aux contrôles de propriété.
pub async fn get_annonce_row(
    store: &dyn RelationalStore,
    annonce_id: Uuid,
) -> Result<Option<Annonce>, ApiError> {
    let rows = store
        .select(TABLE, &[Filter::eq("id", annonce_id.to_string())], None)
        .await?;
    match rows.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

pub async fn get_annonce_rows_by_user(
    store: &dyn RelationalStore,
    user_id: Uuid,
) -> Result<Vec<Annonce>, ApiError> {
    let rows = store
        .select(
            TABLE,
            &[Filter::eq("user_id", user_id.to_string())],
            Some(Order::desc("created_at")),
        )
        .await?;
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(ApiError::from))
        .collect()
}

/// Fil complet, le plus récent d'abord, avec vendeur, catégorie et images.
pub async fn get_all_annonces(
    store: &dyn RelationalStore,
) -> Result<Vec<AnnonceDetail>, ApiError> {
    let rows = store
        .select(TABLE, &[], Some(Order::desc("created_at")))
        .await?;
    let category_names = load_category_names(store).await?;

    let mut details = Vec::with_capacity(rows.len());
    let mut vendeurs: HashMap<Uuid, Option<VendeurInfo>> = HashMap::new();
    for row in rows {
        let annonce: Annonce = serde_json::from_value(row)?;
        let vendeur = match vendeurs.get(&annonce.user_id) {
            Some(cached) => cached.as_ref().map(clone_vendeur),
            None => {
                let loaded = load_vendeur(store, annonce.user_id).await?;
                let copy = loaded.as_ref().map(clone_vendeur);
                vendeurs.insert(annonce.user_id, loaded);
                copy
            }
        };
        details.push(build_detail(store, annonce, &category_names, vendeur).await?);
    }
    Ok(details)
}

pub async fn get_annonce_detail(
    store: &dyn RelationalStore,
    annonce_id: Uuid,
) -> Result<Option<AnnonceDetail>, ApiError> {
    let Some(annonce) = get_annonce_row(store, annonce_id).await? else {
        return Ok(None);
    };
    let category_names = load_category_names(store).await?;
    let vendeur = load_vendeur(store, annonce.user_id).await?;
    Ok(Some(
        build_detail(store, annonce, &category_names, vendeur).await?,
    ))
}

/// Annonces d'un utilisateur, sans le bloc vendeur (il se connaît).
pub async fn get_annonces_by_user(
    store: &dyn RelationalStore,
    user_id: Uuid,
) -> Result<Vec<AnnonceDetail>, ApiError> {
    let annonces = get_annonce_rows_by_user(store, user_id).await?;
    let category_names = load_category_names(store).await?;

    let mut details = Vec::with_capacity(annonces.len());
    for annonce in annonces {
        details.push(build_detail(store, annonce, &category_names, None).await?);
    }
    Ok(details)
}

/// Mise à jour filtrée par id ET propriétaire : un non-propriétaire
/// ne touche aucune ligne.
pub async fn update_annonce(
    store: &dyn RelationalStore,
    annonce_id: Uuid,
    user_id: Uuid,
    patch: Map<String, Value>,
) -> Result<Option<Annonce>, ApiError> {
    let rows = store
        .update(
            TABLE,
            &[
                Filter::eq("id", annonce_id.to_string()),
                Filter::eq("user_id", user_id.to_string()),
            ],
            Value::Object(patch),
        )
        .await?;
    match rows.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

/// Suppression filtrée par id ET propriétaire (défense en profondeur,
/// même quand l'appelant a déjà vérifié la propriété).
pub async fn delete_annonce(
    store: &dyn RelationalStore,
    annonce_id: Uuid,
    user_id: Uuid,
) -> Result<u64, ApiError> {
    let deleted = store
        .delete(
            TABLE,
            &[
                Filter::eq("id", annonce_id.to_string()),
                Filter::eq("user_id", user_id.to_string()),
            ],
        )
        .await?;
    Ok(deleted)
}

async fn load_category_names(
    store: &dyn RelationalStore,
) -> Result<HashMap<i64, String>, ApiError> {
    Ok(categories::get_all_categories(store)
        .await?
        .into_iter()
        .map(|c| (c.id, c.nom))
        .collect())
}

async fn load_vendeur(
    store: &dyn RelationalStore,
    user_id: Uuid,
) -> Result<Option<VendeurInfo>, ApiError> {
    Ok(users::get_user_by_id(store, user_id)
        .await?
        .map(|u| VendeurInfo {
            pseudo: u.pseudo,
            localite: u.localite,
            telephone: u.telephone,
        }))
}

fn clone_vendeur(v: &VendeurInfo) -> VendeurInfo {
    VendeurInfo {
        pseudo: v.pseudo.clone(),
        localite: v.localite.clone(),
        telephone: v.telephone.clone(),
    }
}

async fn build_detail(
    store: &dyn RelationalStore,
    annonce: Annonce,
    category_names: &HashMap<i64, String>,
    vendeur: Option<VendeurInfo>,
) -> Result<AnnonceDetail, ApiError> {
    let images = images::get_images_by_annonce_id(store, annonce.id)
        .await?
        .into_iter()
        .map(|img| ImageRef {
            id: img.id,
            url: img.url,
        })
        .collect();
    Ok(AnnonceDetail {
        categorie: category_names.get(&annonce.category_id).cloned(),
        vendeur,
        images,
        annonce,
    })
}
