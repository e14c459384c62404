use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::platform::store::{Filter, RelationalStore};

pub const TABLE: &str = "users";

/// Ligne de profil du store. L'id vient du fournisseur d'identité,
/// l'email lui appartient aussi (copié ici en lecture seule).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub pseudo: String,
    #[serde(default)]
    pub prenom: Option<String>,
    #[serde(default)]
    pub nom: Option<String>,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub localite: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

/// Vue publique d'un profil : pas d'email, pas de prénom/nom.
#[derive(Debug, Serialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub pseudo: String,
    pub localite: Option<String>,
    pub telephone: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl From<User> for PublicProfile {
    fn from(user: User) -> Self {
        PublicProfile {
            id: user.id,
            pseudo: user.pseudo,
            localite: user.localite,
            telephone: user.telephone,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
            last_active: user.last_active,
        }
    }
}

pub async fn create_user(store: &dyn RelationalStore, user: &User) -> Result<User, ApiError> {
    let row = store.insert(TABLE, serde_json::to_value(user)?).await?;
    Ok(serde_json::from_value(row)?)
}

pub async fn get_user_by_id(
    store: &dyn RelationalStore,
    user_id: Uuid,
) -> Result<Option<User>, ApiError> {
    let rows = store
        .select(TABLE, &[Filter::eq("id", user_id.to_string())], None)
        .await?;
    match rows.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

/// Horodate la dernière connexion. Échec non bloquant pour le login.
pub async fn update_last_active(store: &dyn RelationalStore, user_id: Uuid) {
    let patch = serde_json::json!({ "last_active": Utc::now() });
    if let Err(err) = store
        .update(TABLE, &[Filter::eq("id", user_id.to_string())], patch)
        .await
    {
        tracing::warn!(error = %err, %user_id, "mise à jour de last_active impossible");
    }
}

pub async fn update_user(
    store: &dyn RelationalStore,
    user_id: Uuid,
    patch: Map<String, Value>,
) -> Result<Option<User>, ApiError> {
    let rows = store
        .update(
            TABLE,
            &[Filter::eq("id", user_id.to_string())],
            Value::Object(patch),
        )
        .await?;
    match rows.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

pub async fn delete_user(store: &dyn RelationalStore, user_id: Uuid) -> Result<(), ApiError> {
    store
        .delete(TABLE, &[Filter::eq("id", user_id.to_string())])
        .await?;
    Ok(())
}
