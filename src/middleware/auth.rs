use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::annonces::{self, Annonce};
use crate::platform::Platform;
use crate::platform::store::RelationalStore;

/// Utilisateur authentifié, extrait du header `Authorization: Bearer <jeton>`.
/// Le jeton est vérifié auprès du fournisseur d'identité à chaque requête
/// protégée, sans cache local de session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            // 1. Header Authorization au format "Bearer <jeton>"
            let token = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::to_string)
                .ok_or_else(|| {
                    ApiError::Authentication("Vous devez être connecté.".to_string())
                })?;

            // 2. Vérification auprès du fournisseur d'identité
            let platform = req
                .app_data::<web::Data<Platform>>()
                .cloned()
                .ok_or_else(ApiError::internal)?;
            let account = platform.identity.verify_token(&token).await?;

            Ok(AuthUser {
                id: account.id,
                email: account.email,
            })
        })
    }
}

/// Vérifie que l'annonce existe et que `user_id` en est propriétaire.
/// Absente : 404. Propriétaire différent : 403 (politique appliquée
/// uniformément sur toutes les routes d'écriture).
pub async fn require_annonce_owner(
    store: &dyn RelationalStore,
    annonce_id: Uuid,
    user_id: Uuid,
) -> Result<Annonce, ApiError> {
    let annonce = annonces::get_annonce_row(store, annonce_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Annonce non trouvée.".to_string()))?;
    if annonce.user_id != user_id {
        return Err(ApiError::Forbidden(
            "Accès interdit. Vous n'êtes pas le propriétaire de cette annonce.".to_string(),
        ));
    }
    Ok(annonce)
}
