use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::platform::identity::IdentityError;
use crate::platform::object_store::ObjectStoreError;
use crate::platform::store::StoreError;

/// Taxonomie des erreurs exposées par l'API.
/// Le corps de réponse est toujours `{ "message": "..." }`, comme le reste de l'API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Entrée malformée ou hors bornes (400).
    #[error("{0}")]
    Validation(String),

    /// Jeton manquant ou invalide (401).
    #[error("{0}")]
    Authentication(String),

    /// Authentifié mais pas propriétaire de la ressource (403).
    #[error("{0}")]
    Forbidden(String),

    /// Ressource absente (404).
    #[error("{0}")]
    NotFound(String),

    /// Doublon : favori ou compte déjà existant (409).
    #[error("{0}")]
    Conflict(String),

    /// Échec d'un collaborateur externe (500). Le détail interne est journalisé
    /// au point d'appel, seul le message générique part au client.
    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    pub fn internal() -> Self {
        ApiError::Upstream("Erreur interne du serveur.".to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "message": self.to_string(),
        }))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "erreur du store relationnel");
        ApiError::internal()
    }
}

impl From<ObjectStoreError> for ApiError {
    fn from(err: ObjectStoreError) -> Self {
        tracing::error!(error = %err, "erreur du stockage objet");
        ApiError::internal()
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::EmailTaken => {
                ApiError::Conflict("Cet email est déjà enregistré.".to_string())
            }
            IdentityError::InvalidCredentials => ApiError::Authentication(
                "Email non confirmé ou mot de passe incorrect.".to_string(),
            ),
            IdentityError::InvalidToken => {
                ApiError::Authentication("Vous devez être connecté.".to_string())
            }
            IdentityError::Upstream(detail) => {
                tracing::error!(error = %detail, "erreur du fournisseur d'identité");
                ApiError::internal()
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!(error = %err, "ligne du store illisible");
        ApiError::internal()
    }
}
