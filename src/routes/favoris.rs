use actix_web::{HttpResponse, delete, get, post, web};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::dto::AddFavoriRequest;
use crate::models::favoris;
use crate::platform::Platform;

fn parse_annonce_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        ApiError::Validation("L'ID de l'annonce est invalide (UUID attendu).".to_string())
    })
}

/// POST /api/favoris - Ajouter une annonce aux favoris (PROTÉGÉE)
#[post("")]
pub async fn add_favori(
    platform: web::Data<Platform>,
    auth_user: AuthUser,
    body: web::Json<AddFavoriRequest>,
) -> Result<HttpResponse, ApiError> {
    let raw = body
        .annonce_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("L'ID de l'annonce est requis.".to_string()))?;
    let annonce_id = parse_annonce_id(raw)?;

    // Un seul favori par paire (utilisateur, annonce).
    if favoris::is_favori(platform.store.as_ref(), auth_user.id, annonce_id).await? {
        return Err(ApiError::Conflict(
            "Cette annonce est déjà dans vos favoris.".to_string(),
        ));
    }

    let favori = favoris::add_favori(platform.store.as_ref(), auth_user.id, annonce_id).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Annonce ajoutée aux favoris.",
        "favori": favori,
    })))
}

/// DELETE /api/favoris/{id} - Retirer une annonce des favoris (PROTÉGÉE)
///
/// L'id attendu est celui de l'annonce, pas celui de la ligne favori.
#[delete("/{id}")]
pub async fn remove_favori(
    platform: web::Data<Platform>,
    auth_user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let annonce_id = parse_annonce_id(&path.into_inner())?;

    let deleted =
        favoris::remove_favori(platform.store.as_ref(), auth_user.id, annonce_id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound(
            "Favori non trouvé pour cet utilisateur ou impossible à supprimer.".to_string(),
        ));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Annonce retirée des favoris avec succès.",
    })))
}

/// GET /api/favoris/user/{id} - Favoris d'un utilisateur (PROTÉGÉE, soi-même)
#[get("/user/{id}")]
pub async fn get_favoris(
    platform: web::Data<Platform>,
    auth_user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    if user_id != auth_user.id {
        return Err(ApiError::Forbidden(
            "Accès interdit. Vous ne pouvez pas voir les favoris d'un autre utilisateur."
                .to_string(),
        ));
    }

    let favoris = favoris::get_favoris_by_user(platform.store.as_ref(), user_id).await?;
    Ok(HttpResponse::Ok().json(favoris))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/favoris")
            .service(add_favori)
            .service(get_favoris)
            .service(remove_favori),
    );
}
