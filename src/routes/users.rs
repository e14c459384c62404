use actix_web::{HttpResponse, delete, get, put, web};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::dto::UpdateProfileRequest;
use crate::models::users::{self, PublicProfile};
use crate::platform::Platform;
use crate::services::cascade_service::CascadeService;
use crate::services::validation;

/// GET /api/users/{id} - Profil public (PUBLIC)
#[get("/{id}")]
pub async fn get_user(
    platform: web::Data<Platform>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let user = users::get_user_by_id(platform.store.as_ref(), path.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Utilisateur non trouvé.".to_string()))?;
    Ok(HttpResponse::Ok().json(PublicProfile::from(user)))
}

/// PUT /api/users/{id} - Mise à jour de son propre profil (PROTÉGÉE)
#[put("/{id}")]
pub async fn update_user(
    platform: web::Data<Platform>,
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    if user_id != auth_user.id {
        return Err(ApiError::Forbidden(
            "Accès interdit. Vous ne pouvez pas modifier le profil d'un autre utilisateur."
                .to_string(),
        ));
    }

    let patch = validation::validate_profile_update(&body)?;
    let user = users::update_user(platform.store.as_ref(), user_id, patch)
        .await?
        .ok_or_else(|| {
            ApiError::Validation("Impossible de mettre à jour le profil.".to_string())
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Profil mis à jour avec succès.",
        "user": user,
    })))
}

/// DELETE /api/users/{id} - Suppression de son propre compte (PROTÉGÉE)
///
/// Cascade complète : favoris, annonces et leurs images, profil,
/// compte d'identité.
#[delete("/{id}")]
pub async fn delete_user(
    platform: web::Data<Platform>,
    auth_user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    if user_id != auth_user.id {
        return Err(ApiError::Forbidden(
            "Accès interdit. Vous ne pouvez pas supprimer le compte d'un autre utilisateur."
                .to_string(),
        ));
    }

    CascadeService::delete_user(&platform, user_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Compte utilisateur, annonces, images et favoris supprimés avec succès.",
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(get_user)
            .service(update_user)
            .service(delete_user),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    use crate::platform::memory::test_platform;
    use crate::routes::test_utils::{bearer, init_app, read_json, seed_annonce, seed_user};

    #[actix_rt::test]
    async fn profil_public_sans_email() {
        let tp = test_platform();
        let (user_id, _) = seed_user(&tp, "a@b.com", "alice").await;
        let app = init_app(tp.platform.clone()).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/users/{user_id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = read_json(resp).await;
        assert_eq!(body["pseudo"], "alice");
        assert!(body.get("email").is_none());
        assert!(body.get("prenom").is_none());
    }

    #[actix_rt::test]
    async fn profil_inconnu_404() {
        let tp = test_platform();
        let app = init_app(tp.platform.clone()).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/users/{}", uuid::Uuid::new_v4()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn mise_a_jour_de_son_profil() {
        let tp = test_platform();
        let (user_id, token) = seed_user(&tp, "a@b.com", "alice").await;
        let app = init_app(tp.platform.clone()).await;

        let req = test::TestRequest::put()
            .uri(&format!("/api/users/{user_id}"))
            .insert_header(bearer(&token))
            .set_json(json!({ "pseudo": "alice2", "telephone": null }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = read_json(resp).await;
        assert_eq!(body["user"]["pseudo"], "alice2");
        assert_eq!(body["user"]["telephone"], Value::Null);
    }

    #[actix_rt::test]
    async fn pseudo_null_rejete() {
        let tp = test_platform();
        let (user_id, token) = seed_user(&tp, "a@b.com", "alice").await;
        let app = init_app(tp.platform.clone()).await;

        let req = test::TestRequest::put()
            .uri(&format!("/api/users/{user_id}"))
            .insert_header(bearer(&token))
            .set_json(json!({ "pseudo": null }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn modifier_le_profil_d_un_autre_interdit() {
        let tp = test_platform();
        let (victime_id, _) = seed_user(&tp, "a@b.com", "alice").await;
        let (_, autre_token) = seed_user(&tp, "b@c.com", "bob").await;
        let app = init_app(tp.platform.clone()).await;

        let req = test::TestRequest::put()
            .uri(&format!("/api/users/{victime_id}"))
            .insert_header(bearer(&autre_token))
            .set_json(json!({ "pseudo": "pirate" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_rt::test]
    async fn suppression_du_compte_en_cascade() {
        let tp = test_platform();
        let (user_id, token) = seed_user(&tp, "a@b.com", "alice").await;
        seed_annonce(&tp, user_id, "Vélo de course").await;
        let app = init_app(tp.platform.clone()).await;

        let req = test::TestRequest::delete()
            .uri(&format!("/api/users/{user_id}"))
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(tp.store.row_count("users"), 0);
        assert_eq!(tp.store.row_count("annonces"), 0);
        assert_eq!(tp.identity.account_count(), 0);
    }

    #[actix_rt::test]
    async fn supprimer_le_compte_d_un_autre_interdit() {
        let tp = test_platform();
        let (victime_id, _) = seed_user(&tp, "a@b.com", "alice").await;
        let (_, autre_token) = seed_user(&tp, "b@c.com", "bob").await;
        let app = init_app(tp.platform.clone()).await;

        let req = test::TestRequest::delete()
            .uri(&format!("/api/users/{victime_id}"))
            .insert_header(bearer(&autre_token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(tp.store.row_count("users"), 2);
    }
}
