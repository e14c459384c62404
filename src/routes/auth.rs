use actix_web::{HttpResponse, get, post, web};
use chrono::Utc;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::dto::{LoginRequest, SignupRequest};
use crate::models::users::{self, User};
use crate::platform::Platform;
use crate::services::validation;

/// POST /api/auth/signup - Créer un compte (PUBLIC)
///
/// Le compte d'identité et la ligne de profil doivent réussir tous les
/// deux : si le profil échoue, le compte d'identité est annulé.
#[post("/signup")]
pub async fn signup(
    platform: web::Data<Platform>,
    body: web::Json<SignupRequest>,
) -> Result<HttpResponse, ApiError> {
    // 1. Validation complète avant toute écriture
    let mut body = body.into_inner();
    body.normalize();
    if let Err(errors) = body.validate() {
        return Err(ApiError::Validation(validation::first_message(&errors)));
    }
    validation::check_email(&body.email)?;
    if let Some(telephone) = &body.telephone {
        validation::check_telephone(telephone)?;
    }

    // 2. Compte auprès du fournisseur d'identité (doublon -> 409)
    let metadata = serde_json::json!({
        "pseudo": body.pseudo,
        "prenom": body.prenom,
        "nom": body.nom,
        "telephone": body.telephone,
        "localite": body.localite,
    });
    let auth = platform
        .identity
        .create_account(&body.email, &body.password, metadata)
        .await?;

    // 3. Ligne de profil dans le store
    let now = Utc::now();
    let user = User {
        id: auth.account.id,
        email: body.email.clone(),
        pseudo: body.pseudo.clone(),
        prenom: body.prenom.clone(),
        nom: body.nom.clone(),
        telephone: body.telephone.clone(),
        localite: body.localite.clone(),
        avatar_url: None,
        created_at: now,
        last_active: now,
    };

    let created = match users::create_user(platform.store.as_ref(), &user).await {
        Ok(created) => created,
        Err(err) => {
            // 4. Rollback du compte d'identité, sinon compte sans profil
            tracing::error!(error = %err, user_id = %auth.account.id,
                "profil non enregistré après l'inscription, rollback du compte");
            if let Err(rollback_err) = platform.identity.delete_account(auth.account.id).await {
                tracing::error!(error = %rollback_err, user_id = %auth.account.id,
                    "rollback du compte d'identité impossible");
            }
            return Err(ApiError::Upstream(
                "Erreur lors de l'enregistrement des détails de l'utilisateur.".to_string(),
            ));
        }
    };

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Utilisateur inscrit avec succès !",
        "user": {
            "id": created.id,
            "email": created.email,
            "pseudo": created.pseudo,
            "localite": created.localite,
        },
        "session": auth.session,
    })))
}

/// POST /api/auth/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    platform: web::Data<Platform>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    if let Err(errors) = body.validate() {
        return Err(ApiError::Validation(validation::first_message(&errors)));
    }
    validation::check_email(&body.email)?;

    // Identifiants vérifiés par le fournisseur (échec -> 401)
    let auth = platform
        .identity
        .sign_in(&body.email, &body.password)
        .await?;

    users::update_last_active(platform.store.as_ref(), auth.account.id).await;

    let details = users::get_user_by_id(platform.store.as_ref(), auth.account.id)
        .await?
        .ok_or_else(|| {
            tracing::warn!(user_id = %auth.account.id, "profil absent du store au login");
            ApiError::NotFound(
                "Détails utilisateur non trouvés. Veuillez contacter l'administrateur."
                    .to_string(),
            )
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Connexion réussie !",
        "user": {
            "id": details.id,
            "email": details.email,
            "pseudo": details.pseudo,
            "prenom": details.prenom,
            "nom": details.nom,
            "telephone": details.telephone,
            "localite": details.localite,
        },
        "session": auth.session,
    })))
}

/// POST /api/auth/logout - Se déconnecter (PUBLIC)
#[post("/logout")]
pub async fn logout(platform: web::Data<Platform>) -> Result<HttpResponse, ApiError> {
    platform.identity.sign_out().await.map_err(|err| {
        tracing::error!(error = %err, "déconnexion refusée par le fournisseur");
        ApiError::Upstream("Erreur lors de la déconnexion.".to_string())
    })?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Déconnexion réussie." })))
}

/// GET /api/auth/me - Profil de l'utilisateur connecté (PROTÉGÉE)
#[get("/me")]
pub async fn me(
    platform: web::Data<Platform>,
    auth_user: AuthUser,
) -> Result<HttpResponse, ApiError> {
    let user = users::get_user_by_id(platform.store.as_ref(), auth_user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Utilisateur non trouvé.".to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "user": {
            "id": user.id,
            "pseudo": user.pseudo,
            "localite": user.localite,
            "telephone": user.telephone,
            "email": user.email,
            "avatar_url": user.avatar_url,
            "created_at": user.created_at,
            "last_active": user.last_active,
        },
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(signup)
            .service(login)
            .service(logout)
            .service(me),
    );
}
