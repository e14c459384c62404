use actix_multipart::form::MultipartForm;
use actix_multipart::form::bytes::Bytes;
use actix_multipart::form::text::Text;
use actix_web::{HttpResponse, delete, get, post, put, web};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::middleware::auth::require_annonce_owner;
use crate::models::dto::UpdateAnnonceRequest;
use crate::models::{annonces, images};
use crate::platform::Platform;
use crate::services::cascade_service::CascadeService;
use crate::services::validation;

pub const MAX_IMAGES_PAR_ANNONCE: usize = 5;

/// Formulaire de création. Tout arrive en chaînes ; les champs manquants
/// restent None pour garder la main sur le message d'erreur.
#[derive(Debug, MultipartForm)]
pub struct CreateAnnonceForm {
    pub titre: Option<Text<String>>,
    pub description: Option<Text<String>>,
    pub prix: Option<Text<String>>,
    pub localite: Option<Text<String>>,
    pub category_id: Option<Text<String>>,
    // Limite par fichier au-dessus des 5 Mo métier : le dépassement est
    // signalé par check_image avec un message contrôlé.
    #[multipart(rename = "images", limit = "6MiB")]
    pub images: Vec<Bytes>,
}

#[derive(Debug, MultipartForm)]
pub struct UploadImageForm {
    #[multipart(limit = "6MiB")]
    pub image: Option<Bytes>,
}

fn check_image_file(file: &Bytes) -> Result<(), ApiError> {
    let file_name = file.file_name.as_deref().unwrap_or("fichier");
    validation::check_image(
        file.content_type.as_ref().map(|m| m.essence_str()),
        file.data.len(),
        file_name,
    )
}

/// POST /api/annonces - Créer une annonce avec ses images (PROTÉGÉE)
#[post("")]
pub async fn create_annonce(
    platform: web::Data<Platform>,
    auth_user: AuthUser,
    form: MultipartForm<CreateAnnonceForm>,
) -> Result<HttpResponse, ApiError> {
    let form = form.into_inner();

    // Tout est validé avant la moindre écriture, fichiers compris.
    let new = validation::validate_new_annonce(
        form.titre.as_ref().map(|t| t.0.as_str()),
        form.description.as_ref().map(|t| t.0.as_str()),
        form.prix.as_ref().map(|t| t.0.as_str()),
        form.localite.as_ref().map(|t| t.0.as_str()),
        form.category_id.as_ref().map(|t| t.0.as_str()),
    )?;
    if form.images.len() > MAX_IMAGES_PAR_ANNONCE {
        return Err(ApiError::Validation(format!(
            "Vous ne pouvez téléverser que {MAX_IMAGES_PAR_ANNONCE} images au maximum."
        )));
    }
    for file in &form.images {
        check_image_file(file)?;
    }

    let annonce = annonces::create_annonce(platform.store.as_ref(), &new, auth_user.id).await?;

    // L'annonce existe déjà : une image qui échoue est journalisée,
    // les autres continuent.
    let mut uploaded = Vec::with_capacity(form.images.len());
    for file in form.images {
        let content_type = file
            .content_type
            .as_ref()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();
        match images::upload_image(
            platform.store.as_ref(),
            platform.objects.as_ref(),
            file.data.to_vec(),
            &content_type,
            annonce.id,
        )
        .await
        {
            Ok(image) => uploaded.push(image),
            Err(err) => {
                tracing::warn!(error = %err, annonce_id = %annonce.id,
                    "image non téléversée à la création de l'annonce");
            }
        }
    }

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Annonce créée avec succès !",
        "annonce": annonce,
        "images": uploaded,
    })))
}

/// GET /api/annonces - Fil de toutes les annonces (PROTÉGÉE)
#[get("")]
pub async fn list_annonces(
    platform: web::Data<Platform>,
    _auth_user: AuthUser,
) -> Result<HttpResponse, ApiError> {
    let annonces = annonces::get_all_annonces(platform.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(annonces))
}

/// GET /api/annonces/user/me - Annonces de l'utilisateur connecté (PROTÉGÉE)
#[get("/user/me")]
pub async fn mes_annonces(
    platform: web::Data<Platform>,
    auth_user: AuthUser,
) -> Result<HttpResponse, ApiError> {
    let annonces = annonces::get_annonces_by_user(platform.store.as_ref(), auth_user.id).await?;
    Ok(HttpResponse::Ok().json(annonces))
}

/// GET /api/annonces/{id} - Détail d'une annonce (PROTÉGÉE)
#[get("/{id}")]
pub async fn get_annonce(
    platform: web::Data<Platform>,
    _auth_user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let detail = annonces::get_annonce_detail(platform.store.as_ref(), path.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Annonce non trouvée.".to_string()))?;
    Ok(HttpResponse::Ok().json(detail))
}

/// PUT /api/annonces/{id} - Mise à jour partielle (PROTÉGÉE, propriétaire)
#[put("/{id}")]
pub async fn update_annonce(
    platform: web::Data<Platform>,
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateAnnonceRequest>,
) -> Result<HttpResponse, ApiError> {
    let annonce_id = path.into_inner();
    require_annonce_owner(platform.store.as_ref(), annonce_id, auth_user.id).await?;

    let patch = validation::validate_annonce_update(&body)?;
    let annonce = annonces::update_annonce(platform.store.as_ref(), annonce_id, auth_user.id, patch)
        .await?
        .ok_or_else(|| {
            ApiError::Validation(
                "Impossible de mettre à jour l'annonce, vérifiez l'ID ou les données fournies."
                    .to_string(),
            )
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Annonce mise à jour avec succès !",
        "annonce": annonce,
    })))
}

/// DELETE /api/annonces/{id} - Suppression en cascade (PROTÉGÉE, propriétaire)
#[delete("/{id}")]
pub async fn delete_annonce(
    platform: web::Data<Platform>,
    auth_user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    CascadeService::delete_annonce(&platform, path.into_inner(), auth_user.id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Annonce et images associées supprimées avec succès.",
    })))
}

/// POST /api/annonces/{id}/images - Ajouter une image (PROTÉGÉE, propriétaire)
#[post("/{id}/images")]
pub async fn upload_annonce_image(
    platform: web::Data<Platform>,
    auth_user: AuthUser,
    path: web::Path<Uuid>,
    form: MultipartForm<UploadImageForm>,
) -> Result<HttpResponse, ApiError> {
    let annonce_id = path.into_inner();
    require_annonce_owner(platform.store.as_ref(), annonce_id, auth_user.id).await?;

    let file = form.into_inner().image.ok_or_else(|| {
        ApiError::Validation("Aucun fichier image n'a été fourni.".to_string())
    })?;
    check_image_file(&file)?;

    let content_type = file
        .content_type
        .as_ref()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_default();
    let image = images::upload_image(
        platform.store.as_ref(),
        platform.objects.as_ref(),
        file.data.to_vec(),
        &content_type,
        annonce_id,
    )
    .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Image téléchargée avec succès !",
        "image": image,
    })))
}

/// GET /api/annonces/{id}/images - Images d'une annonce (PUBLIC)
#[get("/{id}/images")]
pub async fn list_annonce_images(
    platform: web::Data<Platform>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let images =
        images::get_images_by_annonce_id(platform.store.as_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(images))
}

/// DELETE /api/annonces/{annonce_id}/images/{image_id} (PROTÉGÉE, propriétaire)
#[delete("/{annonce_id}/images/{image_id}")]
pub async fn delete_annonce_image(
    platform: web::Data<Platform>,
    auth_user: AuthUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, ApiError> {
    let (annonce_id, image_id) = path.into_inner();
    require_annonce_owner(platform.store.as_ref(), annonce_id, auth_user.id).await?;

    let image = images::find_image(platform.store.as_ref(), image_id, annonce_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Image non trouvée.".to_string()))?;
    images::delete_image(platform.store.as_ref(), platform.objects.as_ref(), &image).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Image supprimée avec succès !",
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    // /user/me avant /{id}, sinon "user" serait lu comme un id.
    cfg.service(
        web::scope("/annonces")
            .service(create_annonce)
            .service(list_annonces)
            .service(mes_annonces)
            .service(list_annonce_images)
            .service(upload_annonce_image)
            .service(delete_annonce_image)
            .service(get_annonce)
            .service(update_annonce)
            .service(delete_annonce),
    );
}
