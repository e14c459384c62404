pub mod annonces;
pub mod auth;
pub mod categories;
pub mod favoris;
pub mod users;

#[cfg(test)]
pub mod test_utils;

use actix_web::{HttpResponse, web};

use crate::error::ApiError;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .app_data(multipart_config())
        .service(
            web::scope("/api")
                .configure(auth::configure)
                .configure(users::configure)
                .configure(annonces::configure)
                .configure(categories::configure)
                .configure(favoris::configure),
        )
        .default_service(web::route().to(not_found));
}

/// Corps JSON illisible ou absent : 400 avec le même enrobage que le reste.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::debug!(error = %err, "corps JSON rejeté");
        ApiError::Validation(
            "Body vide ou mal formé. Vérifiez le Content-Type et le format JSON.".to_string(),
        )
        .into()
    })
}

/// Identifiant de chemin non analysable (UUID attendu) : 400.
fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        tracing::debug!(error = %err, "paramètre de chemin rejeté");
        ApiError::Validation("Identifiant invalide dans l'URL.".to_string()).into()
    })
}

/// Les images restent en mémoire (pas de fichiers temporaires), il faut
/// de la marge pour 5 fichiers de 5 Mo.
fn multipart_config() -> actix_multipart::form::MultipartFormConfig {
    actix_multipart::form::MultipartFormConfig::default()
        .total_limit(40 * 1024 * 1024)
        .memory_limit(40 * 1024 * 1024)
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "message": "Route non trouvée. Veuillez vérifier l'URL et la méthode HTTP.",
    }))
}
