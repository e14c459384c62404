use actix_web::{HttpResponse, get, web};

use crate::error::ApiError;
use crate::models::categories;
use crate::platform::Platform;

/// GET /api/categories - Liste des catégories, triées par nom (PUBLIC)
#[get("")]
pub async fn list_categories(platform: web::Data<Platform>) -> Result<HttpResponse, ApiError> {
    let categories = categories::get_all_categories(platform.store.as_ref()).await?;
    Ok(HttpResponse::Ok().json(categories))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/categories").service(list_categories));
}
