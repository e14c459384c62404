//! Aides partagées par les tests de routes : application montée sur la
//! plateforme en mémoire, semis de données et corps multipart.

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, Error, test, web};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::platform::Platform;
use crate::platform::memory::TestPlatform;
use crate::platform::store::RelationalStore;
use crate::routes;

pub async fn init_app(
    platform: Platform,
) -> impl Service<Request, Response = ServiceResponse, Error = Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(platform))
            .configure(routes::configure_routes),
    )
    .await
}

pub async fn read_json(resp: ServiceResponse) -> Value {
    test::read_body_json(resp).await
}

/// Compte d'identité plus ligne de profil, comme après un signup réussi.
pub async fn seed_user(tp: &TestPlatform, email: &str, pseudo: &str) -> (Uuid, String) {
    let (id, token) = tp.identity.register(email, "secret");
    let now = Utc::now();
    tp.store
        .insert(
            "users",
            serde_json::json!({
                "id": id,
                "email": email,
                "pseudo": pseudo,
                "localite": "Lyon",
                "created_at": now,
                "last_active": now,
            }),
        )
        .await
        .unwrap();
    (id, token)
}

pub async fn seed_category(tp: &TestPlatform, id: i64, nom: &str) {
    tp.store
        .insert("categories", serde_json::json!({ "id": id, "nom": nom }))
        .await
        .unwrap();
}

/// Annonce minimale rattachée à `user_id`, catégorie 1.
pub async fn seed_annonce(tp: &TestPlatform, user_id: Uuid, titre: &str) -> Uuid {
    let row = tp
        .store
        .insert(
            "annonces",
            serde_json::json!({
                "titre": titre,
                "description": "Description suffisamment longue.",
                "prix": 25.0,
                "localite": "Lyon",
                "category_id": 1,
                "user_id": user_id,
                "created_at": Utc::now(),
            }),
        )
        .await
        .unwrap();
    row["id"].as_str().unwrap().parse().unwrap()
}

pub const BOUNDARY: &str = "----limite-de-test";

/// Corps multipart/form-data : champs texte puis fichiers
/// (nom de champ, nom de fichier, type MIME, octets).
pub fn multipart_body(
    fields: &[(&str, &str)],
    files: &[(&str, &str, &str, &[u8])],
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    for (name, file_name, content_type, data) in files {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> (&'static str, String) {
    ("Content-Type", format!("multipart/form-data; boundary={BOUNDARY}"))
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}
