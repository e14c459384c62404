// Clients vers la plateforme hébergée (identité, store relationnel, stockage objet).
// Toute la persistance appartient à la plateforme ; ici on ne fait que consommer ses API.

pub mod identity;
pub mod object_store;
pub mod store;

#[cfg(test)]
pub mod memory;

use std::env;
use std::sync::Arc;

use identity::{HttpIdentityProvider, IdentityProvider};
use object_store::{HttpObjectStore, ObjectStore};
use store::{HttpRelationalStore, RelationalStore};

/// Regroupe les trois collaborateurs externes, partagé entre les handlers
/// via `web::Data<Platform>`.
#[derive(Clone)]
pub struct Platform {
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn RelationalStore>,
    pub objects: Arc<dyn ObjectStore>,
}

impl Platform {
    /// Construit les clients HTTP à partir de l'environnement.
    /// Variables requises : PLATFORM_URL, PLATFORM_ANON_KEY, PLATFORM_SERVICE_KEY.
    pub fn from_env() -> Result<Self, env::VarError> {
        let base_url = env::var("PLATFORM_URL")?.trim_end_matches('/').to_string();
        let anon_key = env::var("PLATFORM_ANON_KEY")?;
        let service_key = env::var("PLATFORM_SERVICE_KEY")?;

        let http = reqwest::Client::new();

        Ok(Platform {
            identity: Arc::new(HttpIdentityProvider::new(
                http.clone(),
                base_url.clone(),
                anon_key,
                service_key.clone(),
            )),
            store: Arc::new(HttpRelationalStore::new(
                http.clone(),
                base_url.clone(),
                service_key.clone(),
            )),
            objects: Arc::new(HttpObjectStore::new(http, base_url, service_key)),
        })
    }
}
