use async_trait::async_trait;
use thiserror::Error;

/// Bucket unique où vivent les images d'annonces.
pub const BUCKET_NAME: &str = "images";

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("stockage objet: {0}")]
    Upstream(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Stockage objet hébergé : octets bruts en entrée, URL publique en sortie.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Téléverse `data` sous `path` dans le bucket et renvoie l'URL publique.
    async fn upload(
        &self,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ObjectStoreError>;

    async fn remove(&self, path: &str) -> Result<(), ObjectStoreError>;
}

/// Client REST du stockage hébergé (`/storage/v1/object/{bucket}/{path}`).
pub struct HttpObjectStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpObjectStore {
    pub fn new(http: reqwest::Client, base_url: String, api_key: String) -> Self {
        HttpObjectStore {
            http,
            base_url,
            api_key,
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, BUCKET_NAME, path)
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn upload(
        &self,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ObjectStoreError> {
        let resp = self
            .http
            .post(self.object_url(path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", content_type.to_string())
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ObjectStoreError::Upstream(format!(
                "upload de {path}: {}",
                resp.status()
            )));
        }

        Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, BUCKET_NAME, path
        ))
    }

    async fn remove(&self, path: &str) -> Result<(), ObjectStoreError> {
        let resp = self
            .http
            .delete(self.object_url(path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ObjectStoreError::Upstream(format!(
                "suppression de {path}: {}",
                resp.status()
            )));
        }
        Ok(())
    }
}
