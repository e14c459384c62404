use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("réponse invalide du store ({0})")]
    InvalidResponse(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Filtre d'égalité sur une colonne. Le store ne supporte rien de plus
/// côté coeur : pas de requêtes spécifiques au domaine.
#[derive(Debug, Clone)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Filter {
            column: column.to_string(),
            value: value.into(),
        }
    }
}

/// Tri sur une colonne.
#[derive(Debug, Clone, Copy)]
pub struct Order {
    pub column: &'static str,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: &'static str) -> Self {
        Order {
            column,
            ascending: true,
        }
    }

    pub fn desc(column: &'static str) -> Self {
        Order {
            column,
            ascending: false,
        }
    }
}

/// Accès générique insert/select/update/delete au store relationnel hébergé.
/// Les lignes circulent en `serde_json::Value`, le typage se fait dans `models/`.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Insère une ligne et renvoie la ligne telle que stockée (id affecté).
    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError>;

    async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<Order>,
    ) -> Result<Vec<Value>, StoreError>;

    /// Applique `patch` aux lignes filtrées et renvoie les lignes mises à jour.
    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, StoreError>;

    /// Renvoie le nombre de lignes supprimées.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, StoreError>;
}

/// Client REST du store relationnel hébergé (API de style PostgREST :
/// `/rest/v1/{table}`, filtres `col=eq.val`, `Prefer: return=representation`).
pub struct HttpRelationalStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpRelationalStore {
    pub fn new(http: reqwest::Client, base_url: String, api_key: String) -> Self {
        HttpRelationalStore {
            http,
            base_url,
            api_key,
        }
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn with_headers(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
        filters
            .iter()
            .map(|f| (f.column.clone(), format!("eq.{}", render_value(&f.value))))
            .collect()
    }

    async fn read_rows(resp: reqwest::Response, table: &str) -> Result<Vec<Value>, StoreError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::InvalidResponse(format!(
                "{status} sur {table}: {body}"
            )));
        }
        Ok(resp.json::<Vec<Value>>().await?)
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RelationalStore for HttpRelationalStore {
    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError> {
        let resp = self
            .with_headers(self.http.post(self.endpoint(table)))
            .header("Prefer", "return=representation")
            .json(&vec![row])
            .send()
            .await?;

        let mut rows = Self::read_rows(resp, table).await?;
        if rows.is_empty() {
            return Err(StoreError::InvalidResponse(format!(
                "insertion sans représentation sur {table}"
            )));
        }
        Ok(rows.remove(0))
    }

    async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<Order>,
    ) -> Result<Vec<Value>, StoreError> {
        let mut params = Self::filter_params(filters);
        params.push(("select".to_string(), "*".to_string()));
        if let Some(order) = order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }

        let resp = self
            .with_headers(self.http.get(self.endpoint(table)))
            .query(&params)
            .send()
            .await?;

        Self::read_rows(resp, table).await
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let resp = self
            .with_headers(self.http.patch(self.endpoint(table)))
            .header("Prefer", "return=representation")
            .query(&Self::filter_params(filters))
            .json(&patch)
            .send()
            .await?;

        Self::read_rows(resp, table).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, StoreError> {
        let resp = self
            .with_headers(self.http.delete(self.endpoint(table)))
            .header("Prefer", "return=representation")
            .query(&Self::filter_params(filters))
            .send()
            .await?;

        let rows = Self::read_rows(resp, table).await?;
        Ok(rows.len() as u64)
    }
}
