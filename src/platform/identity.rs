use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("email déjà enregistré")]
    EmailTaken,
    #[error("identifiants invalides")]
    InvalidCredentials,
    #[error("jeton invalide ou expiré")]
    InvalidToken,
    #[error("fournisseur d'identité: {0}")]
    Upstream(String),
}

/// Compte tel que vu par le fournisseur d'identité. Le coeur ne connaît
/// ni le mot de passe ni le contenu du jeton.
#[derive(Debug, Clone)]
pub struct AuthAccount {
    pub id: Uuid,
    pub email: String,
}

/// Résultat d'une inscription ou d'une connexion : le compte plus la session
/// opaque émise par le fournisseur, renvoyée telle quelle au client.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub account: AuthAccount,
    pub session: Value,
}

/// Fournisseur d'identité externe. Création de compte, vérification des
/// identifiants et des jetons, révocation : tout lui appartient.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<AuthAccount, IdentityError>;

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<AuthSession, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError>;

    async fn delete_account(&self, user_id: Uuid) -> Result<(), IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;
}

/// Client REST du fournisseur d'identité hébergé (API de style GoTrue).
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_key: String,
}

impl HttpIdentityProvider {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        anon_key: String,
        service_key: String,
    ) -> Self {
        HttpIdentityProvider {
            http,
            base_url,
            anon_key,
            service_key,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn parse_account(user: &Value) -> Result<AuthAccount, IdentityError> {
        let id = user["id"]
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| IdentityError::Upstream("compte sans id exploitable".to_string()))?;
        let email = user["email"].as_str().unwrap_or_default().to_string();
        Ok(AuthAccount { id, email })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<AuthAccount, IdentityError> {
        let resp = self
            .http
            .get(self.endpoint("user"))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(IdentityError::InvalidToken);
        }
        if !status.is_success() {
            return Err(IdentityError::Upstream(format!(
                "vérification du jeton: {status}"
            )));
        }

        let user: Value = resp
            .json()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;
        Self::parse_account(&user)
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<AuthSession, IdentityError> {
        let resp = self
            .http
            .post(self.endpoint("signup"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": metadata,
            }))
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if !status.is_success() {
            // Le fournisseur signale le doublon par message, parfois traduit.
            let msg = body["msg"]
                .as_str()
                .or_else(|| body["message"].as_str())
                .or_else(|| body["error_description"].as_str())
                .unwrap_or_default()
                .to_lowercase();
            if msg.contains("already registered")
                || msg.contains("already exists")
                || msg.contains("déjà enregistré")
            {
                return Err(IdentityError::EmailTaken);
            }
            return Err(IdentityError::Upstream(format!("inscription: {status} {msg}")));
        }

        // Selon la configuration du fournisseur, le compte arrive soit à la
        // racine soit sous `user`, la session sous `session` ou à la racine.
        let user = if body.get("user").map(|u| u.is_object()).unwrap_or(false) {
            &body["user"]
        } else {
            &body
        };
        let account = Self::parse_account(user)?;
        let session = body.get("session").cloned().unwrap_or(Value::Null);
        Ok(AuthSession { account, session })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let resp = self
            .http
            .post(self.endpoint("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::BAD_REQUEST
            || status == reqwest::StatusCode::UNAUTHORIZED
        {
            return Err(IdentityError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(IdentityError::Upstream(format!("connexion: {status}")));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;
        let account = Self::parse_account(&body["user"])?;
        Ok(AuthSession {
            account,
            session: body,
        })
    }

    async fn delete_account(&self, user_id: Uuid) -> Result<(), IdentityError> {
        let resp = self
            .http
            .delete(self.endpoint(&format!("admin/users/{user_id}")))
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(IdentityError::Upstream(format!(
                "suppression du compte: {}",
                resp.status()
            )));
        }
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let resp = self
            .http
            .post(self.endpoint("logout"))
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(IdentityError::Upstream(format!(
                "déconnexion: {}",
                resp.status()
            )));
        }
        Ok(())
    }
}
