//! Doublures en mémoire des trois collaborateurs externes, pour les tests.
//! Même contrat que les clients HTTP, sans réseau.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::Platform;
use super::identity::{AuthAccount, AuthSession, IdentityError, IdentityProvider};
use super::object_store::{BUCKET_NAME, ObjectStore, ObjectStoreError};
use super::store::{Filter, Order, RelationalStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map(|rows| rows.len())
            .unwrap_or(0)
    }
}

fn matches(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|f| row.get(&f.column) == Some(&f.value))
}

fn compare_column(a: &Value, b: &Value, column: &str) -> CmpOrdering {
    let (a, b) = (&a[column], &b[column]);
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(CmpOrdering::Equal),
        _ => a
            .as_str()
            .unwrap_or_default()
            .cmp(b.as_str().unwrap_or_default()),
    }
}

#[async_trait]
impl RelationalStore for MemoryStore {
    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError> {
        let mut row = row;
        let obj = row
            .as_object_mut()
            .ok_or_else(|| StoreError::InvalidResponse("ligne non-objet".to_string()))?;
        // Comme le store hébergé : id affecté à l'insertion s'il manque.
        if !obj.contains_key("id") {
            obj.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<Order>,
    ) -> Result<Vec<Value>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Value> = tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| matches(r, filters)).cloned().collect())
            .unwrap_or_default();
        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let cmp = compare_column(a, b, order.column);
                if order.ascending { cmp } else { cmp.reverse() }
            });
        }
        Ok(rows)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let patch = patch
            .as_object()
            .ok_or_else(|| StoreError::InvalidResponse("patch non-objet".to_string()))?
            .clone();
        let mut tables = self.tables.lock().unwrap();
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|r| matches(r, filters)) {
                if let Some(obj) = row.as_object_mut() {
                    for (k, v) in &patch {
                        obj.insert(k.clone(), v.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !matches(r, filters));
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        path: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, ObjectStoreError> {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), data);
        Ok(format!(
            "http://platform.test/storage/v1/object/public/{BUCKET_NAME}/{path}"
        ))
    }

    async fn remove(&self, path: &str) -> Result<(), ObjectStoreError> {
        match self.objects.lock().unwrap().remove(path) {
            Some(_) => Ok(()),
            None => Err(ObjectStoreError::Upstream(format!("objet absent: {path}"))),
        }
    }
}

#[derive(Default)]
pub struct MemoryIdentity {
    // email -> (mot de passe, id)
    accounts: Mutex<HashMap<String, (String, Uuid)>>,
    tokens: Mutex<HashMap<String, Uuid>>,
}

impl MemoryIdentity {
    fn issue_token(&self, id: Uuid) -> String {
        let token = format!("tok-{}", Uuid::new_v4());
        self.tokens.lock().unwrap().insert(token.clone(), id);
        token
    }

    fn email_of(&self, id: Uuid) -> Option<String> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|(_, (_, account_id))| *account_id == id)
            .map(|(email, _)| email.clone())
    }

    /// Raccourci de test : compte déjà inscrit plus un jeton valide.
    pub fn register(&self, email: &str, password: &str) -> (Uuid, String) {
        let id = Uuid::new_v4();
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), id));
        (id, self.issue_token(id))
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn verify_token(&self, token: &str) -> Result<AuthAccount, IdentityError> {
        let id = self
            .tokens
            .lock()
            .unwrap()
            .get(token)
            .copied()
            .ok_or(IdentityError::InvalidToken)?;
        let email = self.email_of(id).ok_or(IdentityError::InvalidToken)?;
        Ok(AuthAccount { id, email })
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        _metadata: Value,
    ) -> Result<AuthSession, IdentityError> {
        if self.accounts.lock().unwrap().contains_key(email) {
            return Err(IdentityError::EmailTaken);
        }
        let (id, token) = self.register(email, password);
        Ok(AuthSession {
            account: AuthAccount {
                id,
                email: email.to_string(),
            },
            session: serde_json::json!({ "access_token": token }),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let id = {
            let accounts = self.accounts.lock().unwrap();
            match accounts.get(email) {
                Some((stored, id)) if stored == password => *id,
                _ => return Err(IdentityError::InvalidCredentials),
            }
        };
        let token = self.issue_token(id);
        Ok(AuthSession {
            account: AuthAccount {
                id,
                email: email.to_string(),
            },
            session: serde_json::json!({ "access_token": token }),
        })
    }

    async fn delete_account(&self, user_id: Uuid) -> Result<(), IdentityError> {
        self.accounts
            .lock()
            .unwrap()
            .retain(|_, (_, id)| *id != user_id);
        self.tokens.lock().unwrap().retain(|_, id| *id != user_id);
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        Ok(())
    }
}

/// Plateforme de test : le bundle `Platform` plus les doublures concrètes
/// pour inspecter l'état après coup.
pub struct TestPlatform {
    pub platform: Platform,
    pub store: Arc<MemoryStore>,
    pub objects: Arc<MemoryObjectStore>,
    pub identity: Arc<MemoryIdentity>,
}

pub fn test_platform() -> TestPlatform {
    let store = Arc::new(MemoryStore::default());
    let objects = Arc::new(MemoryObjectStore::default());
    let identity = Arc::new(MemoryIdentity::default());
    TestPlatform {
        platform: Platform {
            identity: identity.clone(),
            store: store.clone(),
            objects: objects.clone(),
        },
        store,
        objects,
        identity,
    }
}
