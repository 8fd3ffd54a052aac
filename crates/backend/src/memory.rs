use crate::{AuthResponse, AuthUser, Backend, Filter, Session};
use async_trait::async_trait;
use aulanet_shared::{AccessorError, AuthError, StorageError};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

struct Account {
    id: Uuid,
    email: String,
    password: String,
    confirmed: bool,
}

#[derive(Default)]
struct MemoryState {
    accounts: Vec<Account>,
    tables: HashMap<String, Vec<Value>>,
    objects: HashMap<String, (String, Vec<u8>)>,
    session: Option<Session>,
    require_confirmation: bool,
    failing_inserts: HashSet<String>,
    table_reads: usize,
    sign_outs: usize,
    next_row_id: i64,
}

/// In-process [`Backend`] for tests and the offline demo.
///
/// Starts with the four portal roles provisioned. Knobs cover the situations
/// worth rehearsing: [`set_require_confirmation`](Self::set_require_confirmation)
/// withholds sessions at sign-up the way a confirmation-gated deployment
/// does, [`fail_next_insert`](Self::fail_next_insert) makes one write fail so
/// compensation paths can be observed, and the read/sign-out counters tell
/// tests which calls actually happened.
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let backend = Self {
            state: Mutex::new(MemoryState::default()),
        };
        {
            let mut state = backend.state_mut();
            let roles = state.tables.entry("roles".to_string()).or_default();
            for (id, nombre) in [(1, "alumno"), (2, "docente"), (3, "admin"), (4, "padre")] {
                roles.push(json!({ "id": id, "nombre": nombre }));
            }
        }
        backend
    }

    fn state_mut(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make sign-up behave like a deployment with mandatory email
    /// confirmation: accounts are created unusable and without a session.
    pub fn set_require_confirmation(&self, required: bool) {
        self.state_mut().require_confirmation = required;
    }

    /// The next insert into `table` fails with a provider error.
    pub fn fail_next_insert(&self, table: &str) {
        self.state_mut().failing_inserts.insert(table.to_string());
    }

    /// Seeds a row directly, bypassing the failure knob.
    pub fn insert_row(&self, table: &str, row: Value) {
        let mut state = self.state_mut();
        if let Some(explicit) = row.get("id").and_then(Value::as_i64) {
            state.next_row_id = state.next_row_id.max(explicit);
        }
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.state_mut()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn clear_table(&self, table: &str) {
        self.state_mut().tables.remove(table);
    }

    /// How many `select` calls this backend served.
    pub fn table_reads(&self) -> usize {
        self.state_mut().table_reads
    }

    /// How many times `sign_out` was called, with or without a session.
    pub fn sign_out_count(&self) -> usize {
        self.state_mut().sign_outs
    }

    pub fn object(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        self.state_mut()
            .objects
            .get(&format!("{bucket}/{path}"))
            .map(|(_, bytes)| bytes.clone())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthError> {
        let normalized = email.to_lowercase();
        let mut state = self.state_mut();
        let Some(account) = state
            .accounts
            .iter()
            .find(|account| account.email == normalized)
        else {
            return Err(AuthError::InvalidCredentials);
        };
        if account.password != password {
            return Err(AuthError::InvalidCredentials);
        }
        if !account.confirmed {
            return Ok(AuthResponse::default());
        }
        let user = AuthUser {
            id: account.id,
            email: account.email.clone(),
            email_confirmed: true,
        };
        let session = Session {
            user_id: account.id,
            email: account.email.clone(),
            access_token: format!("memory-token-{}", account.id),
        };
        state.session = Some(session.clone());
        Ok(AuthResponse {
            user: Some(user),
            session: Some(session),
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let normalized = email.to_lowercase();
        let mut state = self.state_mut();
        if state
            .accounts
            .iter()
            .any(|account| account.email == normalized)
        {
            return Err(AuthError::Provider("User already registered".into()));
        }
        let id = Uuid::new_v4();
        let confirmed = !state.require_confirmation;
        state.accounts.push(Account {
            id,
            email: normalized.clone(),
            password: password.to_string(),
            confirmed,
        });
        let user = AuthUser {
            id,
            email: normalized.clone(),
            email_confirmed: confirmed,
        };
        if !confirmed {
            return Ok(AuthResponse {
                user: Some(user),
                session: None,
            });
        }
        let session = Session {
            user_id: id,
            email: normalized,
            access_token: format!("memory-token-{id}"),
        };
        state.session = Some(session.clone());
        Ok(AuthResponse {
            user: Some(user),
            session: Some(session),
        })
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut state = self.state_mut();
        state.sign_outs += 1;
        state.session = None;
        Ok(())
    }

    async fn get_session(&self) -> Option<Session> {
        self.state_mut().session.clone()
    }

    async fn select(
        &self,
        table: &str,
        _columns: &str,
        filters: &[Filter],
    ) -> Result<Vec<Value>, AccessorError> {
        let mut state = self.state_mut();
        state.table_reads += 1;
        let rows = state
            .tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row_matches(row, filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, AccessorError> {
        let mut state = self.state_mut();
        if state.failing_inserts.remove(table) {
            return Err(AccessorError::Query(format!(
                "forced insert failure on {table}"
            )));
        }
        let mut row = row;
        if let Some(id) = row.get("id") {
            let id_text = scalar_text(id);
            let duplicate = state.tables.get(table).is_some_and(|rows| {
                rows.iter()
                    .any(|existing| existing.get("id").is_some_and(|v| scalar_text(v) == id_text))
            });
            if duplicate {
                return Err(AccessorError::Query(format!(
                    "duplicate key value violates unique constraint \"{table}_pkey\""
                )));
            }
            // Keep the sequence ahead of explicitly seeded ids.
            if let Some(explicit) = id.as_i64() {
                state.next_row_id = state.next_row_id.max(explicit);
            }
        } else if let Some(object) = row.as_object_mut() {
            state.next_row_id += 1;
            object.insert("id".to_string(), json!(state.next_row_id));
        }
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<u64, AccessorError> {
        let mut state = self.state_mut();
        let mut changed = 0;
        if let Some(rows) = state.tables.get_mut(table) {
            for row in rows.iter_mut() {
                if !row_matches(row, filters) {
                    continue;
                }
                if let (Some(target), Some(source)) = (row.as_object_mut(), patch.as_object()) {
                    for (key, value) in source {
                        target.insert(key.clone(), value.clone());
                    }
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, AccessorError> {
        let mut state = self.state_mut();
        let Some(rows) = state.tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !row_matches(row, filters));
        Ok((before - rows.len()) as u64)
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.state_mut()
            .objects
            .insert(format!("{bucket}/{path}"), (content_type.to_string(), bytes));
        Ok(())
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, StorageError> {
        let key = format!("{bucket}/{path}");
        if !self.state_mut().objects.contains_key(&key) {
            return Err(StorageError::Provider("Object not found".into()));
        }
        Ok(format!("memory://{key}?expires_in={expires_in_secs}"))
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn row_matches(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| {
        row.get(&filter.column)
            .filter(|value| !value.is_null())
            .is_some_and(|value| scalar_text(value) == filter.value)
    })
}
