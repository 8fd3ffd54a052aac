use crate::{AuthResponse, AuthUser, Backend, Filter, Session};
use anyhow::Context;
use async_trait::async_trait;
use aulanet_shared::{AccessorError, AuthError, StorageError};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

/// HTTP client for a hosted deployment.
///
/// Auth lives under `auth/v1`, tables under `rest/v1` with PostgREST-style
/// `column=eq.value` filters, objects under `storage/v1/object`. Every
/// request carries the project API key; data requests additionally bear the
/// session token once someone signed in.
pub struct HostedBackend {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
    session: Mutex<Option<Session>>,
}

impl HostedBackend {
    /// `timeout` bounds every request this client makes. Slow networks get
    /// an error instead of a spinner that never resolves.
    pub fn new(
        base_url: &str,
        anon_key: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let mut base = Url::parse(base_url).context("invalid backend URL")?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            base,
            anon_key: anon_key.into(),
            session: Mutex::new(None),
        })
    }

    fn session_slot(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Session token when signed in, the project key otherwise.
    fn bearer_token(&self) -> String {
        self.session_slot()
            .as_ref()
            .map(|session| session.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer_token())
    }

    fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base.join(path)
    }

    fn rest_url(
        &self,
        table: &str,
        columns: Option<&str>,
        filters: &[Filter],
    ) -> Result<Url, AccessorError> {
        let mut url = self
            .endpoint(&format!("rest/v1/{table}"))
            .map_err(|err| AccessorError::Transport(err.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(columns) = columns {
                pairs.append_pair("select", columns);
            }
            for filter in filters {
                pairs.append_pair(&filter.column, &format!("eq.{}", filter.value));
            }
        }
        Ok(url)
    }

    fn object_url(&self, prefix: &str, bucket: &str, path: &str) -> Result<Url, StorageError> {
        let mut url = self
            .endpoint(&format!("storage/v1/object{prefix}"))
            .map_err(|err| StorageError::Transport(err.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StorageError::Transport("backend URL cannot be a base".into()))?;
            segments.pop_if_empty();
            segments.push(bucket);
            segments.extend(path.split('/'));
        }
        Ok(url)
    }

    async fn rest_rows(&self, response: reqwest::Response) -> Result<Vec<Value>, AccessorError> {
        let status = response.status();
        let body = response.text().await.map_err(query_transport)?;
        if !status.is_success() {
            return Err(AccessorError::Query(rest_failure(status, &body)));
        }
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&body)
            .map_err(|err| AccessorError::Transport(format!("malformed rows: {err}")))
    }
}

#[async_trait]
impl Backend for HostedBackend {
    #[tracing::instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthError> {
        let url = self
            .endpoint("auth/v1/token?grant_type=password")
            .map_err(|err| AuthError::Transport(err.to_string()))?;
        let response = self
            .authed(self.http.post(url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(auth_transport)?;
        let status = response.status();
        let body = response.text().await.map_err(auth_transport)?;

        if !status.is_success() {
            let failure = parse_auth_failure(status, &body);
            // The provider reports unconfirmed accounts as an error; to
            // callers that is the partial-login shape: account exists, not
            // usable yet.
            if let AuthError::Provider(message) = &failure
                && message.to_ascii_lowercase().contains("email not confirmed")
            {
                return Ok(AuthResponse::default());
            }
            return Err(failure);
        }

        let token: WireToken = serde_json::from_str(&body)
            .map_err(|err| AuthError::Transport(format!("malformed token response: {err}")))?;
        let user = token.user.into_auth_user();
        let session = Session {
            user_id: user.id,
            email: user.email.clone(),
            access_token: token.access_token,
        };
        *self.session_slot() = Some(session.clone());
        info!(user_id = %user.id, "signed in");
        Ok(AuthResponse {
            user: Some(user),
            session: Some(session),
        })
    }

    #[tracing::instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let url = self
            .endpoint("auth/v1/signup")
            .map_err(|err| AuthError::Transport(err.to_string()))?;
        let response = self
            .authed(self.http.post(url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(auth_transport)?;
        let status = response.status();
        let body = response.text().await.map_err(auth_transport)?;

        if !status.is_success() {
            return Err(parse_auth_failure(status, &body));
        }

        // Confirmation disabled: the provider hands the session straight back.
        if let Ok(token) = serde_json::from_str::<WireToken>(&body) {
            let user = token.user.into_auth_user();
            let session = Session {
                user_id: user.id,
                email: user.email.clone(),
                access_token: token.access_token,
            };
            *self.session_slot() = Some(session.clone());
            info!(user_id = %user.id, "account created and signed in");
            return Ok(AuthResponse {
                user: Some(user),
                session: Some(session),
            });
        }

        // Confirmation required: a bare user object, no session yet.
        let user: WireUser = serde_json::from_str(&body)
            .map_err(|_| AuthError::Provider("sign-up returned no user".into()))?;
        let user = user.into_auth_user();
        info!(user_id = %user.id, "account created, confirmation pending");
        Ok(AuthResponse {
            user: Some(user),
            session: None,
        })
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        // Local state goes first so a dead network cannot leave the client
        // half signed in.
        let Some(session) = self.session_slot().take() else {
            return Ok(());
        };
        let url = self
            .endpoint("auth/v1/logout")
            .map_err(|err| AuthError::Transport(err.to_string()))?;
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(session.access_token)
            .send()
            .await
            .map_err(auth_transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_auth_failure(status, &body));
        }
        debug!(user_id = %session.user_id, "signed out");
        Ok(())
    }

    async fn get_session(&self) -> Option<Session> {
        self.session_slot().clone()
    }

    async fn select(
        &self,
        table: &str,
        columns: &str,
        filters: &[Filter],
    ) -> Result<Vec<Value>, AccessorError> {
        let url = self.rest_url(table, Some(columns), filters)?;
        let response = self
            .authed(self.http.get(url))
            .send()
            .await
            .map_err(query_transport)?;
        let rows = self.rest_rows(response).await?;
        debug!(table, rows = rows.len(), "select");
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, AccessorError> {
        let url = self.rest_url(table, None, &[])?;
        let response = self
            .authed(self.http.post(url))
            .header("Prefer", "return=representation")
            .json(&json!([row]))
            .send()
            .await
            .map_err(query_transport)?;
        let rows = self.rest_rows(response).await?;
        debug!(table, "insert");
        rows.into_iter()
            .next()
            .ok_or_else(|| AccessorError::Query("insert returned no representation".into()))
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<u64, AccessorError> {
        let url = self.rest_url(table, None, filters)?;
        let response = self
            .authed(self.http.patch(url))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await
            .map_err(query_transport)?;
        let rows = self.rest_rows(response).await?;
        debug!(table, rows = rows.len(), "update");
        Ok(rows.len() as u64)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, AccessorError> {
        let url = self.rest_url(table, None, filters)?;
        let response = self
            .authed(self.http.delete(url))
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(query_transport)?;
        let rows = self.rest_rows(response).await?;
        debug!(table, rows = rows.len(), "delete");
        Ok(rows.len() as u64)
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let url = self.object_url("", bucket, path)?;
        let response = self
            .authed(self.http.post(url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(storage_transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Provider(rest_failure(status, &body)));
        }
        debug!(bucket, path, "object stored");
        Ok(())
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, StorageError> {
        let url = self.object_url("/sign", bucket, path)?;
        let response = self
            .authed(self.http.post(url))
            .json(&json!({ "expiresIn": expires_in_secs }))
            .send()
            .await
            .map_err(storage_transport)?;
        let status = response.status();
        let body = response.text().await.map_err(storage_transport)?;
        if !status.is_success() {
            return Err(StorageError::Provider(rest_failure(status, &body)));
        }
        let payload: WireSignedUrl = serde_json::from_str(&body)
            .map_err(|err| StorageError::Transport(format!("malformed signed URL: {err}")))?;
        // The provider answers with a path relative to the storage root.
        if payload.signed_url.starts_with("http") {
            return Ok(payload.signed_url);
        }
        let absolute = self
            .endpoint(&format!("storage/v1{}", payload.signed_url))
            .map_err(|err| StorageError::Transport(err.to_string()))?;
        Ok(absolute.to_string())
    }
}

#[derive(Deserialize)]
struct WireUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_confirmed_at: Option<String>,
    #[serde(default)]
    confirmed_at: Option<String>,
}

impl WireUser {
    fn into_auth_user(self) -> AuthUser {
        AuthUser {
            id: self.id,
            email: self.email.unwrap_or_default(),
            email_confirmed: self.email_confirmed_at.is_some() || self.confirmed_at.is_some(),
        }
    }
}

#[derive(Deserialize)]
struct WireToken {
    access_token: String,
    user: WireUser,
}

#[derive(Deserialize)]
struct WireSignedUrl {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

#[derive(Default, Deserialize)]
struct WireAuthError {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn parse_auth_failure(status: StatusCode, body: &str) -> AuthError {
    let parsed: WireAuthError = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error_description
        .or(parsed.msg)
        .or(parsed.message)
        .or(parsed.error)
        .unwrap_or_else(|| format!("auth request failed with status {status}"));
    if message.to_ascii_lowercase().contains("invalid login credentials") {
        AuthError::InvalidCredentials
    } else {
        AuthError::Provider(message)
    }
}

fn rest_failure(status: StatusCode, body: &str) -> String {
    #[derive(Default, Deserialize)]
    struct RestError {
        #[serde(default)]
        message: Option<String>,
    }
    let parsed: RestError = serde_json::from_str(body).unwrap_or_default();
    parsed
        .message
        .unwrap_or_else(|| format!("request failed with status {status}"))
}

fn auth_transport(err: reqwest::Error) -> AuthError {
    if err.is_timeout() {
        AuthError::Timeout
    } else {
        AuthError::Transport(err.to_string())
    }
}

fn query_transport(err: reqwest::Error) -> AccessorError {
    if err.is_timeout() {
        AccessorError::Timeout
    } else {
        AccessorError::Transport(err.to_string())
    }
}

fn storage_transport(err: reqwest::Error) -> StorageError {
    if err.is_timeout() {
        StorageError::Timeout
    } else {
        StorageError::Transport(err.to_string())
    }
}
