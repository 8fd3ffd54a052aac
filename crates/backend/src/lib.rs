//! Client for the hosted backend the portal runs against
//!
//! The service exposes three surfaces: auth endpoints, a REST layer over the
//! relational tables, and object storage with signed download URLs. The
//! [`Backend`] trait abstracts all three so the flows and panels take any
//! implementation as a type parameter: [`HostedBackend`] speaks HTTP to a
//! real deployment, [`MemoryBackend`] runs in process for tests and demos.

mod hosted;
mod memory;
mod types;

pub use hosted::HostedBackend;
pub use memory::MemoryBackend;
pub use types::{AuthResponse, AuthUser, Filter, Session};

use async_trait::async_trait;
use aulanet_shared::{AccessorError, AuthError, StorageError};
use serde_json::Value;

#[async_trait]
pub trait Backend: Send + Sync {
    /// Password sign-in. An `Ok` response with no user payload means the
    /// account exists but is not usable yet (email pending confirmation).
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, AuthError>;

    /// Creates the auth account. When the deployment requires email
    /// confirmation the response carries a user but no session.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError>;

    /// Revokes the current session. Local state is cleared even when the
    /// remote call fails; calling with no session is a no-op.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The session held by this client, if any.
    async fn get_session(&self) -> Option<Session>;

    /// Reads rows from `table` matching every filter (equality only).
    /// `columns` is the projection list, `*` for all.
    async fn select(
        &self,
        table: &str,
        columns: &str,
        filters: &[Filter],
    ) -> Result<Vec<Value>, AccessorError>;

    /// Inserts one row and returns it as stored.
    async fn insert(&self, table: &str, row: Value) -> Result<Value, AccessorError>;

    /// Applies `patch` to every row matching the filters. Returns how many
    /// rows changed.
    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<u64, AccessorError>;

    /// Deletes every row matching the filters. Returns how many rows went.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, AccessorError>;

    /// Stores an object under `bucket/path`.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Mints a time-limited download URL for an existing object.
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, StorageError>;
}
