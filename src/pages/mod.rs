//! Panel controllers
//!
//! One controller per panel, all behind the same [`guard`]: the backend
//! must hold a session and the session's profile must carry the panel's
//! role. Controllers return typed errors to the caller; turning them into
//! user-facing text is the caller's job.

pub mod admin;
pub mod parent;
pub mod student;
pub mod teacher;

pub use admin::{AdminDashboard, AdminPanel, RoleCount};
pub use parent::{ParentDashboard, ParentPanel};
pub use student::{StudentDashboard, StudentPanel};
pub use teacher::{TeacherDashboard, TeacherPanel};

use aulanet_auth::{ProfileStore, UserProfile};
use aulanet_backend::Backend;
use aulanet_shared::{AccessorError, Role, StorageError};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("no session; sign in first")]
    NotSignedIn,

    #[error("this panel is for {} accounts", expected.display_name())]
    Forbidden { expected: Role },

    #[error(transparent)]
    Accessor(#[from] AccessorError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Who is using the panel, resolved once per operation.
#[derive(Clone, Debug)]
pub struct PanelIdentity {
    pub user_id: Uuid,
    pub profile: UserProfile,
}

/// Shared per-operation check. A session with no profile row, or with a
/// role other than the panel's, cannot establish the right to be here and
/// is refused as [`PageError::Forbidden`].
pub(crate) async fn guard<B: Backend>(
    backend: &B,
    profiles: &ProfileStore<B>,
    expected: Role,
) -> Result<PanelIdentity, PageError> {
    let Some(session) = backend.get_session().await else {
        return Err(PageError::NotSignedIn);
    };
    let Some(profile) = profiles.get_profile(session.user_id).await? else {
        return Err(PageError::Forbidden { expected });
    };
    let role = profiles
        .role_name(profile.rol_id)
        .await?
        .and_then(|name| Role::from_str(&name).ok());
    if role != Some(expected) {
        return Err(PageError::Forbidden { expected });
    }
    Ok(PanelIdentity {
        user_id: session.user_id,
        profile,
    })
}

/// Keeps user-supplied names safe to embed in a storage path. Everything
/// outside a conservative set becomes `_`, so separators never survive.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "archivo".to_string()
    } else {
        trimmed.to_string()
    }
}

pub(crate) fn content_type_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
