use super::{PageError, PanelIdentity, guard};
use crate::queries::{self, CertificateRow};
use aulanet_auth::{ProfileStore, UserProfile};
use aulanet_backend::{Backend, Filter};
use aulanet_shared::{Role, TeacherStatus};
use serde::Serialize;
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::Arc;
use strum::VariantArray;
use tracing::{info, warn};
use uuid::Uuid;

const RECENT_CERTIFICATES: usize = 5;

#[derive(Clone, Copy, Debug, Serialize)]
pub struct RoleCount {
    pub role: Role,
    pub count: usize,
}

/// Everything the admin landing page shows.
#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub profile: UserProfile,
    pub pending_teachers: Vec<UserProfile>,
    pub user_counts: Vec<RoleCount>,
    pub recent_certificates: Vec<CertificateRow>,
}

pub struct AdminPanel<B> {
    backend: Arc<B>,
    profiles: ProfileStore<B>,
}

impl<B: Backend> AdminPanel<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            profiles: ProfileStore::new(backend.clone()),
            backend,
        }
    }

    pub async fn dashboard(&self) -> Result<AdminDashboard, PageError> {
        let PanelIdentity { profile, .. } =
            guard(self.backend.as_ref(), &self.profiles, Role::Admin).await?;

        let pending_teachers = self.pending_teachers().await?;
        let mut user_counts = Vec::with_capacity(Role::VARIANTS.len());
        for role in Role::VARIANTS {
            let count = self.profiles.list_by_role(*role).await?.len();
            user_counts.push(RoleCount { role: *role, count });
        }
        let recent_certificates =
            queries::certificates::recent(self.backend.as_ref(), RECENT_CERTIFICATES).await?;

        Ok(AdminDashboard {
            profile,
            pending_teachers,
            user_counts,
            recent_certificates,
        })
    }

    /// Docente applications still waiting for a decision. A `docentes` row
    /// that no longer points at a profile is logged and skipped rather than
    /// taking the whole dashboard down.
    async fn pending_teachers(&self) -> Result<Vec<UserProfile>, PageError> {
        let rows = self
            .backend
            .select(
                "docentes",
                "usuario_id",
                &[Filter::eq("estado", TeacherStatus::Pendiente)],
            )
            .await?;
        let mut pending = Vec::new();
        for row in rows {
            let Some(usuario_id) = row
                .get("usuario_id")
                .and_then(Value::as_str)
                .and_then(|raw| Uuid::from_str(raw).ok())
            else {
                warn!("docentes row without a readable usuario_id");
                continue;
            };
            match self.profiles.get_profile(usuario_id).await? {
                Some(profile) => pending.push(profile),
                None => warn!(usuario_id = %usuario_id, "pending docente has no profile row"),
            }
        }
        Ok(pending)
    }

    pub async fn approve_teacher(&self, usuario_id: Uuid) -> Result<bool, PageError> {
        self.set_teacher_status(usuario_id, TeacherStatus::Aprobado)
            .await
    }

    pub async fn reject_teacher(&self, usuario_id: Uuid) -> Result<bool, PageError> {
        self.set_teacher_status(usuario_id, TeacherStatus::Rechazado)
            .await
    }

    /// Returns false when no docente record matched.
    async fn set_teacher_status(
        &self,
        usuario_id: Uuid,
        status: TeacherStatus,
    ) -> Result<bool, PageError> {
        guard(self.backend.as_ref(), &self.profiles, Role::Admin).await?;
        let changed = self
            .backend
            .update(
                "docentes",
                &[Filter::eq("usuario_id", usuario_id)],
                json!({ "estado": status }),
            )
            .await?;
        if changed > 0 {
            info!(usuario_id = %usuario_id, estado = %status, "docente status updated");
        }
        Ok(changed > 0)
    }

    /// Lookup by email, kept for the admin search box. Flows resolve people
    /// by session id, never by email.
    pub async fn find_user(&self, email: &str) -> Result<Option<UserProfile>, PageError> {
        guard(self.backend.as_ref(), &self.profiles, Role::Admin).await?;
        Ok(self.profiles.find_by_email(email).await?)
    }

    pub async fn list_users(&self, role: Role) -> Result<Vec<UserProfile>, PageError> {
        guard(self.backend.as_ref(), &self.profiles, Role::Admin).await?;
        Ok(self.profiles.list_by_role(role).await?)
    }
}
