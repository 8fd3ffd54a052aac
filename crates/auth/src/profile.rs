use aulanet_backend::{Backend, Filter};
use aulanet_shared::{AccessorError, RegistrationStatus, Role, TeacherStatus, normalize_dni};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

/// A `usuarios` row. The auth account and this profile are separate records
/// keyed by the same id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub nombre: String,
    pub apellido: String,
    pub dni: String,
    pub email: String,
    #[serde(default)]
    pub telefono: Option<String>,
    pub rol_id: i64,
}

/// What sign-in needs to route a session: the role name as stored, its
/// parsed form when the portal recognizes it, and the docente state when the
/// role calls for one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectionProfile {
    pub role_name: Option<String>,
    pub role: Option<Role>,
    pub teacher_status: Option<TeacherStatus>,
}

/// Registration payload. The DNI may arrive with separators; it is
/// normalized on the way into storage.
#[derive(Clone, Debug)]
pub struct NewProfile {
    pub user_id: Uuid,
    pub nombre: String,
    pub apellido: String,
    pub dni: String,
    pub email: String,
    pub telefono: Option<String>,
    pub role: Role,
}

/// Accessors over `usuarios`, `roles` and the per-role record tables.
/// Absent rows are `Ok(None)`; only transport and data-shape problems are
/// errors.
pub struct ProfileStore<B> {
    backend: Arc<B>,
}

impl<B: Backend> ProfileStore<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    async fn role_id(&self, role: Role) -> Result<i64, AccessorError> {
        let rows = self
            .backend
            .select("roles", "id", &[Filter::eq("nombre", role)])
            .await?;
        let Some(row) = rows.first() else {
            return Err(AccessorError::RoleNotFound(role.to_string()));
        };
        row.get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| AccessorError::Malformed {
                table: "roles",
                reason: "id is not an integer".into(),
            })
    }

    pub async fn role_name(&self, rol_id: i64) -> Result<Option<String>, AccessorError> {
        let rows = self
            .backend
            .select("roles", "nombre", &[Filter::eq("id", rol_id)])
            .await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("nombre"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AccessorError> {
        let rows = self
            .backend
            .select("usuarios", "*", &[Filter::eq("id", user_id)])
            .await?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let profile = serde_json::from_value(row).map_err(|err| AccessorError::Malformed {
            table: "usuarios",
            reason: err.to_string(),
        })?;
        Ok(Some(profile))
    }

    /// Legacy lookup kept for the admin user search. Flows key on the
    /// session user id, never on email.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, AccessorError> {
        let rows = self
            .backend
            .select("usuarios", "*", &[Filter::eq("email", email)])
            .await?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let profile = serde_json::from_value(row).map_err(|err| AccessorError::Malformed {
            table: "usuarios",
            reason: err.to_string(),
        })?;
        Ok(Some(profile))
    }

    /// Loads the routing picture for a signed-in account. Gaps are reported
    /// as `None` fields; the flow decides what each one means.
    pub async fn find_for_redirection(
        &self,
        user_id: Uuid,
    ) -> Result<Option<RedirectionProfile>, AccessorError> {
        let Some(profile) = self.get_profile(user_id).await? else {
            return Ok(None);
        };
        let role_name = self.role_name(profile.rol_id).await?;
        let role = role_name
            .as_deref()
            .and_then(|name| Role::from_str(name).ok());
        let teacher_status = match role {
            Some(Role::Docente) => Some(self.teacher_status(user_id).await?),
            _ => None,
        };
        Ok(Some(RedirectionProfile {
            role_name,
            role,
            teacher_status,
        }))
    }

    /// Registration guarantees every docente a `docentes` row, so a missing
    /// one is an error here, not a `None`.
    pub async fn teacher_status(&self, user_id: Uuid) -> Result<TeacherStatus, AccessorError> {
        let rows = self
            .backend
            .select("docentes", "estado", &[Filter::eq("usuario_id", user_id)])
            .await?;
        let Some(estado) = rows
            .first()
            .and_then(|row| row.get("estado"))
            .and_then(Value::as_str)
        else {
            return Err(AccessorError::MissingRecord { table: "docentes" });
        };
        TeacherStatus::from_str(estado).map_err(|_| AccessorError::Malformed {
            table: "docentes",
            reason: format!("unknown estado {estado:?}"),
        })
    }

    /// Two writes with no transaction across them: the profile row, then the
    /// per-role record. When the second write fails the first is removed by
    /// hand so no half-registered profile is left behind.
    pub async fn create_full_profile(
        &self,
        profile: NewProfile,
    ) -> Result<RegistrationStatus, AccessorError> {
        let rol_id = self.role_id(profile.role).await?;
        let row = json!({
            "id": profile.user_id,
            "nombre": profile.nombre,
            "apellido": profile.apellido,
            "dni": normalize_dni(&profile.dni),
            "email": profile.email,
            "telefono": profile.telefono,
            "rol_id": rol_id,
        });
        self.backend.insert("usuarios", row).await?;

        let (Some(table), Some(estado)) = (
            profile.role.record_table(),
            profile.role.initial_record_state(),
        ) else {
            return Ok(RegistrationStatus::Complete);
        };

        let record = json!({ "usuario_id": profile.user_id, "estado": estado });
        if let Err(err) = self.backend.insert(table, record).await {
            error!(
                user_id = %profile.user_id,
                table,
                error = %err,
                "role record insert failed; removing profile row"
            );
            if let Err(cleanup) = self
                .backend
                .delete("usuarios", &[Filter::eq("id", profile.user_id)])
                .await
            {
                warn!(
                    user_id = %profile.user_id,
                    error = %cleanup,
                    "compensating delete failed; profile row may remain"
                );
            }
            return Err(err);
        }

        Ok(match profile.role {
            Role::Alumno => RegistrationStatus::Active,
            Role::Docente => RegistrationStatus::PendingApproval,
            Role::Admin | Role::Padre => RegistrationStatus::Complete,
        })
    }

    pub async fn list_by_role(&self, role: Role) -> Result<Vec<UserProfile>, AccessorError> {
        let rol_id = self.role_id(role).await?;
        let rows = self
            .backend
            .select("usuarios", "*", &[Filter::eq("rol_id", rol_id)])
            .await?;
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|err| AccessorError::Malformed {
                    table: "usuarios",
                    reason: err.to_string(),
                })
            })
            .collect()
    }
}
