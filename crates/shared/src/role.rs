use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};

/// Portal roles, stored lowercase in the `roles.nombre` column.
///
/// Parsing is tolerant: casing is ignored and the legacy plural `padres`
/// resolves to [`Role::Padre`]. Everything the portal writes uses the
/// canonical lowercase literal.
#[derive(
    EnumString,
    VariantArray,
    Display,
    AsRefStr,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Alumno,
    Docente,
    Admin,
    #[strum(to_string = "padre", serialize = "padres")]
    Padre,
}

impl Role {
    /// Capitalized form used in user-facing messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Alumno => "Alumno",
            Role::Docente => "Docente",
            Role::Admin => "Admin",
            Role::Padre => "Padre",
        }
    }

    /// Table holding the per-role record created at registration, if any.
    /// Admins and padres are account-only and have no such record.
    pub fn record_table(&self) -> Option<&'static str> {
        match self {
            Role::Alumno => Some("alumnos"),
            Role::Docente => Some("docentes"),
            Role::Admin | Role::Padre => None,
        }
    }

    /// `estado` the per-role record starts in.
    pub fn initial_record_state(&self) -> Option<&'static str> {
        match self {
            Role::Alumno => Some("activo"),
            Role::Docente => Some("pendiente"),
            Role::Admin | Role::Padre => None,
        }
    }
}

/// `docentes.estado` lifecycle. Only `aprobado` may enter the docente panel.
#[derive(
    EnumString,
    VariantArray,
    Display,
    AsRefStr,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum TeacherStatus {
    Pendiente,
    Aprobado,
    Rechazado,
}

/// How a completed registration left the account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationStatus {
    /// Usable right away (alumnos).
    Active,
    /// Waiting on an administrator (docentes).
    PendingApproval,
    /// Account-only roles with no record to gate on (admin, padre).
    Complete,
}
