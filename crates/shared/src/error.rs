/// Failures from the hosted auth endpoints.
///
/// `InvalidCredentials` is the only variant surfaced verbatim to users; the
/// sign-in flow collapses everything else into a generic message so the
/// portal never reveals whether an email exists.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("request timed out")]
    Timeout,

    /// The provider answered with an error payload.
    #[error("{0}")]
    Provider(String),

    /// The request never produced a usable answer (network, serialization).
    #[error("{0}")]
    Transport(String),
}

/// Failures from the relational accessors.
#[derive(Debug, thiserror::Error)]
pub enum AccessorError {
    /// The `roles` table has no row for this name. Registration cannot
    /// proceed without it.
    #[error("role {0:?} is not provisioned")]
    RoleNotFound(String),

    /// A record registration guarantees is absent, e.g. a docente without
    /// a `docentes` row.
    #[error("no {table} record for user")]
    MissingRecord { table: &'static str },

    /// A row came back but did not decode into the expected shape.
    #[error("malformed row in {table}: {reason}")]
    Malformed { table: &'static str, reason: String },

    #[error("request timed out")]
    Timeout,

    /// The provider answered with an error payload.
    #[error("{0}")]
    Query(String),

    #[error("{0}")]
    Transport(String),
}

/// Failures from the object storage endpoints.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Provider(String),

    #[error("{0}")]
    Transport(String),
}
