use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Auth account as the provider reports it. Distinct from the `usuarios`
/// profile row, which the accessors load separately.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub email_confirmed: bool,
}

/// An authenticated session held by the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub access_token: String,
}

/// What the auth endpoints answer. Either side can be absent: sign-up under
/// mandatory email confirmation has a user but no session, and a sign-in
/// against an unconfirmed account has neither.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: Option<AuthUser>,
    pub session: Option<Session>,
}

/// Equality filter on one column, the only predicate the portal needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl ToString) -> Self {
        Self {
            column: column.into(),
            value: value.to_string(),
        }
    }
}
