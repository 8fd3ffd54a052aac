use aulanet_backend::{AuthResponse, Backend, Session};
use aulanet_shared::AuthError;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// What account creation left behind at the provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignUpAck {
    pub user_id: Uuid,
    /// No session was issued; the person must confirm their email first.
    pub requires_confirmation: bool,
}

/// Thin wrapper over the backend's auth surface. The one policy it owns is
/// sign-out: revocation failures are logged and swallowed, because the local
/// session is already gone and the user is leaving either way.
pub struct SessionGateway<B> {
    backend: Arc<B>,
}

impl<B: Backend> SessionGateway<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        self.backend.sign_in_with_password(email, password).await
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpAck, AuthError> {
        let response = self.backend.sign_up(email, password).await?;
        let Some(user) = response.user else {
            return Err(AuthError::Provider("sign-up returned no user".into()));
        };
        Ok(SignUpAck {
            user_id: user.id,
            requires_confirmation: response.session.is_none(),
        })
    }

    pub async fn sign_out(&self) {
        if let Err(err) = self.backend.sign_out().await {
            warn!(error = %err, "remote sign-out failed; local session already cleared");
        }
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.backend.get_session().await
    }
}
