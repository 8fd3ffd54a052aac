use super::{AuthFlow, MSG_BUSY, MSG_TIMEOUT, RejectReason, SignInOutcome};
use crate::profile::RedirectionProfile;
use aulanet_backend::Backend;
use aulanet_notify::{Notice, Notifier};
use aulanet_shared::{AuthError, Role, TeacherStatus};
use tracing::{info, warn};
use validator::Validate;

#[derive(Validate)]
pub struct SignInInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    /// Panel the person is trying to enter. Always explicit.
    pub intended_role: Role,
}

const MSG_BAD_CREDENTIALS: &str = "Incorrect email or password.";
const MSG_CONFIRM_EMAIL: &str =
    "Login incomplete: please confirm your email address and try again.";
const MSG_PROFILE_MISSING: &str =
    "Your profile could not be loaded. Please contact the administrator.";
const MSG_ROLE_UNDETERMINED: &str =
    "Your role could not be determined. Please contact the administrator.";
const MSG_TEACHER_PENDING: &str = "Your account is pending administrator approval.";
const MSG_TEACHER_REJECTED: &str =
    "Your application was rejected. Please contact the administration.";

impl<B: Backend, N: Notifier> AuthFlow<B, N> {
    /// Sign-in for any panel.
    ///
    /// Authenticates, loads the profile, checks the actual role against
    /// `intended_role`, gates docentes on their approval state, and routes.
    /// Every refusal past authentication signs the half-open session back
    /// out before notifying.
    #[tracing::instrument(
        skip(self, input),
        fields(email = %input.email, panel = %input.intended_role)
    )]
    pub async fn sign_in(&self, input: SignInInput) -> SignInOutcome {
        let Some(_guard) = self.try_begin() else {
            self.notify(Notice::info(MSG_BUSY));
            return SignInOutcome::Busy;
        };

        if input.validate().is_err() {
            // Same answer as a wrong password; the form reveals nothing.
            self.notify(Notice::error(MSG_BAD_CREDENTIALS));
            return SignInOutcome::Rejected(RejectReason::InvalidInput);
        }

        let response = match self.gateway.sign_in(&input.email, &input.password).await {
            Ok(response) => response,
            Err(AuthError::Timeout) => {
                warn!("sign-in timed out");
                self.notify(Notice::error(MSG_TIMEOUT));
                return SignInOutcome::Rejected(RejectReason::Backend);
            }
            Err(err) => {
                info!(error = %err, "sign-in refused");
                self.notify(Notice::error(MSG_BAD_CREDENTIALS));
                return SignInOutcome::Rejected(RejectReason::BadCredentials);
            }
        };

        let Some(user) = response.user else {
            self.notify(Notice::info(MSG_CONFIRM_EMAIL));
            return SignInOutcome::EmailUnconfirmed;
        };

        let profile = match self.profiles.find_for_redirection(user.id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                warn!(user_id = %user.id, "authenticated account has no profile row");
                self.gateway.sign_out().await;
                self.notify(Notice::error(MSG_PROFILE_MISSING));
                return SignInOutcome::Rejected(RejectReason::ProfileMissing);
            }
            Err(err) => {
                warn!(user_id = %user.id, error = %err, "redirection lookup failed");
                self.gateway.sign_out().await;
                self.notify(Notice::error(MSG_PROFILE_MISSING));
                return SignInOutcome::Rejected(RejectReason::ProfileMissing);
            }
        };

        let RedirectionProfile {
            role_name,
            role,
            teacher_status,
        } = profile;

        let Some(role_name) = role_name else {
            warn!(user_id = %user.id, "profile points at a role row that does not exist");
            self.gateway.sign_out().await;
            self.notify(Notice::error(MSG_ROLE_UNDETERMINED));
            return SignInOutcome::Rejected(RejectReason::RoleUndetermined);
        };

        let Some(actual) = role else {
            warn!(user_id = %user.id, role = %role_name, "unrecognized role name");
            self.gateway.sign_out().await;
            self.notify(Notice::error(format!(
                "Unrecognized role \"{role_name}\". Please contact the administrator."
            )));
            return SignInOutcome::Rejected(RejectReason::UnknownRole(role_name));
        };

        if actual != input.intended_role {
            info!(
                user_id = %user.id,
                intended = %input.intended_role,
                actual = %actual,
                "panel mismatch"
            );
            self.gateway.sign_out().await;
            self.notify(Notice::error(format!(
                "You are a {}. You cannot enter this panel.",
                actual.display_name()
            )));
            return SignInOutcome::Rejected(RejectReason::WrongPanel { actual });
        }

        if actual == Role::Docente {
            match teacher_status {
                Some(TeacherStatus::Aprobado) => {}
                Some(TeacherStatus::Pendiente) => {
                    self.gateway.sign_out().await;
                    self.notify(Notice::error(MSG_TEACHER_PENDING));
                    return SignInOutcome::Rejected(RejectReason::TeacherPending);
                }
                Some(TeacherStatus::Rechazado) => {
                    self.gateway.sign_out().await;
                    self.notify(Notice::error(MSG_TEACHER_REJECTED));
                    return SignInOutcome::Rejected(RejectReason::TeacherRejected);
                }
                None => {
                    warn!(user_id = %user.id, "docente profile came back without a status");
                    self.gateway.sign_out().await;
                    self.notify(Notice::error(MSG_PROFILE_MISSING));
                    return SignInOutcome::Rejected(RejectReason::ProfileMissing);
                }
            }
        }

        let Some(target) = self.redirects.target(actual) else {
            warn!(role = %actual, "no redirect target configured");
            self.gateway.sign_out().await;
            self.notify(Notice::error(format!(
                "No panel is configured for role \"{actual}\". Please contact the administrator."
            )));
            return SignInOutcome::Rejected(RejectReason::UnknownRole(actual.to_string()));
        };

        info!(user_id = %user.id, role = %actual, target, "sign-in routed");
        SignInOutcome::Redirect {
            role: actual,
            target: target.to_string(),
        }
    }
}
