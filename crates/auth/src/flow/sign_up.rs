use super::{AuthFlow, MSG_BUSY, MSG_TIMEOUT, SignUpOutcome};
use crate::NewProfile;
use aulanet_backend::Backend;
use aulanet_notify::{Notice, Notifier};
use aulanet_shared::{AccessorError, AuthError, RegistrationStatus, Role, validate_dni};
use tracing::{info, warn};
use validator::Validate;

#[derive(Validate)]
pub struct SignUpInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub nombre: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub apellido: String,
    #[validate(custom(function = validate_dni))]
    pub dni: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub telefono: Option<String>,
    pub role: Role,
}

const MSG_REGISTRATION_FAILED: &str =
    "We could not complete your registration. Please try again later.";
const MSG_CHECK_EMAIL: &str = "Registration started: check your email to confirm your account.";
const MSG_COMPLETE: &str = "Registration complete. You may now sign in.";
const MSG_AWAITING_APPROVAL: &str =
    "Registration received. A docente account awaits administrator approval.";

impl<B: Backend, N: Notifier> AuthFlow<B, N> {
    /// Registration for any role.
    ///
    /// Validates the form, creates the auth account, then writes the profile
    /// and the per-role record. Docentes come out `pendiente`, alumnos
    /// `activo`. A profile failure after the account exists signs the fresh
    /// session back out and reports the problem.
    #[tracing::instrument(skip(self, input), fields(email = %input.email, role = %input.role))]
    pub async fn sign_up(&self, input: SignUpInput) -> SignUpOutcome {
        let Some(_guard) = self.try_begin() else {
            self.notify(Notice::info(MSG_BUSY));
            return SignUpOutcome::Busy;
        };

        if let Err(errors) = input.validate() {
            self.notify(Notice::error(validation_message(&errors)));
            return SignUpOutcome::Rejected;
        }

        let ack = match self.gateway.sign_up(&input.email, &input.password).await {
            Ok(ack) => ack,
            Err(AuthError::Timeout) => {
                warn!("sign-up timed out");
                self.notify(Notice::error(MSG_TIMEOUT));
                return SignUpOutcome::Rejected;
            }
            Err(err) => {
                info!(error = %err, "account creation refused");
                self.notify(Notice::error(format!("Registration failed: {err}")));
                return SignUpOutcome::Rejected;
            }
        };

        let profile = NewProfile {
            user_id: ack.user_id,
            nombre: input.nombre,
            apellido: input.apellido,
            dni: input.dni,
            email: input.email,
            telefono: input.telefono,
            role: input.role,
        };

        let status = match self.profiles.create_full_profile(profile).await {
            Ok(status) => status,
            Err(AccessorError::RoleNotFound(role)) => {
                warn!(role = %role, "registration against an unprovisioned role");
                self.gateway.sign_out().await;
                self.notify(Notice::error(format!(
                    "Role \"{role}\" is not provisioned. Please contact the administrator."
                )));
                return SignUpOutcome::Rejected;
            }
            Err(err) => {
                warn!(user_id = %ack.user_id, error = %err, "registration writes failed");
                self.gateway.sign_out().await;
                self.notify(Notice::error(MSG_REGISTRATION_FAILED));
                return SignUpOutcome::Rejected;
            }
        };

        info!(user_id = %ack.user_id, role = %input.role, "registration stored");

        if ack.requires_confirmation {
            self.notify(Notice::info(MSG_CHECK_EMAIL));
            return SignUpOutcome::ConfirmationRequired;
        }

        let message = match status {
            RegistrationStatus::PendingApproval => MSG_AWAITING_APPROVAL,
            RegistrationStatus::Active | RegistrationStatus::Complete => MSG_COMPLETE,
        };
        self.notify(Notice::success(message));
        SignUpOutcome::Completed { status }
    }
}

fn validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|list| list.iter())
        .filter_map(|error| error.message.as_ref())
        .map(|message| message.to_string())
        .next()
        .unwrap_or_else(|| "Some fields are invalid. Please review the form.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> SignUpInput {
        SignUpInput {
            nombre: "Ana".into(),
            apellido: "Pérez".into(),
            dni: "30.123.456".into(),
            email: "ana@example.com".into(),
            password: "secreta".into(),
            telefono: None,
            role: Role::Alumno,
        }
    }

    #[test]
    fn accepts_a_complete_form() {
        assert!(valid_input().validate().is_ok());
    }

    #[test]
    fn rejects_short_passwords_with_their_message() {
        let mut input = valid_input();
        input.password = "abc".into();
        let errors = input.validate().unwrap_err();
        assert_eq!(
            validation_message(&errors),
            "Password must be at least 6 characters"
        );
    }

    #[test]
    fn rejects_malformed_dni() {
        let mut input = valid_input();
        input.dni = "30-123".into();
        assert!(input.validate().is_err());
    }

    #[test]
    fn rejects_bad_emails() {
        let mut input = valid_input();
        input.email = "not-an-email".into();
        assert!(input.validate().is_err());
    }
}
