mod sign_in;
mod sign_up;

pub use sign_in::SignInInput;
pub use sign_up::SignUpInput;

use crate::{ProfileStore, RedirectMap, SessionGateway};
use aulanet_backend::Backend;
use aulanet_notify::{Notice, Notifier};
use aulanet_shared::{RegistrationStatus, Role};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Why sign-in refused to route a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// The form did not pass validation. Reported exactly like bad
    /// credentials.
    InvalidInput,
    BadCredentials,
    ProfileMissing,
    RoleUndetermined,
    WrongPanel { actual: Role },
    TeacherPending,
    TeacherRejected,
    UnknownRole(String),
    /// Timeout or transport failure before a decision could be made.
    Backend,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignInOutcome {
    /// Authenticated, role checks passed, go to the panel.
    Redirect { role: Role, target: String },
    /// Account exists but the email is not confirmed yet.
    EmailUnconfirmed,
    Rejected(RejectReason),
    /// Another submission is still running; nothing was attempted.
    Busy,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignUpOutcome {
    Completed { status: RegistrationStatus },
    /// Account and profile created; a confirmation email gates the first
    /// sign-in.
    ConfirmationRequired,
    Rejected,
    Busy,
}

/// One state machine for every panel's login and every role's registration.
/// Role differences are data (redirect target, per-role record), not
/// separate flows.
///
/// The flow never returns an error: every path ends in an outcome and
/// exactly one notice to the user.
pub struct AuthFlow<B, N> {
    pub(crate) gateway: SessionGateway<B>,
    pub(crate) profiles: ProfileStore<B>,
    notifier: N,
    pub(crate) redirects: RedirectMap,
    in_flight: AtomicBool,
}

impl<B: Backend, N: Notifier> AuthFlow<B, N> {
    pub fn new(backend: Arc<B>, notifier: N, redirects: RedirectMap) -> Self {
        Self {
            gateway: SessionGateway::new(backend.clone()),
            profiles: ProfileStore::new(backend),
            notifier,
            redirects,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Claims the submission slot, or `None` while another attempt runs.
    pub(crate) fn try_begin(&self) -> Option<FlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(FlightGuard(&self.in_flight))
    }

    pub(crate) fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }
}

/// Releases the submission slot when an attempt ends, on every path.
pub(crate) struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub(crate) const MSG_BUSY: &str = "Another request is already in progress. Please wait.";
pub(crate) const MSG_TIMEOUT: &str = "The request timed out. Please try again.";
