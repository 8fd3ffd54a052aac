//! Role-aware sign-in and registration for the portal
//!
//! One [`AuthFlow`] serves every panel and every role. The panel being
//! entered travels as an explicit parameter, the backend arrives as a type
//! parameter so tests run against an in-memory implementation, and every
//! outcome reaches the user as exactly one notice.

mod flow;
mod gateway;
mod profile;
mod redirect;

pub use flow::{AuthFlow, RejectReason, SignInInput, SignInOutcome, SignUpInput, SignUpOutcome};
pub use gateway::{SessionGateway, SignUpAck};
pub use profile::{NewProfile, ProfileStore, RedirectionProfile, UserProfile};
pub use redirect::RedirectMap;
