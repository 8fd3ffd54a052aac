mod error;
mod normalize;
pub mod role;

pub use error::*;
pub use normalize::*;
pub use role::{RegistrationStatus, Role, TeacherStatus};
