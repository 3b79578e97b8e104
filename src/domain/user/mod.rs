//! User domain module
//!
//! Users are keyed by lowercase email and carry their registration status,
//! capability roles and embedded team membership state.

mod entity;
mod repository;
mod role;
mod validation;

pub use entity::{Email, PendingInvite, TeamInfo, User};
pub use repository::UserRepository;
pub use role::{Capability, Roles};
pub use validation::{validate_email, UserValidationError};
