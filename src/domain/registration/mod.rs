//! Registration status state machine
//!
//! The graph of legal status moves, the check-in window, and validation of
//! caller-supplied update documents.

mod status;
mod transition;
mod update;

pub use status::RegistrationStatus;
pub use transition::{validate_transition, CheckInWindow, TransitionError, CHECK_IN_WINDOW_DAYS};
pub use update::{
    missing_required_fields, RegistrationUpdate, UpdateError, LOCKED_FIELDS,
    REQUIRED_PROFILE_FIELDS, SYSTEM_FIELDS,
};
