//! Registration infrastructure implementations

mod service;

pub use service::RegistrationService;
