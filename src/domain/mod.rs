//! Domain layer - entities, state machines and collaborator traits

pub mod auth;
pub mod clock;
pub mod directory;
pub mod error;
pub mod notification;
pub mod registration;
pub mod storage;
pub mod team;
pub mod user;

pub use auth::CredentialVerifier;
pub use clock::{Clock, FixedClock, SystemClock};
pub use directory::AccountDirectory;
pub use error::DomainError;
pub use notification::{NotificationDispatcher, NotificationEvent};
pub use registration::{CheckInWindow, RegistrationStatus, RegistrationUpdate};
pub use storage::{DocumentStore, Storage, StorageEntity, StorageKey, WriteBatch, WriteOp};
pub use team::{Team, TeamId, TeamRole, TeamStatus};
pub use user::{Capability, Email, Roles, User};
