//! Infrastructure layer - storage backends, services and collaborator implementations

pub mod auth;
pub mod directory;
pub mod logging;
pub mod notification;
pub mod observability;
pub mod registration;
pub mod storage;
pub mod team;
pub mod user;
