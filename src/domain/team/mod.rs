//! Team domain module
//!
//! A team is one leader plus up to three confirmed members. Teams move from
//! Active to Disbanded exactly once.

mod entity;
mod repository;
mod validation;

pub use entity::{Team, TeamId, TeamRole, TeamStatus, MAX_TEAM_SIZE};
pub use repository::{TeamQuery, TeamRepository};
pub use validation::{validate_team_id, validate_team_name, TeamValidationError};
