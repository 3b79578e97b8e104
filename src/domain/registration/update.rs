//! Parsing of caller-supplied `$set` documents

use serde_json::{Map, Value};
use thiserror::Error;

use super::status::RegistrationStatus;
use crate::domain::user::{Email, Roles, User};

/// Fields a caller may never write through a registration update
pub const LOCKED_FIELDS: [&str; 6] = [
    "_id",
    "password",
    "discord",
    "created_at",
    "registered_at",
    "email_verified",
];

/// Fields owned by the team lifecycle or bookkeeping
pub const SYSTEM_FIELDS: [&str; 3] = ["team_info", "confirmed_team", "updated_at"];

/// Profile fields that must be filled before `unregistered -> registered`
pub const REQUIRED_PROFILE_FIELDS: [&str; 10] = [
    "first_name",
    "last_name",
    "phone_number",
    "age",
    "gender",
    "race",
    "school",
    "major",
    "level_of_study",
    "country_of_residence",
];

const STATUS_FIELD: &str = "registration_status";
const EMAIL_FIELD: &str = "email";
const ROLE_FIELD: &str = "role";

/// Why a `$set` document was refused before any state was consulted
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UpdateError {
    #[error("No fields to update")]
    Empty,

    #[error("Cannot update locked field(s): {}", .0.join(", "))]
    LockedFields(Vec<String>),

    #[error("Field(s) managed by the system cannot be updated: {}", .0.join(", "))]
    SystemFields(Vec<String>),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid registration status: {0}")]
    InvalidStatus(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),
}

/// A validated `$set` document, split into the parts the state machine
/// handles specially and free-form profile fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationUpdate {
    pub status: Option<RegistrationStatus>,
    pub email: Option<Email>,
    pub roles: Option<Roles>,
    pub fields: Map<String, Value>,
}

impl RegistrationUpdate {
    /// Validate and split a `$set` document
    ///
    /// Any locked field rejects the whole update, even when a status change
    /// is also present.
    pub fn parse(set: Map<String, Value>) -> Result<Self, UpdateError> {
        if set.is_empty() {
            return Err(UpdateError::Empty);
        }

        let locked = offending(&set, &LOCKED_FIELDS);
        if !locked.is_empty() {
            return Err(UpdateError::LockedFields(locked));
        }

        let system = offending(&set, &SYSTEM_FIELDS);
        if !system.is_empty() {
            return Err(UpdateError::SystemFields(system));
        }

        let mut update = RegistrationUpdate::default();

        for (name, value) in set {
            match name.as_str() {
                STATUS_FIELD => update.status = Some(parse_status(&value)?),
                EMAIL_FIELD => update.email = Some(parse_email(&value)?),
                ROLE_FIELD => update.roles = Some(parse_roles(&value)?),
                _ => {
                    update.fields.insert(name, value);
                }
            }
        }

        Ok(update)
    }
}

/// Required profile fields that are still empty on the stored document
pub fn missing_required_fields(user: &User) -> Vec<&'static str> {
    REQUIRED_PROFILE_FIELDS
        .into_iter()
        .filter(|field| !user.has_profile_value(field))
        .collect()
}

fn offending(set: &Map<String, Value>, names: &[&str]) -> Vec<String> {
    names
        .iter()
        .filter(|name| set.contains_key(**name))
        .map(|name| name.to_string())
        .collect()
}

fn parse_status(value: &Value) -> Result<RegistrationStatus, UpdateError> {
    let raw = value
        .as_str()
        .ok_or_else(|| UpdateError::InvalidStatus(value.to_string()))?;
    raw.parse().map_err(UpdateError::InvalidStatus)
}

fn parse_email(value: &Value) -> Result<Email, UpdateError> {
    let raw = value
        .as_str()
        .ok_or_else(|| UpdateError::InvalidEmail(value.to_string()))?;
    Email::parse(raw).map_err(|e| UpdateError::InvalidEmail(e.to_string()))
}

fn parse_roles(value: &Value) -> Result<Roles, UpdateError> {
    serde_json::from_value::<Roles>(value.clone())
        .map_err(|e| UpdateError::InvalidRole(e.to_string()))
}
