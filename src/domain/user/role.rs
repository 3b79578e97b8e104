//! Capability roles held by a user

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::validation::UserValidationError;

/// A named permission a user may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Hacker,
    Volunteer,
    Mentor,
    Sponsor,
    Organizer,
    Director,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Self::Hacker,
        Self::Volunteer,
        Self::Mentor,
        Self::Sponsor,
        Self::Organizer,
        Self::Director,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hacker => "hacker",
            Self::Volunteer => "volunteer",
            Self::Mentor => "mentor",
            Self::Sponsor => "sponsor",
            Self::Organizer => "organizer",
            Self::Director => "director",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UserValidationError::UnknownCapability(s.to_string()))
    }
}

/// Set of capabilities, stored as a bitmask
///
/// Serialized as a list of names. Documents written in the older
/// `{"hacker": true, "director": false}` shape are still accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RolesRepr", into = "Vec<Capability>")]
pub struct Roles(u8);

#[derive(Deserialize)]
#[serde(untagged)]
enum RolesRepr {
    List(Vec<Capability>),
    Flags(HashMap<Capability, bool>),
}

impl From<RolesRepr> for Roles {
    fn from(repr: RolesRepr) -> Self {
        match repr {
            RolesRepr::List(list) => list.into_iter().collect(),
            RolesRepr::Flags(flags) => flags
                .into_iter()
                .filter_map(|(capability, held)| held.then_some(capability))
                .collect(),
        }
    }
}

impl From<Roles> for Vec<Capability> {
    fn from(roles: Roles) -> Self {
        roles.iter().collect()
    }
}

impl FromIterator<Capability> for Roles {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut roles = Roles::empty();
        for capability in iter {
            roles.insert(capability);
        }
        roles
    }
}

impl Roles {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn of(capability: Capability) -> Self {
        Self(capability.bit())
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.insert(capability);
        self
    }

    pub fn insert(&mut self, capability: Capability) {
        self.0 |= capability.bit();
    }

    pub fn remove(&mut self, capability: Capability) {
        self.0 &= !capability.bit();
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn has_any(&self, capabilities: &[Capability]) -> bool {
        capabilities.iter().any(|c| self.has(*c))
    }

    /// Organizers and directors may act on other users' records
    pub fn is_staff(&self) -> bool {
        self.has_any(&[Capability::Organizer, Capability::Director])
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.has(*c))
    }

    /// Parse a list of capability names
    pub fn parse<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Self, UserValidationError> {
        names
            .into_iter()
            .map(Capability::from_str)
            .collect::<Result<Roles, _>>()
    }
}
