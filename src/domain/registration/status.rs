//! Registration status and its transition graph

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A participant's progress from application through check-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    #[default]
    Unregistered,
    Registered,
    Rejected,
    Confirmation,
    Coming,
    NotComing,
    Confirmed,
    Waitlist,
    CheckedIn,
}

impl RegistrationStatus {
    pub const ALL: [RegistrationStatus; 9] = [
        Self::Unregistered,
        Self::Registered,
        Self::Rejected,
        Self::Confirmation,
        Self::Coming,
        Self::NotComing,
        Self::Confirmed,
        Self::Waitlist,
        Self::CheckedIn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unregistered => "unregistered",
            Self::Registered => "registered",
            Self::Rejected => "rejected",
            Self::Confirmation => "confirmation",
            Self::Coming => "coming",
            Self::NotComing => "not_coming",
            Self::Confirmed => "confirmed",
            Self::Waitlist => "waitlist",
            Self::CheckedIn => "checked_in",
        }
    }

    /// Edges of the transition graph
    pub fn successors(&self) -> &'static [RegistrationStatus] {
        use RegistrationStatus::*;

        match self {
            Unregistered => &[Registered],
            Registered => &[Rejected, Confirmation, Waitlist],
            Confirmation => &[Coming, NotComing],
            Rejected => &[CheckedIn],
            Coming => &[NotComing, Confirmed],
            NotComing => &[Coming, Waitlist],
            Confirmed => &[CheckedIn],
            Waitlist => &[CheckedIn],
            CheckedIn => &[],
        }
    }

    /// Whether `next` is a plain graph edge from this status
    pub fn can_transition_to(&self, next: RegistrationStatus) -> bool {
        self.successors().contains(&next)
    }

    /// Statuses that may check in once the check-in window opens, even
    /// without a direct graph edge
    pub fn is_at_least_registered(&self) -> bool {
        matches!(
            self,
            Self::Confirmed | Self::Waitlist | Self::Registered | Self::Coming
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.successors().is_empty()
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("'{}' is not a valid registration status", s))
    }
}
