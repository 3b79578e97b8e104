//! Transition validation, including the time-gated check-in rule

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use super::status::RegistrationStatus;

/// How long after the start check-in stays open
pub const CHECK_IN_WINDOW_DAYS: i64 = 3;

/// Configured start of event check-in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInWindow {
    start: DateTime<Utc>,
}

impl CheckInWindow {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { start }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Last instant at which check-in is accepted
    pub fn cutoff(&self) -> DateTime<Utc> {
        self.start + Duration::days(CHECK_IN_WINDOW_DAYS)
    }

    pub fn has_opened(&self, now: DateTime<Utc>) -> bool {
        now >= self.start
    }

    pub fn has_closed(&self, now: DateTime<Utc>) -> bool {
        now > self.cutoff()
    }
}

/// Reasons a status change is refused
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransitionError {
    #[error("Invalid status transition from {from} to {to}")]
    NotAnEdge {
        from: RegistrationStatus,
        to: RegistrationStatus,
    },

    #[error("Check-in has not started yet. Check-in opens at {}", .start.to_rfc3339())]
    CheckInNotOpen { start: DateTime<Utc> },

    #[error("Check-in closed at {}", .cutoff.to_rfc3339())]
    CheckInClosed { cutoff: DateTime<Utc> },

    #[error("User is already checked into event")]
    AlreadyCheckedIn,
}

/// Decide whether `from -> to` is allowed at `now`
///
/// Moves to `checked_in` are rejected after the cutoff no matter the
/// current status. Before that, an at-least-registered user may check in
/// once the window has opened, and a `confirmed` user may check in early.
/// Every other move must be an edge of the graph.
pub fn validate_transition(
    from: RegistrationStatus,
    to: RegistrationStatus,
    now: DateTime<Utc>,
    window: &CheckInWindow,
) -> Result<(), TransitionError> {
    if to == RegistrationStatus::CheckedIn {
        if from == RegistrationStatus::CheckedIn {
            return Err(TransitionError::AlreadyCheckedIn);
        }

        if window.has_closed(now) {
            return Err(TransitionError::CheckInClosed {
                cutoff: window.cutoff(),
            });
        }

        if from.is_at_least_registered() {
            if from == RegistrationStatus::Confirmed || window.has_opened(now) {
                return Ok(());
            }

            return Err(TransitionError::CheckInNotOpen {
                start: window.start(),
            });
        }
    }

    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(TransitionError::NotAnEdge { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::RegistrationStatus::*;
    use super::*;

    fn window() -> (CheckInWindow, DateTime<Utc>) {
        let start = DateTime::parse_from_rfc3339("2026-11-07T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        (CheckInWindow::new(start), start)
    }

    #[test]
    fn test_cutoff_is_three_days_after_start() {
        let (window, start) = window();
        assert_eq!(window.cutoff(), start + Duration::days(3));
        assert!(!window.has_closed(window.cutoff()));
        assert!(window.has_closed(window.cutoff() + Duration::seconds(1)));
    }

    #[test]
    fn test_plain_edges_ignore_clock() {
        let (window, start) = window();
        let before = start - Duration::days(30);

        assert!(validate_transition(Unregistered, Registered, before, &window).is_ok());
        assert!(validate_transition(Registered, Waitlist, before, &window).is_ok());
        assert_eq!(
            validate_transition(Unregistered, Confirmed, before, &window),
            Err(TransitionError::NotAnEdge {
                from: Unregistered,
                to: Confirmed
            })
        );
    }

    #[test]
    fn test_registered_check_in_waits_for_start() {
        let (window, start) = window();

        let err = validate_transition(Registered, CheckedIn, start - Duration::hours(1), &window)
            .unwrap_err();
        assert_eq!(err, TransitionError::CheckInNotOpen { start });
        assert!(err.to_string().contains("2026-11-07T09:00:00"));

        assert!(validate_transition(Registered, CheckedIn, start, &window).is_ok());
    }

    #[test]
    fn test_coming_and_waitlist_check_in_after_start() {
        let (window, start) = window();
        let during = start + Duration::hours(5);

        assert!(validate_transition(Coming, CheckedIn, during, &window).is_ok());
        assert!(validate_transition(Waitlist, CheckedIn, during, &window).is_ok());
        assert!(validate_transition(Waitlist, CheckedIn, start - Duration::hours(1), &window).is_err());
    }

    #[test]
    fn test_confirmed_bypasses_start() {
        let (window, start) = window();
        assert!(validate_transition(Confirmed, CheckedIn, start - Duration::days(2), &window).is_ok());
    }

    #[test]
    fn test_cutoff_applies_to_everyone() {
        let (window, _) = window();
        let late = window.cutoff() + Duration::minutes(1);

        for from in [Confirmed, Waitlist, Registered, Coming, Rejected] {
            assert_eq!(
                validate_transition(from, CheckedIn, late, &window),
                Err(TransitionError::CheckInClosed {
                    cutoff: window.cutoff()
                }),
                "{}",
                from
            );
        }
    }

    #[test]
    fn test_rejected_uses_graph_edge() {
        let (window, start) = window();
        assert!(validate_transition(Rejected, CheckedIn, start - Duration::days(1), &window).is_ok());
    }

    #[test]
    fn test_statuses_without_check_in_path() {
        let (window, start) = window();
        let during = start + Duration::hours(1);

        for from in [Unregistered, Confirmation, NotComing] {
            assert!(matches!(
                validate_transition(from, CheckedIn, during, &window),
                Err(TransitionError::NotAnEdge { .. })
            ));
        }
    }

    #[test]
    fn test_already_checked_in() {
        let (window, start) = window();
        assert_eq!(
            validate_transition(CheckedIn, CheckedIn, start, &window),
            Err(TransitionError::AlreadyCheckedIn)
        );
        assert!(validate_transition(CheckedIn, Registered, start, &window).is_err());
    }
}
