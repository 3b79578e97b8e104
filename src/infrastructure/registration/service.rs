//! Registration status service

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::domain::clock::Clock;
use crate::domain::notification::{NotificationDispatcher, NotificationEvent};
use crate::domain::registration::{
    missing_required_fields, validate_transition, CheckInWindow, RegistrationStatus,
    RegistrationUpdate,
};
use crate::domain::user::{Capability, Email, User, UserRepository};
use crate::domain::DomainError;
use crate::infrastructure::observability::record_registration_transition;

/// Applies caller-supplied `$set` documents to user records, gating status
/// changes through the transition graph and the check-in window
#[derive(Debug)]
pub struct RegistrationService {
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    window: CheckInWindow,
}

impl RegistrationService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        notifier: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
        window: CheckInWindow,
    ) -> Self {
        Self {
            users,
            notifier,
            clock,
            window,
        }
    }

    /// Validate and apply an update to `target`'s record on behalf of `caller`
    pub async fn update_registration(
        &self,
        caller: &Email,
        target: &str,
        set: Map<String, Value>,
    ) -> Result<User, DomainError> {
        let caller = self
            .users
            .get(caller)
            .await?
            .ok_or_else(|| DomainError::unauthorized("Unknown caller"))?;

        let target = Email::parse(target)
            .map_err(|_| DomainError::not_found(format!("User '{}' not found", target)))?;

        authorize(&caller, &target)?;

        let mut user = self
            .users
            .get(&target)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", target)))?;

        let update =
            RegistrationUpdate::parse(set).map_err(|e| DomainError::validation(e.to_string()))?;

        if update.roles.is_some() && !caller.roles().has(Capability::Director) {
            return Err(DomainError::forbidden("Only directors can change roles"));
        }

        if update.email.as_ref().is_some_and(|email| email != user.email()) {
            return Err(DomainError::validation("Email address cannot be changed"));
        }

        let now = self.clock.now();
        let from = user.registration_status();
        let change = match update.status {
            Some(to) if to == from && to != RegistrationStatus::CheckedIn => None,
            Some(to) => {
                self.check_transition(&user, from, to)?;
                Some(to)
            }
            None => None,
        };

        for (name, value) in update.fields {
            user.set_profile_field(name, value);
        }

        if let Some(roles) = update.roles {
            user.set_roles(roles);
        }

        if let Some(to) = change {
            user.set_registration_status(to, now);
        }

        let user = self.users.update(user).await?;

        match change {
            Some(to) => {
                info!(email = %target, by = %caller.email(), from = %from, to = %to, "Registration status changed");
                record_registration_transition(from, to);
                self.notifier.publish(NotificationEvent::RegistrationStatusChanged {
                    email: target,
                    from,
                    to,
                    at: now,
                });
            }
            None => debug!(email = %target, by = %caller.email(), "Registration fields updated"),
        }

        Ok(user)
    }

    fn check_transition(
        &self,
        user: &User,
        from: RegistrationStatus,
        to: RegistrationStatus,
    ) -> Result<(), DomainError> {
        validate_transition(from, to, self.clock.now(), &self.window)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        if from == RegistrationStatus::Unregistered && to == RegistrationStatus::Registered {
            let missing = missing_required_fields(user);

            if !missing.is_empty() {
                return Err(DomainError::validation(format!(
                    "Missing required fields: {}",
                    missing.join(", ")
                )));
            }
        }

        Ok(())
    }
}

/// Staff may update anyone; hackers only themselves
fn authorize(caller: &User, target: &Email) -> Result<(), DomainError> {
    let roles = caller.roles();

    if roles.is_staff() || (roles.has(Capability::Hacker) && caller.email() == target) {
        return Ok(());
    }

    Err(DomainError::unauthorized("Not allowed to update this user"))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use serde_json::json;

    use super::*;
    use crate::domain::clock::FixedClock;
    use crate::domain::notification::MockNotificationDispatcher;
    use crate::domain::registration::REQUIRED_PROFILE_FIELDS;
    use crate::domain::storage::DocumentStore;
    use crate::domain::user::Roles;
    use crate::infrastructure::storage::InMemoryDocumentStore;
    use crate::infrastructure::user::StorageUserRepository;

    const HACKER: &str = "hacker@example.com";
    const OTHER: &str = "other@example.com";
    const ORGANIZER: &str = "organizer@example.com";
    const DIRECTOR: &str = "director@example.com";
    const VOLUNTEER: &str = "volunteer@example.com";

    fn email(raw: &str) -> Email {
        Email::parse(raw).unwrap()
    }

    fn check_in_start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-11-07T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn with_status(raw: &str, role: Capability, status: RegistrationStatus) -> User {
        User::new(email(raw))
            .with_roles(Roles::of(role))
            .with_status(status)
    }

    fn complete_profile(mut user: User) -> User {
        for field in REQUIRED_PROFILE_FIELDS {
            user = user.with_profile_field(field, "filled");
        }
        user
    }

    fn set(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    struct Fixture {
        service: RegistrationService,
        store: Arc<InMemoryDocumentStore>,
        clock: Arc<FixedClock>,
    }

    impl Fixture {
        async fn status_of(&self, raw: &str) -> RegistrationStatus {
            self.store
                .users()
                .get(&email(raw))
                .await
                .unwrap()
                .unwrap()
                .registration_status()
        }
    }

    fn fixture(users: Vec<User>, notifier: MockNotificationDispatcher) -> Fixture {
        let mut seeded = vec![
            with_status(ORGANIZER, Capability::Organizer, RegistrationStatus::Unregistered),
            with_status(DIRECTOR, Capability::Director, RegistrationStatus::Unregistered),
            with_status(VOLUNTEER, Capability::Volunteer, RegistrationStatus::Unregistered),
        ];
        seeded.extend(users);

        let store = Arc::new(InMemoryDocumentStore::with_users(seeded));
        let clock = Arc::new(FixedClock::new(check_in_start() - Duration::days(1)));
        let service = RegistrationService::new(
            Arc::new(StorageUserRepository::new(store.users())),
            Arc::new(notifier),
            clock.clone(),
            CheckInWindow::new(check_in_start()),
        );

        Fixture {
            service,
            store,
            clock,
        }
    }

    fn silent() -> MockNotificationDispatcher {
        let mut notifier = MockNotificationDispatcher::new();
        notifier.expect_publish().never();
        notifier
    }

    fn expecting(count: usize) -> MockNotificationDispatcher {
        let mut notifier = MockNotificationDispatcher::new();
        notifier.expect_publish().times(count).return_const(());
        notifier
    }

    #[tokio::test]
    async fn test_register_with_complete_profile() {
        let user = complete_profile(with_status(HACKER, Capability::Hacker, RegistrationStatus::Unregistered));
        let f = fixture(vec![user], expecting(1));

        let updated = f
            .service
            .update_registration(&email(HACKER), HACKER, set(json!({"registration_status": "registered"})))
            .await
            .unwrap();

        assert_eq!(updated.registration_status(), RegistrationStatus::Registered);
        assert_eq!(updated.registered_at(), Some(f.clock.now()));
    }

    #[tokio::test]
    async fn test_register_requires_profile_fields() {
        let user = with_status(HACKER, Capability::Hacker, RegistrationStatus::Unregistered)
            .with_profile_field("first_name", "Ada")
            .with_profile_field("last_name", "  ");
        let f = fixture(vec![user], silent());

        let err = f
            .service
            .update_registration(&email(HACKER), HACKER, set(json!({"registration_status": "registered"})))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
        assert!(err.message().starts_with("Missing required fields"));
        assert!(err.message().contains("last_name"));
        assert!(!err.message().contains("first_name"));
        assert_eq!(f.status_of(HACKER).await, RegistrationStatus::Unregistered);
    }

    #[tokio::test]
    async fn test_check_in_gated_by_start_time() {
        let user = with_status(HACKER, Capability::Hacker, RegistrationStatus::Registered);
        let f = fixture(vec![user], expecting(1));
        let check_in = || set(json!({"registration_status": "checked_in"}));

        let err = f
            .service
            .update_registration(&email(ORGANIZER), HACKER, check_in())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
        assert!(err.message().contains(&check_in_start().to_rfc3339()));

        f.clock.set(check_in_start());
        let updated = f
            .service
            .update_registration(&email(ORGANIZER), HACKER, check_in())
            .await
            .unwrap();
        assert_eq!(updated.registration_status(), RegistrationStatus::CheckedIn);
    }

    #[tokio::test]
    async fn test_confirmed_checks_in_early_but_not_after_cutoff() {
        let early = with_status(HACKER, Capability::Hacker, RegistrationStatus::Confirmed);
        let late = with_status(OTHER, Capability::Hacker, RegistrationStatus::Confirmed);
        let f = fixture(vec![early, late], expecting(1));

        f.service
            .update_registration(&email(ORGANIZER), HACKER, set(json!({"registration_status": "checked_in"})))
            .await
            .unwrap();

        f.clock.set(check_in_start() + Duration::days(3) + Duration::seconds(1));
        let err = f
            .service
            .update_registration(&email(ORGANIZER), OTHER, set(json!({"registration_status": "checked_in"})))
            .await
            .unwrap_err();
        assert!(err.message().contains("Check-in closed"));
    }

    #[tokio::test]
    async fn test_already_checked_in() {
        let user = with_status(HACKER, Capability::Hacker, RegistrationStatus::CheckedIn);
        let f = fixture(vec![user], silent());
        f.clock.set(check_in_start());

        let err = f
            .service
            .update_registration(&email(ORGANIZER), HACKER, set(json!({"registration_status": "checked_in"})))
            .await
            .unwrap_err();

        assert!(err.message().contains("already checked into event"));
    }

    #[tokio::test]
    async fn test_illegal_edge_rejected() {
        let user = with_status(HACKER, Capability::Hacker, RegistrationStatus::Registered);
        let f = fixture(vec![user], silent());

        let err = f
            .service
            .update_registration(&email(DIRECTOR), HACKER, set(json!({"registration_status": "confirmed"})))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
        assert_eq!(f.status_of(HACKER).await, RegistrationStatus::Registered);
    }

    #[tokio::test]
    async fn test_same_status_is_a_no_op() {
        let user = with_status(HACKER, Capability::Hacker, RegistrationStatus::Waitlist);
        let f = fixture(vec![user], silent());

        let updated = f
            .service
            .update_registration(
                &email(HACKER),
                HACKER,
                set(json!({"registration_status": "waitlist", "school": "State"})),
            )
            .await
            .unwrap();

        assert_eq!(updated.registration_status(), RegistrationStatus::Waitlist);
        assert_eq!(updated.profile_field("school"), Some(&json!("State")));
    }

    #[tokio::test]
    async fn test_locked_field_rejects_status_change() {
        let user = complete_profile(with_status(HACKER, Capability::Hacker, RegistrationStatus::Unregistered));
        let f = fixture(vec![user], silent());

        let err = f
            .service
            .update_registration(
                &email(HACKER),
                HACKER,
                set(json!({"registration_status": "registered", "email_verified": true})),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
        assert_eq!(f.status_of(HACKER).await, RegistrationStatus::Unregistered);
    }

    #[tokio::test]
    async fn test_email_rules() {
        let user = with_status(HACKER, Capability::Hacker, RegistrationStatus::Registered);
        let f = fixture(vec![user], silent());

        let malformed = f
            .service
            .update_registration(&email(HACKER), HACKER, set(json!({"email": "not-an-email"})))
            .await;
        assert!(matches!(malformed.unwrap_err(), DomainError::Validation { .. }));

        let changed = f
            .service
            .update_registration(&email(HACKER), HACKER, set(json!({"email": "new@example.com"})))
            .await;
        assert!(matches!(changed.unwrap_err(), DomainError::Validation { .. }));

        f.service
            .update_registration(&email(HACKER), HACKER, set(json!({"email": "HACKER@example.com"})))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_authorization() {
        let hacker = with_status(HACKER, Capability::Hacker, RegistrationStatus::Registered);
        let other = with_status(OTHER, Capability::Hacker, RegistrationStatus::Registered);
        let f = fixture(vec![hacker, other], silent());
        let update = || set(json!({"school": "State"}));

        let cross = f.service.update_registration(&email(HACKER), OTHER, update()).await;
        assert!(matches!(cross.unwrap_err(), DomainError::Unauthorized { .. }));

        let volunteer = f.service.update_registration(&email(VOLUNTEER), VOLUNTEER, update()).await;
        assert!(matches!(volunteer.unwrap_err(), DomainError::Unauthorized { .. }));

        let unknown = f
            .service
            .update_registration(&email("ghost@example.com"), HACKER, update())
            .await;
        assert!(matches!(unknown.unwrap_err(), DomainError::Unauthorized { .. }));

        let missing = f
            .service
            .update_registration(&email(ORGANIZER), "ghost@example.com", update())
            .await;
        assert!(matches!(missing.unwrap_err(), DomainError::NotFound { .. }));

        f.service
            .update_registration(&email(ORGANIZER), OTHER, update())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_only_directors_change_roles() {
        let user = with_status(HACKER, Capability::Hacker, RegistrationStatus::Registered);
        let f = fixture(vec![user], silent());
        let promote = || set(json!({"role": ["hacker", "volunteer"]}));

        let by_organizer = f.service.update_registration(&email(ORGANIZER), HACKER, promote()).await;
        assert!(matches!(by_organizer.unwrap_err(), DomainError::Forbidden { .. }));

        let updated = f
            .service
            .update_registration(&email(DIRECTOR), HACKER, promote())
            .await
            .unwrap();
        assert!(updated.roles().has(Capability::Volunteer));
    }

    #[tokio::test]
    async fn test_notification_carries_transition() {
        let user = with_status(HACKER, Capability::Hacker, RegistrationStatus::Registered);
        let mut notifier = MockNotificationDispatcher::new();
        notifier
            .expect_publish()
            .withf(|event| {
                matches!(
                    event,
                    NotificationEvent::RegistrationStatusChanged {
                        from: RegistrationStatus::Registered,
                        to: RegistrationStatus::Waitlist,
                        ..
                    }
                ) && event.recipient().as_str() == HACKER
            })
            .times(1)
            .return_const(());
        let f = fixture(vec![user], notifier);

        f.service
            .update_registration(&email(ORGANIZER), HACKER, set(json!({"registration_status": "waitlist"})))
            .await
            .unwrap();
    }
}
