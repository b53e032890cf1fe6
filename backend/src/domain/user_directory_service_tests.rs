//! Tests for the user directory service.

use std::sync::Mutex;

use super::*;
use crate::domain::ports::{MockUserRepository, RepositoryError};
use crate::domain::{DisplayName, ErrorCode, Role};
use crate::test_support::MutableClock;
use chrono::{DateTime, Utc};
use rstest::{fixture, rstest};

/// Versioned in-memory collection behaving like the store-backed adapter.
#[derive(Default)]
struct StubUsers(Mutex<(Vec<UserAccount>, Option<u64>)>);

#[async_trait]
impl UserRepository for StubUsers {
    async fn load_users(&self) -> Result<Versioned<Vec<UserAccount>>, RepositoryError> {
        let guard = self.0.lock().expect("stub lock");
        Ok(Versioned::new(guard.0.clone(), guard.1))
    }

    async fn save_users(
        &self,
        users: &[UserAccount],
        expected_version: Option<u64>,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.0.lock().expect("stub lock");
        if guard.1 != expected_version {
            return Err(RepositoryError::version_conflict("users"));
        }
        guard.0 = users.to_vec();
        guard.1 = Some(guard.1.map_or(1, |v| v + 1));
        Ok(())
    }
}

fn clock() -> Arc<dyn Clock> {
    Arc::new(MutableClock::new(DateTime::<Utc>::UNIX_EPOCH))
}

fn new_user(email: &str, role: Role) -> NewUser {
    NewUser {
        email: EmailAddress::new(email).expect("valid email"),
        password: Password::new("password123").expect("valid password"),
        role,
        display_name: DisplayName::new("Agent").expect("valid name"),
    }
}

fn credentials(email: &str, password: &str) -> LoginCredentials {
    LoginCredentials::try_from_parts(email, password).expect("credentials shape")
}

#[fixture]
fn directory() -> UserDirectoryService<StubUsers> {
    UserDirectoryService::new(Arc::new(StubUsers::default()), clock())
}

#[rstest]
#[tokio::test]
async fn create_then_authenticate_case_insensitively(directory: UserDirectoryService<StubUsers>) {
    let created = directory
        .create(new_user("Agent@Mairie.tn", Role::Employee))
        .await
        .expect("create");
    assert!(created.active);
    assert_eq!(created.created_at, DateTime::<Utc>::UNIX_EPOCH);

    let found = directory
        .authenticate(&credentials("agent@MAIRIE.tn", "password123"))
        .await
        .expect("authenticate");
    assert_eq!(found.map(|user| user.id), Some(created.id));
}

#[rstest]
#[tokio::test]
async fn authenticate_rejects_wrong_password_unknown_email_and_inactive(
    directory: UserDirectoryService<StubUsers>,
) {
    directory
        .create(new_user("admin@mairie.tn", Role::Admin))
        .await
        .expect("admin");
    let agent = directory
        .create(new_user("agent@mairie.tn", Role::Employee))
        .await
        .expect("agent");

    for (email, password) in [
        ("admin@mairie.tn", "wrong-password"),
        ("nobody@mairie.tn", "password123"),
    ] {
        let result = directory
            .authenticate(&credentials(email, password))
            .await
            .expect("authenticate");
        assert!(result.is_none(), "{email} must not authenticate");
    }

    directory.toggle_active(&agent.id).await.expect("deactivate");
    let result = directory
        .authenticate(&credentials("agent@mairie.tn", "password123"))
        .await
        .expect("authenticate");
    assert!(result.is_none(), "inactive accounts must not authenticate");
}

#[rstest]
#[tokio::test]
async fn create_rejects_duplicate_email_in_any_case(directory: UserDirectoryService<StubUsers>) {
    directory
        .create(new_user("agent@mairie.tn", Role::Employee))
        .await
        .expect("first");
    let err = directory
        .create(new_user("AGENT@mairie.tn", Role::Employee))
        .await
        .expect_err("duplicate");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn update_rejects_email_of_another_user(directory: UserDirectoryService<StubUsers>) {
    directory
        .create(new_user("one@mairie.tn", Role::Admin))
        .await
        .expect("one");
    let two = directory
        .create(new_user("two@mairie.tn", Role::Employee))
        .await
        .expect("two");

    let patch = UserPatch {
        email: Some(EmailAddress::new("ONE@mairie.tn").expect("valid email")),
        ..UserPatch::default()
    };
    let err = directory.update(&two.id, patch).await.expect_err("taken");
    assert_eq!(err.code(), ErrorCode::Conflict);

    let own = UserPatch {
        email: Some(EmailAddress::new("Two@Mairie.tn").expect("valid email")),
        ..UserPatch::default()
    };
    let updated = directory.update(&two.id, own).await.expect("own email");
    assert_eq!(updated.email.as_ref(), "Two@Mairie.tn");
    assert_eq!(updated.created_at, two.created_at);
}

#[rstest]
#[tokio::test]
async fn update_rehashes_new_password(directory: UserDirectoryService<StubUsers>) {
    let user = directory
        .create(new_user("agent@mairie.tn", Role::Admin))
        .await
        .expect("create");
    let patch = UserPatch {
        password: Some(Password::new("another-secret").expect("valid password")),
        ..UserPatch::default()
    };
    directory.update(&user.id, patch).await.expect("update");

    let old = directory
        .authenticate(&credentials("agent@mairie.tn", "password123"))
        .await
        .expect("authenticate");
    assert!(old.is_none());
    let new = directory
        .authenticate(&credentials("agent@mairie.tn", "another-secret"))
        .await
        .expect("authenticate");
    assert!(new.is_some());
}

#[rstest]
#[tokio::test]
async fn unknown_ids_are_not_found(directory: UserDirectoryService<StubUsers>) {
    let missing = UserId::random();
    let update = directory
        .update(&missing, UserPatch::default())
        .await
        .expect_err("missing");
    let delete = directory.delete(&missing).await.expect_err("missing");
    let toggle = directory.toggle_active(&missing).await.expect_err("missing");
    for err in [update, delete, toggle] {
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}

#[rstest]
#[tokio::test]
async fn last_active_admin_is_protected(directory: UserDirectoryService<StubUsers>) {
    let admin = directory
        .create(new_user("admin@mairie.tn", Role::Admin))
        .await
        .expect("admin");
    directory
        .create(new_user("agent@mairie.tn", Role::Employee))
        .await
        .expect("agent");

    let delete = directory.delete(&admin.id).await.expect_err("delete");
    let deactivate = directory.toggle_active(&admin.id).await.expect_err("deactivate");
    let demote = directory
        .update(
            &admin.id,
            UserPatch {
                role: Some(Role::Employee),
                ..UserPatch::default()
            },
        )
        .await
        .expect_err("demote");
    for err in [delete, deactivate, demote] {
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    directory
        .create(new_user("second@mairie.tn", Role::Admin))
        .await
        .expect("second admin");
    directory.delete(&admin.id).await.expect("no longer the last admin");
}

#[rstest]
#[tokio::test]
async fn bootstrap_admin_only_seeds_an_empty_directory(directory: UserDirectoryService<StubUsers>) {
    let first = directory
        .ensure_bootstrap_admin(new_user("admin@mairie.tn", Role::Admin))
        .await
        .expect("bootstrap");
    let second = directory
        .ensure_bootstrap_admin(new_user("other@mairie.tn", Role::Admin))
        .await
        .expect("bootstrap");
    assert!(first);
    assert!(!second);
    assert_eq!(directory.list().await.expect("list").len(), 1);
}

#[rstest]
#[tokio::test]
async fn version_conflicts_are_retried() {
    let mut repo = MockUserRepository::new();
    repo.expect_load_users()
        .times(2)
        .returning(|| Ok(Versioned::new(Vec::new(), Some(7))));
    let mut conflicted = false;
    repo.expect_save_users().times(2).returning(move |_, expected| {
        assert_eq!(expected, Some(7));
        if conflicted {
            Ok(())
        } else {
            conflicted = true;
            Err(RepositoryError::version_conflict("users"))
        }
    });

    let directory = UserDirectoryService::new(Arc::new(repo), clock());
    directory
        .create(new_user("agent@mairie.tn", Role::Employee))
        .await
        .expect("second attempt succeeds");
}

#[rstest]
#[tokio::test]
async fn persistent_conflicts_surface_as_conflict() {
    let mut repo = MockUserRepository::new();
    repo.expect_load_users()
        .times(MAX_WRITE_ATTEMPTS)
        .returning(|| Ok(Versioned::absent(Vec::new())));
    repo.expect_save_users()
        .times(MAX_WRITE_ATTEMPTS)
        .returning(|_, _| Err(RepositoryError::version_conflict("users")));

    let directory = UserDirectoryService::new(Arc::new(repo), clock());
    let err = directory
        .create(new_user("agent@mairie.tn", Role::Employee))
        .await
        .expect_err("exhausted");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn connection_failures_are_service_unavailable() {
    let mut repo = MockUserRepository::new();
    repo.expect_load_users()
        .returning(|| Err(RepositoryError::connection("disk unplugged")));

    let directory = UserDirectoryService::new(Arc::new(repo), clock());
    let err = directory.list().await.expect_err("unavailable");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}
