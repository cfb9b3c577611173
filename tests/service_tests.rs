//! Service-level tests for the login guard, authentication and the
//! reactivation workflow against a real SQLite database.

use examhall::config::Config;
use examhall::db::User;
use examhall::entities::reactivation_requests::RequestStatus;
use examhall::entities::users::UserType;
use examhall::services::{AccountError, AuthError, CreateUserInput, ReactivationError};
use examhall::state::SharedState;
use std::sync::Arc;

async fn spawn_state() -> Arc<SharedState> {
    let db_path =
        std::env::temp_dir().join(format!("examhall-service-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    Arc::new(
        SharedState::new(config)
            .await
            .expect("failed to create shared state"),
    )
}

async fn admin(state: &SharedState) -> User {
    state
        .store
        .get_user_by_username("admin")
        .await
        .expect("failed to query admin")
        .expect("missing bootstrap admin")
}

async fn create_student(state: &SharedState, username: &str, max_logins: i32) -> User {
    let admin = admin(state).await;
    state
        .account_service
        .create_user(
            &admin,
            CreateUserInput {
                username: username.to_string(),
                password: "correct-horse".to_string(),
                password_confirm: "correct-horse".to_string(),
                email: Some(format!("{username}@example.edu")),
                first_name: "Test".to_string(),
                last_name: "Student".to_string(),
                user_type: UserType::Student,
                max_logins_allowed: Some(max_logins),
            },
        )
        .await
        .expect("failed to create student")
}

async fn reload(state: &SharedState, id: i32) -> User {
    state
        .store
        .get_user(id)
        .await
        .expect("failed to query user")
        .expect("user vanished")
}

/// Logs in until the account is locked.
async fn lock_out(state: &SharedState, username: &str, max_logins: i32) {
    for _ in 0..max_logins {
        state
            .auth_service
            .login(username, "correct-horse")
            .await
            .expect("login within allowance failed");
    }
    let err = state
        .auth_service
        .login(username, "correct-horse")
        .await
        .expect_err("login past allowance succeeded");
    assert!(matches!(err, AuthError::AccountLocked));
}

#[tokio::test]
async fn student_is_disabled_on_the_login_past_the_allowance() {
    let state = spawn_state().await;
    let student = create_student(&state, "alice", 2).await;

    let first = state
        .auth_service
        .login("alice", "correct-horse")
        .await
        .unwrap();
    assert_eq!(first.login_count, 1);
    assert!(first.last_login.is_some());

    let second = state
        .auth_service
        .login("alice", "correct-horse")
        .await
        .unwrap();
    assert_eq!(second.login_count, 2);
    assert!(second.is_active);

    let err = state
        .auth_service
        .login("alice", "correct-horse")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::AccountLocked));

    let locked = reload(&state, student.id).await;
    assert_eq!(locked.login_count, 3);
    assert!(!locked.is_active);
    assert!(locked.disabled_by_login_limit);
    assert!(locked.last_login_attempt.is_some());
}

#[tokio::test]
async fn locked_account_is_not_counted_again() {
    let state = spawn_state().await;
    let student = create_student(&state, "bob", 1).await;
    lock_out(&state, "bob", 1).await;

    for _ in 0..3 {
        let err = state
            .auth_service
            .login("bob", "correct-horse")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountLocked));
    }

    let user = reload(&state, student.id).await;
    assert_eq!(user.login_count, 2);
    assert!(user.disabled_by_login_limit);
}

#[tokio::test]
async fn wrong_password_does_not_count() {
    let state = spawn_state().await;
    let student = create_student(&state, "carol", 2).await;

    for _ in 0..5 {
        let err = state
            .auth_service
            .login("carol", "wrong-password")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    let user = reload(&state, student.id).await;
    assert_eq!(user.login_count, 0);
    assert!(user.is_active);
}

#[tokio::test]
async fn administrators_are_never_counted() {
    let state = spawn_state().await;
    let admin = admin(&state).await;

    for _ in 0..5 {
        state.auth_service.login("admin", "admin123").await.unwrap();
    }

    let still_active = state.login_guard.record_login_attempt(&admin).await.unwrap();
    assert!(still_active);

    let admin = reload(&state, admin.id).await;
    assert_eq!(admin.login_count, 0);
    assert!(admin.is_active);
    assert!(!admin.disabled_by_login_limit);
}

#[tokio::test]
async fn concurrent_attempts_trip_the_limit_exactly_once() {
    let state = spawn_state().await;
    let student = create_student(&state, "dave", 2).await;

    let mut handles = Vec::new();
    for _ in 0..6 {
        let state = state.clone();
        let student = student.clone();
        handles.push(tokio::spawn(async move {
            state.login_guard.record_login_attempt(&student).await
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 2);

    let user = reload(&state, student.id).await;
    assert_eq!(user.login_count, 3);
    assert!(!user.is_active);
    assert!(user.disabled_by_login_limit);
}

#[tokio::test]
async fn reset_login_count_is_idempotent() {
    let state = spawn_state().await;
    let student = create_student(&state, "erin", 1).await;
    lock_out(&state, "erin", 1).await;

    let first = state.login_guard.reset_login_count(student.id).await.unwrap();
    let second = state.login_guard.reset_login_count(student.id).await.unwrap();

    for user in [first, second] {
        assert_eq!(user.login_count, 0);
        assert!(user.is_active);
        assert!(!user.disabled_by_login_limit);
        assert!(user.last_login_attempt.is_none());
    }

    state
        .auth_service
        .login("erin", "correct-horse")
        .await
        .expect("login after reset failed");
}

#[tokio::test]
async fn reset_login_count_for_missing_account_fails() {
    let state = spawn_state().await;

    let err = state.login_guard.reset_login_count(9999).await.unwrap_err();
    assert!(matches!(err, AccountError::NotFound(9999)));
}

#[tokio::test]
async fn admin_disabled_account_is_inactive_not_locked() {
    let state = spawn_state().await;
    let admin = admin(&state).await;
    let student = create_student(&state, "frank", 2).await;

    let disabled = state
        .account_service
        .toggle_status(&admin, student.id)
        .await
        .unwrap();
    assert!(!disabled.is_active);
    assert!(!disabled.disabled_by_login_limit);

    let err = state
        .auth_service
        .login("frank", "correct-horse")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::AccountInactive));

    let err = state
        .reactivation_service
        .submit_request("frank", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReactivationError::NotEligible));

    let enabled = state
        .account_service
        .toggle_status(&admin, student.id)
        .await
        .unwrap();
    assert!(enabled.is_active);
    assert_eq!(reload(&state, student.id).await.login_count, 0);
}

#[tokio::test]
async fn toggling_a_locked_account_clears_the_limit() {
    let state = spawn_state().await;
    let admin = admin(&state).await;
    let student = create_student(&state, "gina", 1).await;
    lock_out(&state, "gina", 1).await;

    let user = state
        .account_service
        .toggle_status(&admin, student.id)
        .await
        .unwrap();
    assert!(user.is_active);
    assert!(!user.disabled_by_login_limit);
    assert_eq!(user.login_count, 0);
}

#[tokio::test]
async fn submit_requires_a_limit_disabled_account() {
    let state = spawn_state().await;
    create_student(&state, "hank", 2).await;

    let err = state
        .reactivation_service
        .submit_request("hank", Some("please".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, ReactivationError::NotEligible));

    let err = state
        .reactivation_service
        .submit_request("nobody", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReactivationError::AccountNotFound(_)));

    let admin = admin(&state).await;
    let requests = state
        .reactivation_service
        .list_requests(&admin, None)
        .await
        .unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn only_one_pending_request_per_account() {
    let state = spawn_state().await;
    let admin = admin(&state).await;
    create_student(&state, "iris", 1).await;
    lock_out(&state, "iris", 1).await;

    let request = state
        .reactivation_service
        .submit_request("iris", Some("  I need to finish my exam  ".to_string()))
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.username, "iris");
    assert_eq!(request.message.as_deref(), Some("I need to finish my exam"));

    let err = state
        .reactivation_service
        .submit_request("iris", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReactivationError::DuplicatePending));

    let pending = state
        .reactivation_service
        .list_requests(&admin, Some(RequestStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
}

#[tokio::test]
async fn concurrent_submissions_leave_one_pending_request() {
    let state = spawn_state().await;
    let admin = admin(&state).await;
    create_student(&state, "jack", 1).await;
    lock_out(&state, "jack", 1).await;

    let (a, b) = tokio::join!(
        state.reactivation_service.submit_request("jack", None),
        state.reactivation_service.submit_request("jack", None),
    );

    let created = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(created, 1);

    let pending = state
        .reactivation_service
        .list_requests(&admin, Some(RequestStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
}

#[tokio::test]
async fn approval_reactivates_the_account() {
    let state = spawn_state().await;
    let admin = admin(&state).await;
    let student = create_student(&state, "kate", 2).await;
    lock_out(&state, "kate", 2).await;

    let request = state
        .reactivation_service
        .submit_request("kate", None)
        .await
        .unwrap();

    let processed = state
        .reactivation_service
        .approve(&admin, request.id, Some("Granted".to_string()))
        .await
        .unwrap();
    assert_eq!(processed.status, RequestStatus::Approved);
    assert_eq!(processed.processed_by, Some(admin.id));
    assert_eq!(processed.processed_by_username.as_deref(), Some("admin"));
    assert_eq!(processed.admin_response.as_deref(), Some("Granted"));
    assert!(processed.processed_at.is_some());

    let user = reload(&state, student.id).await;
    assert!(user.is_active);
    assert!(!user.disabled_by_login_limit);
    assert_eq!(user.login_count, 0);

    state
        .auth_service
        .login("kate", "correct-horse")
        .await
        .expect("login after approval failed");
}

#[tokio::test]
async fn rejection_leaves_the_account_locked() {
    let state = spawn_state().await;
    let admin = admin(&state).await;
    let student = create_student(&state, "liam", 1).await;
    lock_out(&state, "liam", 1).await;

    let request = state
        .reactivation_service
        .submit_request("liam", None)
        .await
        .unwrap();

    let processed = state
        .reactivation_service
        .reject(&admin, request.id, None)
        .await
        .unwrap();
    assert_eq!(processed.status, RequestStatus::Rejected);
    assert!(processed.admin_response.is_none());

    let user = reload(&state, student.id).await;
    assert!(!user.is_active);
    assert!(user.disabled_by_login_limit);
    assert_eq!(user.login_count, 2);

    // A rejected request does not block a new one.
    state
        .reactivation_service
        .submit_request("liam", Some("Second try".to_string()))
        .await
        .expect("resubmission after rejection failed");
}

#[tokio::test]
async fn processed_requests_cannot_be_processed_again() {
    let state = spawn_state().await;
    let admin = admin(&state).await;
    let student = create_student(&state, "mia", 1).await;
    lock_out(&state, "mia", 1).await;

    let request = state
        .reactivation_service
        .submit_request("mia", None)
        .await
        .unwrap();
    state
        .reactivation_service
        .reject(&admin, request.id, None)
        .await
        .unwrap();

    let err = state
        .reactivation_service
        .approve(&admin, request.id, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReactivationError::AlreadyProcessed(RequestStatus::Rejected)
    ));

    // The failed approval must not have touched the account.
    let user = reload(&state, student.id).await;
    assert!(user.disabled_by_login_limit);

    let err = state
        .reactivation_service
        .approve(&admin, 4242, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReactivationError::RequestNotFound(4242)));
}

#[tokio::test]
async fn students_cannot_administer() {
    let state = spawn_state().await;
    let student = create_student(&state, "noah", 2).await;
    let other = create_student(&state, "olga", 1).await;
    lock_out(&state, "olga", 1).await;

    let request = state
        .reactivation_service
        .submit_request("olga", None)
        .await
        .unwrap();

    let err = state
        .reactivation_service
        .approve(&student, request.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReactivationError::Unauthorized));

    let err = state
        .reactivation_service
        .list_requests(&student, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ReactivationError::Unauthorized));

    let err = state
        .account_service
        .reset_login_count(&student, other.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::Unauthorized));
}

#[tokio::test]
async fn listing_is_newest_first_and_filterable() {
    let state = spawn_state().await;
    let admin = admin(&state).await;
    for name in ["pia", "quinn"] {
        create_student(&state, name, 1).await;
        lock_out(&state, name, 1).await;
    }

    let first = state
        .reactivation_service
        .submit_request("pia", None)
        .await
        .unwrap();
    let second = state
        .reactivation_service
        .submit_request("quinn", None)
        .await
        .unwrap();
    state
        .reactivation_service
        .approve(&admin, first.id, None)
        .await
        .unwrap();

    let all = state
        .reactivation_service
        .list_requests(&admin, None)
        .await
        .unwrap();
    assert_eq!(
        all.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![second.id, first.id]
    );

    let approved = state
        .reactivation_service
        .list_requests(&admin, Some(RequestStatus::Approved))
        .await
        .unwrap();
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].username, "pia");
}

#[tokio::test]
async fn create_user_rejects_duplicates_and_mismatched_passwords() {
    let state = spawn_state().await;
    let admin = admin(&state).await;
    create_student(&state, "rosa", 2).await;

    let input = |username: &str, confirm: &str| CreateUserInput {
        username: username.to_string(),
        password: "correct-horse".to_string(),
        password_confirm: confirm.to_string(),
        email: None,
        first_name: String::new(),
        last_name: String::new(),
        user_type: UserType::Student,
        max_logins_allowed: None,
    };

    let err = state
        .account_service
        .create_user(&admin, input("rosa", "correct-horse"))
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::Conflict(_)));

    let err = state
        .account_service
        .create_user(&admin, input("sam", "something-else"))
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::Validation(_)));

    let user = state
        .account_service
        .create_user(&admin, input("sam", "correct-horse"))
        .await
        .unwrap();
    assert_eq!(user.max_logins_allowed, 2);
    assert_eq!(user.login_count, 0);
    assert!(user.is_active);
}

#[tokio::test]
async fn inactive_accounts_lose_their_session() {
    let state = spawn_state().await;
    let admin = admin(&state).await;
    let student = create_student(&state, "tess", 2).await;

    state.auth_service.session_user(student.id).await.unwrap();

    state
        .account_service
        .toggle_status(&admin, student.id)
        .await
        .unwrap();

    let err = state
        .auth_service
        .session_user(student.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UserNotFound));
}

#[tokio::test]
async fn end_to_end_lock_request_approve() {
    let state = spawn_state().await;
    let admin = admin(&state).await;
    let student = create_student(&state, "uma", 2).await;

    for _ in 0..2 {
        assert!(state.login_guard.record_login_attempt(&student).await.unwrap());
    }
    assert!(!state.login_guard.record_login_attempt(&student).await.unwrap());

    let request = state
        .reactivation_service
        .submit_request("uma", Some("please help".to_string()))
        .await
        .unwrap();
    state
        .reactivation_service
        .approve(&admin, request.id, Some("done".to_string()))
        .await
        .unwrap();

    let user = reload(&state, student.id).await;
    assert_eq!(user.login_count, 0);
    assert!(user.is_active);

    let user = state
        .auth_service
        .login("uma", "correct-horse")
        .await
        .unwrap();
    assert_eq!(user.login_count, 1);
}
