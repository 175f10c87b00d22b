//! Behavioural coverage for login, restart rehydration and logout.

use std::sync::Arc;

use dashboard::domain::ports::{SessionStorage, StorageKey};
use dashboard::domain::{ApiError, AuthState, Role, UserPatch};
use dashboard::outbound::storage::FileSessionStorage;
use rstest::{fixture, rstest};
use serde_json::Value;
use tempfile::TempDir;

mod support;

use support::{FakeBackend, client};

#[fixture]
fn session_dir() -> TempDir {
    TempDir::new().expect("create session dir")
}

fn file_storage(dir: &TempDir) -> Arc<FileSessionStorage> {
    Arc::new(FileSessionStorage::open(dir.path()).expect("open session storage"))
}

#[rstest]
#[tokio::test]
async fn login_survives_a_restart(session_dir: TempDir) {
    let backend = Arc::new(FakeBackend::new());

    let first = client(backend.clone(), file_storage(&session_dir));
    let success = first
        .session
        .login("reception@hospital.com", "reception123")
        .await
        .expect("login succeeds");
    assert_eq!(success.role, Role::Receptionist);
    drop(first);

    let restarted = client(backend.clone(), file_storage(&session_dir));
    match restarted.session.auth_state() {
        AuthState::Authenticated(user) => {
            assert_eq!(user, success.user);
            assert_eq!(user.full_name(), "Mary Jones");
        }
        other => panic!("expected restored session, got {other:?}"),
    }

    let data: Value = restarted
        .gateway
        .get("receptionist/appointments")
        .await
        .expect("restored token is accepted");
    assert_eq!(data["path"], "receptionist/appointments");
    assert_eq!(backend.refresh_calls(), 0);
}

#[rstest]
#[tokio::test]
async fn restored_expired_session_recovers_on_first_call(session_dir: TempDir) {
    let backend = Arc::new(FakeBackend::new());
    let first = client(backend.clone(), file_storage(&session_dir));
    first
        .session
        .login("patient@hospital.com", "patient123")
        .await
        .expect("login succeeds");
    drop(first);
    backend.expire_access_tokens();

    let restarted = client(backend.clone(), file_storage(&session_dir));
    let data: Value = restarted
        .gateway
        .get("patient/appointments")
        .await
        .expect("refresh recovers");

    assert_eq!(data["path"], "patient/appointments");
    assert_eq!(backend.refresh_calls(), 1);
    let persisted = file_storage(&session_dir)
        .get(StorageKey::AccessToken)
        .expect("read token");
    assert_eq!(
        persisted,
        restarted
            .session
            .access_token()
            .map(|token| token.expose().to_owned())
    );
}

#[rstest]
#[tokio::test]
async fn logout_is_idempotent_and_clears_disk(session_dir: TempDir) {
    let backend = Arc::new(FakeBackend::new());
    let storage = file_storage(&session_dir);
    let client = client(backend, storage.clone());
    client
        .session
        .login("admin@hospital.com", "admin123")
        .await
        .expect("login succeeds");

    client.session.logout();
    client.session.logout();

    assert_eq!(client.session.auth_state(), AuthState::Anonymous);
    for key in StorageKey::ALL {
        assert_eq!(storage.get(key).expect("read key"), None, "{key} removed");
    }
}

#[rstest]
#[tokio::test]
async fn wrong_password_reports_server_message(session_dir: TempDir) {
    let client = client(Arc::new(FakeBackend::new()), file_storage(&session_dir));

    let error = client
        .session
        .login("admin@hospital.com", "not-the-password")
        .await
        .expect_err("login fails");

    assert_eq!(error, ApiError::login_failed("Invalid email or password"));
    assert_eq!(client.session.auth_state(), AuthState::Anonymous);
}

#[rstest]
#[tokio::test]
async fn profile_updates_are_persisted(session_dir: TempDir) {
    let backend = Arc::new(FakeBackend::new());
    let first = client(backend.clone(), file_storage(&session_dir));
    first
        .session
        .login("doctor@hospital.com", "doctor123")
        .await
        .expect("login succeeds");
    first
        .session
        .update_user(&UserPatch {
            last_name: Some("Grey".to_owned()),
            ..UserPatch::default()
        })
        .expect("session active");
    drop(first);

    let restarted = client(backend, file_storage(&session_dir));
    let user = restarted.session.current_user().expect("session restored");
    assert_eq!(user.full_name(), "Sarah Grey");
}
