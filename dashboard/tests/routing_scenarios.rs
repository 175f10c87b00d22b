//! End-to-end navigation scenarios across login and role changes.

use std::sync::Arc;

use dashboard::domain::{AuthState, NavigationDecision, Route, RouteAuthorizer};
use dashboard::outbound::storage::InMemorySessionStorage;
use rstest::{fixture, rstest};

mod support;

use support::{FakeBackend, client};

#[fixture]
fn authorizer() -> RouteAuthorizer {
    RouteAuthorizer::default()
}

async fn signed_in_as(email: &str, password: &str) -> AuthState {
    let client = client(
        Arc::new(FakeBackend::new()),
        Arc::new(InMemorySessionStorage::default()),
    );
    client
        .session
        .login(email, password)
        .await
        .expect("login succeeds");
    client.session.auth_state()
}

#[rstest]
#[tokio::test]
async fn doctor_opening_admin_lands_on_doctor_dashboard(authorizer: RouteAuthorizer) {
    let state = signed_in_as("doctor@hospital.com", "doctor123").await;
    assert_eq!(
        authorizer.authorize("/admin", &state),
        NavigationDecision::Redirect {
            to: Route::new("/doctor"),
            from: None,
        }
    );
}

#[rstest]
#[tokio::test]
async fn patient_opening_login_lands_on_patient_dashboard(authorizer: RouteAuthorizer) {
    let state = signed_in_as("patient@hospital.com", "patient123").await;
    assert_eq!(
        authorizer.resolve("/login", &state),
        NavigationDecision::Redirect {
            to: Route::new("/patient"),
            from: None,
        }
    );
}

#[rstest]
#[tokio::test]
async fn anonymous_deep_link_returns_there_after_login(authorizer: RouteAuthorizer) {
    let client = client(
        Arc::new(FakeBackend::new()),
        Arc::new(InMemorySessionStorage::default()),
    );

    let decision = authorizer.authorize("/admin/patients", &client.session.auth_state());
    let NavigationDecision::Redirect { to, from } = decision else {
        panic!("anonymous visitors must be redirected");
    };
    assert_eq!(to, Route::login());
    assert_eq!(from, Some(Route::new("/admin/patients")));

    let success = client
        .session
        .login("admin@hospital.com", "admin123")
        .await
        .expect("login succeeds");
    let destination = authorizer.post_login_destination(from.as_ref(), success.role);
    assert_eq!(destination, Route::new("/admin/patients"));
    assert_eq!(
        authorizer.authorize(destination.as_str(), &client.session.auth_state()),
        NavigationDecision::Render(destination.clone())
    );
}

#[rstest]
#[tokio::test]
async fn logging_out_locks_protected_pages_again(authorizer: RouteAuthorizer) {
    let client = client(
        Arc::new(FakeBackend::new()),
        Arc::new(InMemorySessionStorage::default()),
    );
    client
        .session
        .login("reception@hospital.com", "reception123")
        .await
        .expect("login succeeds");
    assert_eq!(
        authorizer.authorize("/receptionist/register", &client.session.auth_state()),
        NavigationDecision::Render(Route::new("/receptionist/register"))
    );

    client.session.logout();

    assert_eq!(
        authorizer.authorize("/receptionist/register", &client.session.auth_state()),
        NavigationDecision::Redirect {
            to: Route::login(),
            from: Some(Route::new("/receptionist/register")),
        }
    );
}
