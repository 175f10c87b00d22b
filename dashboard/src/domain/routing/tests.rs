//! Unit tests for route normalisation and authorisation decisions.

use rstest::{fixture, rstest};

use super::*;
use crate::domain::{User, UserId};

fn signed_in(role: Role) -> AuthState {
    AuthState::Authenticated(User::new(
        UserId::new(9),
        "someone@hospital.com",
        "Some",
        "One",
        role,
    ))
}

#[fixture]
fn authorizer() -> RouteAuthorizer {
    RouteAuthorizer::default()
}

#[rstest]
#[case("/admin", "/admin")]
#[case("admin/patients/", "/admin/patients")]
#[case("/doctor/schedule?week=3#today", "/doctor/schedule")]
#[case("  /patient  ", "/patient")]
#[case("///", "/")]
fn routes_are_normalised(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(Route::new(raw).as_str(), expected);
}

#[rstest]
#[case(Role::Admin)]
#[case(Role::Doctor)]
#[case(Role::Receptionist)]
#[case(Role::Patient)]
fn initializing_sessions_show_loading(authorizer: RouteAuthorizer, #[case] role: Role) {
    let path = role.landing_route();
    assert_eq!(
        authorizer.authorize(path.as_str(), &AuthState::Initializing),
        NavigationDecision::Loading
    );
}

#[rstest]
#[case("/admin/patients")]
#[case("/doctor")]
#[case("/receptionist/checkin")]
#[case("/patient/book")]
fn anonymous_visitors_are_sent_to_login_with_origin(
    authorizer: RouteAuthorizer,
    #[case] path: &str,
) {
    assert_eq!(
        authorizer.authorize(path, &AuthState::Anonymous),
        NavigationDecision::Redirect {
            to: Route::login(),
            from: Some(Route::new(path)),
        }
    );
}

#[rstest]
fn login_page_renders_for_anonymous_visitors(authorizer: RouteAuthorizer) {
    assert_eq!(
        authorizer.authorize("/login", &AuthState::Anonymous),
        NavigationDecision::Render(Route::login())
    );
}

#[rstest]
#[case(Role::Doctor, "/admin", "/doctor")]
#[case(Role::Patient, "/doctor/patients", "/patient")]
#[case(Role::Receptionist, "/admin/settings", "/receptionist")]
#[case(Role::Admin, "/patient/records", "/admin")]
fn wrong_role_goes_to_own_landing(
    authorizer: RouteAuthorizer,
    #[case] role: Role,
    #[case] path: &str,
    #[case] landing: &str,
) {
    assert_eq!(
        authorizer.authorize(path, &signed_in(role)),
        NavigationDecision::Redirect {
            to: Route::new(landing),
            from: None,
        }
    );
}

#[rstest]
fn every_menu_entry_renders_for_its_role(authorizer: RouteAuthorizer) {
    for role in Role::ALL {
        for item in role.navigation() {
            assert_eq!(
                authorizer.authorize(item.path, &signed_in(role)),
                NavigationDecision::Render(Route::new(item.path)),
                "{role} should reach {}",
                item.path
            );
        }
    }
}

#[rstest]
#[case(Role::Patient, "/patient")]
#[case(Role::Admin, "/admin")]
fn signed_in_users_skip_the_login_page(
    authorizer: RouteAuthorizer,
    #[case] role: Role,
    #[case] landing: &str,
) {
    assert_eq!(
        authorizer.authorize("/login", &signed_in(role)),
        NavigationDecision::Redirect {
            to: Route::new(landing),
            from: None,
        }
    );
}

#[rstest]
#[case("/")]
#[case("/unknown/page")]
fn unknown_paths_fall_back_to_login(authorizer: RouteAuthorizer, #[case] path: &str) {
    assert_eq!(
        authorizer.authorize(path, &AuthState::Anonymous),
        NavigationDecision::Redirect {
            to: Route::login(),
            from: None,
        }
    );
}

#[rstest]
fn resolve_follows_root_to_landing_for_signed_in_users(authorizer: RouteAuthorizer) {
    assert_eq!(
        authorizer.resolve("/", &signed_in(Role::Doctor)),
        NavigationDecision::Redirect {
            to: Route::new("/doctor"),
            from: None,
        }
    );
}

#[rstest]
fn resolve_keeps_the_original_destination(authorizer: RouteAuthorizer) {
    assert_eq!(
        authorizer.resolve("/admin/reports", &AuthState::Anonymous),
        NavigationDecision::Redirect {
            to: Route::login(),
            from: Some(Route::new("/admin/reports")),
        }
    );
}

#[rstest]
fn resolve_returns_renders_unchanged(authorizer: RouteAuthorizer) {
    assert_eq!(
        authorizer.resolve("/patient/profile", &signed_in(Role::Patient)),
        NavigationDecision::Render(Route::new("/patient/profile"))
    );
}

#[rstest]
#[case(Some("/doctor/schedule"), Role::Doctor, "/doctor/schedule")]
#[case(None, Role::Receptionist, "/receptionist")]
#[case(Some("/login"), Role::Patient, "/patient")]
fn post_login_destination_prefers_remembered_route(
    authorizer: RouteAuthorizer,
    #[case] from: Option<&str>,
    #[case] role: Role,
    #[case] expected: &str,
) {
    let from = from.map(Route::new);
    assert_eq!(
        authorizer.post_login_destination(from.as_ref(), role),
        Route::new(expected)
    );
}

#[rstest]
fn custom_tables_admit_any_authenticated_user() {
    let table = RouteTable::new()
        .with("/login", RouteAccess::GuestOnly)
        .with("/help", RouteAccess::authenticated());
    let authorizer = RouteAuthorizer::new(table);
    for role in Role::ALL {
        assert_eq!(
            authorizer.authorize("/help", &signed_in(role)),
            NavigationDecision::Render(Route::new("/help"))
        );
    }
}
