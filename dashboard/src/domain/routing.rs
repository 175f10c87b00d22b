//! Role-based route authorisation.
//!
//! The authoriser decides, per navigation, whether the current session may
//! view a destination. Refusals never surface as errors: unauthenticated
//! visitors go to `/login` (remembering where they were headed) and
//! authenticated users without the required role go to their own landing
//! page.

use std::fmt;

use super::role::Role;
use super::session::AuthState;

/// Path of the login destination.
pub const LOGIN_PATH: &str = "/login";

/// Upper bound on redirect hops followed by [`RouteAuthorizer::resolve`].
const MAX_REDIRECT_HOPS: usize = 4;

/// Normalised navigation path.
///
/// ## Invariants
/// - Always starts with `/`.
/// - Never ends with `/` unless it is the root path.
/// - Query strings and fragments are stripped.
///
/// # Examples
/// ```
/// use dashboard::domain::Route;
///
/// assert_eq!(Route::new("admin/patients/").as_str(), "/admin/patients");
/// assert_eq!(Route::new("").as_str(), "/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route(String);

impl Route {
    /// Normalise a raw path into a [`Route`].
    pub fn new(path: impl AsRef<str>) -> Self {
        let raw = path.as_ref().trim();
        let without_fragment = raw.split('#').next().unwrap_or_default();
        let without_query = without_fragment.split('?').next().unwrap_or_default();
        let trimmed = without_query.trim_matches('/');
        if trimmed.is_empty() {
            Self("/".to_owned())
        } else {
            Self(format!("/{trimmed}"))
        }
    }

    /// The login destination.
    pub fn login() -> Self {
        Self::new(LOGIN_PATH)
    }

    /// Path as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Route {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access rule attached to a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccess {
    /// Only visitors without a session (the login page).
    GuestOnly,
    /// Authenticated users whose role is listed. An empty list admits any
    /// authenticated user.
    Protected(Vec<Role>),
}

impl RouteAccess {
    /// Rule admitting any authenticated user.
    pub fn authenticated() -> Self {
        Self::Protected(Vec::new())
    }

    /// Rule admitting only the given role.
    pub fn role(role: Role) -> Self {
        Self::Protected(vec![role])
    }
}

/// Outcome of an authorisation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Session initialisation is still running; show a neutral loading state.
    Loading,
    /// The destination may be rendered.
    Render(Route),
    /// Navigate elsewhere instead.
    Redirect {
        /// Where to go.
        to: Route,
        /// The originally requested destination, kept for post-login
        /// bounce-back.
        from: Option<Route>,
    },
}

/// Static table of known destinations and their access rules.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<(Route, RouteAccess)>,
}

impl RouteTable {
    /// Build an empty table; unknown paths fall back to the login page.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a destination, replacing any existing rule for it.
    #[must_use]
    pub fn with(mut self, path: &str, access: RouteAccess) -> Self {
        let route = Route::new(path);
        self.entries.retain(|(existing, _)| existing != &route);
        self.entries.push((route, access));
        self
    }

    /// The dashboard's route set: one login page and a section per role.
    pub fn standard() -> Self {
        let table = Self::new().with(LOGIN_PATH, RouteAccess::GuestOnly);
        Role::ALL.into_iter().fold(table, |table, role| {
            role.navigation().iter().fold(table, |table, entry| {
                table.with(entry.path, RouteAccess::role(role))
            })
        })
    }

    /// Look up the rule for a route.
    pub fn access(&self, route: &Route) -> Option<&RouteAccess> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == route)
            .map(|(_, access)| access)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Decides whether a session may view a destination.
///
/// # Examples
/// ```
/// use dashboard::domain::{AuthState, NavigationDecision, Route, RouteAuthorizer};
///
/// let authorizer = RouteAuthorizer::default();
/// let decision = authorizer.authorize("/admin/patients", &AuthState::Anonymous);
/// assert_eq!(
///     decision,
///     NavigationDecision::Redirect {
///         to: Route::login(),
///         from: Some(Route::new("/admin/patients")),
///     }
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteAuthorizer {
    table: RouteTable,
}

impl RouteAuthorizer {
    /// Create an authoriser over the given table.
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    /// Decide a single navigation step.
    pub fn authorize(&self, path: &str, state: &AuthState) -> NavigationDecision {
        let route = Route::new(path);
        let user = match state {
            AuthState::Initializing => return NavigationDecision::Loading,
            AuthState::Anonymous => None,
            AuthState::Authenticated(user) => Some(user),
        };

        let Some(access) = self.table.access(&route) else {
            return NavigationDecision::Redirect {
                to: Route::login(),
                from: None,
            };
        };

        match (access, user) {
            (RouteAccess::GuestOnly, None) => NavigationDecision::Render(route),
            (RouteAccess::GuestOnly, Some(user)) => NavigationDecision::Redirect {
                to: user.role().landing_route(),
                from: None,
            },
            (RouteAccess::Protected(_), None) => NavigationDecision::Redirect {
                to: Route::login(),
                from: Some(route),
            },
            (RouteAccess::Protected(roles), Some(user)) => {
                if roles.is_empty() || roles.contains(&user.role()) {
                    NavigationDecision::Render(route)
                } else {
                    NavigationDecision::Redirect {
                        to: user.role().landing_route(),
                        from: None,
                    }
                }
            }
        }
    }

    /// Follow redirects until a destination renders or loading is required.
    ///
    /// The first remembered `from` survives later hops so the login page can
    /// still bounce back to the original request.
    pub fn resolve(&self, path: &str, state: &AuthState) -> NavigationDecision {
        let mut decision = self.authorize(path, state);
        let mut remembered: Option<Route> = None;
        for _ in 0..MAX_REDIRECT_HOPS {
            let NavigationDecision::Redirect { to, from } = decision else {
                return decision;
            };
            if remembered.is_none() {
                remembered = from;
            }
            match self.authorize(to.as_str(), state) {
                NavigationDecision::Render(route) => {
                    return NavigationDecision::Redirect {
                        to: route,
                        from: remembered,
                    };
                }
                next => decision = next,
            }
        }
        decision
    }

    /// Where to send a user right after a successful login.
    pub fn post_login_destination(&self, from: Option<&Route>, role: Role) -> Route {
        from.filter(|route| route.as_str() != LOGIN_PATH)
            .cloned()
            .unwrap_or_else(|| role.landing_route())
    }
}

#[cfg(test)]
mod tests;
