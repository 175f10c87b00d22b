//! In-memory session model.

use super::auth::{AccessToken, RefreshToken};
use super::role::Role;
use super::user::User;

/// An authenticated session.
///
/// Owning both the access token and the user makes "token without user" and
/// "user without token" unrepresentable; only the refresh token is optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    access_token: AccessToken,
    refresh_token: Option<RefreshToken>,
    user: User,
}

impl ActiveSession {
    /// Assemble a session from its parts.
    pub fn new(access_token: AccessToken, refresh_token: Option<RefreshToken>, user: User) -> Self {
        Self {
            access_token,
            refresh_token,
            user,
        }
    }

    /// Current access token.
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Current refresh token, if one was issued.
    pub fn refresh_token(&self) -> Option<&RefreshToken> {
        self.refresh_token.as_ref()
    }

    /// Logged-in user.
    pub fn user(&self) -> &User {
        &self.user
    }

    /// Role of the logged-in user.
    pub fn role(&self) -> Role {
        self.user.role()
    }

    pub(crate) fn set_access_token(&mut self, token: AccessToken) {
        self.access_token = token;
    }

    pub(crate) fn set_refresh_token(&mut self, token: RefreshToken) {
        self.refresh_token = Some(token);
    }

    pub(crate) fn set_user(&mut self, user: User) {
        self.user = user;
    }
}

/// Authentication status as seen by the route authoriser and views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Persisted state has not been read yet.
    Initializing,
    /// No session.
    Anonymous,
    /// A user is logged in.
    Authenticated(User),
}

impl AuthState {
    /// The logged-in user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Initializing | Self::Anonymous => None,
        }
    }

    /// True once persisted state has been read and a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}
