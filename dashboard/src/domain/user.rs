//! User record held by the session.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::role::Role;

/// Stable backend identifier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw backend identifier.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw numeric value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authenticated dashboard user as issued by the login endpoint.
///
/// The record is persisted verbatim (camelCase JSON) next to the tokens so a
/// restarted process can rebuild the session without a server round-trip.
///
/// # Examples
/// ```
/// use dashboard::domain::{Role, User, UserId};
///
/// let user = User::new(UserId::new(7), "ada@hospital.com", "Ada", "Lovelace", Role::Doctor);
/// assert_eq!(user.full_name(), "Ada Lovelace");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    email: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    role: Role,
}

impl User {
    /// Build a user from its parts.
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            role,
        }
    }

    /// Backend identifier.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Login email.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Given name.
    pub fn first_name(&self) -> &str {
        self.first_name.as_str()
    }

    /// Family name.
    pub fn last_name(&self) -> &str {
        self.last_name.as_str()
    }

    /// Role driving route authorisation.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Given and family name joined by a space, skipping blanks.
    pub fn full_name(&self) -> String {
        [self.first_name.trim(), self.last_name.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Merge the set fields of `patch` into this user.
    #[must_use]
    pub fn merged(mut self, patch: &UserPatch) -> Self {
        if let Some(email) = &patch.email {
            self.email.clone_from(email);
        }
        if let Some(first_name) = &patch.first_name {
            self.first_name.clone_from(first_name);
        }
        if let Some(last_name) = &patch.last_name {
            self.last_name.clone_from(last_name);
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        self
    }
}

/// Partial update applied to the session's user, typically after a profile
/// save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    /// Replacement email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Replacement given name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Replacement family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Replacement role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UserPatch {
    /// True when the patch sets no field.
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.role.is_none()
    }
}
