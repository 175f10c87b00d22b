//! Driven port for the durable key-value store backing the session.
//!
//! The session is persisted as three independent entries so a partially
//! written session is detectable on restart.

use std::fmt;

use super::define_port_error;

/// Keys under which session values are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    /// Raw access token.
    AccessToken,
    /// Raw refresh token.
    RefreshToken,
    /// User record as camelCase JSON.
    User,
}

impl StorageKey {
    /// Every key, in the order they are written.
    pub const ALL: [Self; 3] = [Self::AccessToken, Self::RefreshToken, Self::User];

    /// Storage name of the key.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccessToken => "accessToken",
            Self::RefreshToken => "refreshToken",
            Self::User => "user",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

define_port_error! {
    /// Errors raised by session storage adapters.
    pub enum SessionStorageError {
        /// Reading a key failed.
        Read { key: String, message: String } =>
            "session storage read of {key} failed: {message}",
        /// Writing a key failed.
        Write { key: String, message: String } =>
            "session storage write of {key} failed: {message}",
        /// Removing a key failed.
        Remove { key: String, message: String } =>
            "session storage removal of {key} failed: {message}",
    }
}

/// Synchronous string store keyed by [`StorageKey`].
///
/// Removing an absent key succeeds.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStorage: Send + Sync {
    /// Read a value, `None` when absent.
    fn get(&self, key: StorageKey) -> Result<Option<String>, SessionStorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: StorageKey, value: &str) -> Result<(), SessionStorageError>;

    /// Delete a value.
    fn remove(&self, key: StorageKey) -> Result<(), SessionStorageError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StorageKey::AccessToken, "accessToken")]
    #[case(StorageKey::RefreshToken, "refreshToken")]
    #[case(StorageKey::User, "user")]
    fn keys_use_browser_storage_names(#[case] key: StorageKey, #[case] expected: &str) {
        assert_eq!(key.as_str(), expected);
        assert_eq!(key.to_string(), expected);
    }

    #[rstest]
    fn errors_name_the_key() {
        let err = SessionStorageError::write(StorageKey::User.as_str(), "disk full");
        assert_eq!(err.to_string(), "session storage write of user failed: disk full");
    }
}
