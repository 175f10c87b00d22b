//! Authentication primitives: login credentials and bearer tokens.
//!
//! Keep raw form input parsing outside the session store by exposing
//! constructors that validate string inputs before anything talks to the
//! network.

use std::fmt;

use zeroize::Zeroizing;

use super::user::User;

/// Minimum password length accepted by the login form.
pub const PASSWORD_MIN_LEN: usize = 6;

/// Domain error returned when login form values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Email is not shaped like `local@domain`.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
    /// Password is shorter than [`PASSWORD_MIN_LEN`].
    PasswordTooShort {
        /// Required minimum length.
        min: usize,
    },
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "Email is required"),
            Self::InvalidEmail => write!(f, "Please enter a valid email address"),
            Self::EmptyPassword => write!(f, "Password is required"),
            Self::PasswordTooShort { min } => {
                write!(f, "Password must be at least {min} characters")
            }
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials sent to the authentication endpoint.
///
/// ## Invariants
/// - `email` is trimmed, non-empty and has exactly one `@` separating
///   non-empty local and domain parts.
/// - `password` has at least [`PASSWORD_MIN_LEN`] characters and retains
///   caller-provided whitespace.
///
/// # Examples
/// ```
/// use dashboard::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" admin@hospital.com ", "admin123").unwrap();
/// assert_eq!(creds.email(), "admin@hospital.com");
/// assert_eq!(creds.password(), "admin123");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }
        if !looks_like_email(normalized) {
            return Err(LoginValidationError::InvalidEmail);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(LoginValidationError::PasswordTooShort {
                min: PASSWORD_MIN_LEN,
            });
        }

        Ok(Self {
            email: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used as the login identifier.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

fn looks_like_email(value: &str) -> bool {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

macro_rules! define_token {
    ($(#[$outer:meta])* $name:ident) => {
        $(#[$outer])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name(Zeroizing<String>);

        impl $name {
            /// Wrap a raw token string.
            pub fn new(token: impl Into<String>) -> Self {
                Self(Zeroizing::new(token.into()))
            }

            /// Raw token value.
            pub fn expose(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(concat!(stringify!($name), "(<redacted>)"))
            }
        }
    };
}

define_token! {
    /// Short-lived credential authorising API requests.
    AccessToken
}

define_token! {
    /// Longer-lived credential used solely to obtain a new access token.
    RefreshToken
}

impl AccessToken {
    /// `Authorization` header value for this token.
    ///
    /// # Examples
    /// ```
    /// use dashboard::domain::AccessToken;
    ///
    /// assert_eq!(AccessToken::new("abc").bearer(), "Bearer abc");
    /// ```
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.expose())
    }
}

/// Tokens returned by the refresh endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Replacement access token.
    pub access_token: AccessToken,
    /// Replacement refresh token, when the server rotates it.
    pub refresh_token: Option<RefreshToken>,
}

/// Everything the login endpoint issues on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGrant {
    /// Access token for subsequent requests.
    pub access_token: AccessToken,
    /// Refresh token, when issued.
    pub refresh_token: Option<RefreshToken>,
    /// The authenticated user.
    pub user: User,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "secret1", LoginValidationError::EmptyEmail)]
    #[case("   ", "secret1", LoginValidationError::EmptyEmail)]
    #[case("not-an-email", "secret1", LoginValidationError::InvalidEmail)]
    #[case("a@@b.com", "secret1", LoginValidationError::InvalidEmail)]
    #[case("@hospital.com", "secret1", LoginValidationError::InvalidEmail)]
    #[case("a b@hospital.com", "secret1", LoginValidationError::InvalidEmail)]
    #[case("doc@hospital.com", "", LoginValidationError::EmptyPassword)]
    #[case(
        "doc@hospital.com",
        "short",
        LoginValidationError::PasswordTooShort { min: PASSWORD_MIN_LEN }
    )]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case("  admin@hospital.com  ", "admin123")]
    #[case("patient@hospital.com", " spaced password ")]
    fn valid_credentials_trim_email(#[case] email: &str, #[case] password: &str) {
        let creds = LoginCredentials::try_from_parts(email, password)
            .expect("valid inputs should succeed");
        assert_eq!(creds.email(), email.trim());
        assert_eq!(creds.password(), password);
    }

    #[rstest]
    fn token_debug_output_is_redacted() {
        let token = AccessToken::new("super-secret");
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("super-secret"));
        assert_eq!(rendered, "AccessToken(<redacted>)");
    }
}
