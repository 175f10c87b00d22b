//! Error taxonomy for authorised API calls.
//!
//! These errors are transport agnostic: the gateway classifies every final
//! failure into exactly one variant, and views pick between the technical
//! `Display` text and [`ApiError::user_message`].

/// User-facing copy for each failure category.
pub mod messages {
    /// No response was received.
    pub const NETWORK_ERROR: &str = "Network error - please check your connection";
    /// Generic server failure.
    pub const SERVER_ERROR: &str = "Server error occurred. Please try again later.";
    /// Session expired and could not be refreshed.
    pub const UNAUTHORIZED: &str = "Your session has expired. Please login again.";
    /// Authenticated but not permitted.
    pub const FORBIDDEN: &str = "You do not have permission to perform this action.";
    /// Missing resource.
    pub const NOT_FOUND: &str = "The requested resource was not found.";
    /// Request rejected by validation.
    pub const VALIDATION_ERROR: &str = "Please check your input and try again.";
    /// Login failed without a server-provided reason.
    pub const LOGIN_FAILED: &str = "Login failed. Please try again.";
}

/// Final classification of a failed API call.
///
/// # Examples
/// ```
/// use dashboard::domain::ApiError;
///
/// let err = ApiError::forbidden("role DOCTOR may not delete patients");
/// assert_eq!(
///     err.user_message(),
///     "You do not have permission to perform this action."
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// 400: the backend rejected the payload; field messages are folded into
    /// `message`.
    #[error("validation failed: {message}")]
    Validation {
        /// Display string including field-level messages.
        message: String,
    },
    /// 401 that could not be recovered by a token refresh.
    #[error("authentication expired: {message}")]
    AuthenticationExpired {
        /// Diagnostic detail.
        message: String,
    },
    /// 403.
    #[error("forbidden: {message}")]
    Forbidden {
        /// Diagnostic detail.
        message: String,
    },
    /// 404.
    #[error("not found: {message}")]
    NotFound {
        /// Diagnostic detail.
        message: String,
    },
    /// 5xx, an unrecognised status, or an undecodable payload.
    #[error("server error{}: {message}", status_suffix(.status))]
    Server {
        /// HTTP status when one was received.
        status: Option<u16>,
        /// Diagnostic detail.
        message: String,
    },
    /// No response was received, including the fixed request timeout.
    #[error("network error: {message}")]
    Network {
        /// Diagnostic detail.
        message: String,
    },
    /// The login endpoint refused the credentials.
    #[error("login failed: {message}")]
    LoginFailed {
        /// Server message, or the generic fallback.
        message: String,
    },
}

impl ApiError {
    /// Build [`ApiError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Build [`ApiError::AuthenticationExpired`].
    pub fn authentication_expired(message: impl Into<String>) -> Self {
        Self::AuthenticationExpired {
            message: message.into(),
        }
    }

    /// Build [`ApiError::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Build [`ApiError::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Build [`ApiError::Server`].
    pub fn server(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Build [`ApiError::Network`].
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Build [`ApiError::LoginFailed`].
    pub fn login_failed(message: impl Into<String>) -> Self {
        Self::LoginFailed {
            message: message.into(),
        }
    }

    /// Text suitable for inline display in a view.
    ///
    /// Validation, server and login failures carry the backend's own message
    /// when it sent one; other categories use fixed copy.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Validation { message } => non_blank_or(message, messages::VALIDATION_ERROR),
            Self::AuthenticationExpired { .. } => messages::UNAUTHORIZED,
            Self::Forbidden { .. } => messages::FORBIDDEN,
            Self::NotFound { .. } => messages::NOT_FOUND,
            Self::Server { message, .. } => non_blank_or(message, messages::SERVER_ERROR),
            Self::Network { .. } => messages::NETWORK_ERROR,
            Self::LoginFailed { message } => non_blank_or(message, messages::LOGIN_FAILED),
        }
    }

    /// True for the unrecoverable-session category.
    pub fn is_authentication_expired(&self) -> bool {
        matches!(self, Self::AuthenticationExpired { .. })
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" (status {code})"))
        .unwrap_or_default()
}

fn non_blank_or<'a>(message: &'a str, fallback: &'a str) -> &'a str {
    if message.trim().is_empty() {
        fallback
    } else {
        message
    }
}

/// Errors raised by session operations that need an active session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No user is logged in.
    #[error("no authenticated session")]
    NotAuthenticated,
    /// A logout or a new login replaced the session the operation began with.
    #[error("session was replaced while the operation was in flight")]
    Superseded,
}
