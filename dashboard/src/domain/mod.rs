//! Domain primitives and services.
//!
//! Purpose: hold every rule about sessions, token refresh and route access
//! independently of HTTP clients and storage media. Adapters reach the
//! domain only through [`ports`].
//!
//! Public surface:
//! - `SessionStore`: current session, login/logout and persistence.
//! - `ApiGateway`: authorised requests with single-flight token refresh.
//! - `RouteAuthorizer`: role-based navigation decisions.
//! - `ApiError`: final classification of failed calls.

pub mod auth;
pub mod auth_endpoints;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod pagination;
pub mod ports;
mod responses;
pub mod role;
pub mod routing;
pub mod session;
pub mod session_store;
pub mod user;

pub use self::auth::{
    AccessToken, LoginCredentials, LoginGrant, LoginValidationError, PASSWORD_MIN_LEN,
    RefreshToken, TokenPair,
};
pub use self::auth_endpoints::AuthEndpoints;
pub use self::envelope::{Envelope, EnvelopeFailure, FieldError};
pub use self::error::{ApiError, SessionError, messages};
pub use self::gateway::{ApiGateway, ApiRequest, ApiResponse};
pub use self::pagination::{PageQuery, SortDirection};
pub use self::role::{NavItem, Role, UnknownRoleError};
pub use self::routing::{
    LOGIN_PATH, NavigationDecision, Route, RouteAccess, RouteAuthorizer, RouteTable,
};
pub use self::session::{ActiveSession, AuthState};
pub use self::session_store::{LoginSuccess, SessionGeneration, SessionStore};
pub use self::user::{User, UserId, UserPatch};
