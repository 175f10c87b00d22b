//! Calls to the public authentication endpoints.
//!
//! Neither call carries a bearer credential, and neither is ever routed
//! through the gateway's refresh flow.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::auth::{AccessToken, LoginCredentials, LoginGrant, RefreshToken, TokenPair};
use super::envelope::{Envelope, EnvelopeFailure};
use super::error::{ApiError, messages};
use super::ports::{HttpMethod, HttpTransport, TransportRequest};
use super::responses::{decode_data, failure_message, map_transport_error};
use super::user::User;

/// Path of the login endpoint relative to the API base.
pub const LOGIN_ENDPOINT: &str = "auth/login";
/// Path of the token refresh endpoint relative to the API base.
pub const REFRESH_ENDPOINT: &str = "auth/refresh";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginPayload {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: User,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshPayload {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

/// Client for `/auth/login` and `/auth/refresh`.
#[derive(Clone)]
pub struct AuthEndpoints {
    transport: Arc<dyn HttpTransport>,
}

impl AuthEndpoints {
    /// Wrap a transport.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Exchange credentials for tokens and the user record.
    ///
    /// Every failure, including transport failures, is reported as
    /// [`ApiError::LoginFailed`] carrying the server's message when one was
    /// sent.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginGrant, ApiError> {
        let request = TransportRequest::new(HttpMethod::Post, LOGIN_ENDPOINT).with_body(json!({
            "email": credentials.email(),
            "password": credentials.password(),
        }));

        let response = match self.transport.send(&request).await {
            Ok(response) => response,
            Err(error) => {
                debug!(request_id = %request.request_id, %error, "login transport failure");
                return Err(ApiError::login_failed(messages::LOGIN_FAILED));
            }
        };

        if !response.is_success() {
            let message = failure_message(&response.body)
                .unwrap_or_else(|| messages::LOGIN_FAILED.to_owned());
            return Err(ApiError::login_failed(message));
        }

        let envelope: Envelope<LoginPayload> = serde_json::from_slice(&response.body)
            .map_err(|error| {
                debug!(request_id = %request.request_id, %error, "undecodable login response");
                ApiError::login_failed(messages::LOGIN_FAILED)
            })?;
        let has_message = !envelope.message.trim().is_empty();
        let payload = envelope.into_data().map_err(|failure| match failure {
            EnvelopeFailure::Rejected { message, .. } if has_message => {
                ApiError::login_failed(message)
            }
            _ => ApiError::login_failed(messages::LOGIN_FAILED),
        })?;

        Ok(LoginGrant {
            access_token: AccessToken::new(payload.access_token),
            refresh_token: payload.refresh_token.map(RefreshToken::new),
            user: payload.user,
        })
    }

    /// Obtain a new access token with a refresh token.
    pub async fn refresh(&self, refresh_token: &RefreshToken) -> Result<TokenPair, ApiError> {
        let body = serde_json::to_value(RefreshBody {
            refresh_token: refresh_token.expose(),
        })
        .map_err(|error| ApiError::server(None, format!("encode refresh request: {error}")))?;
        let request = TransportRequest::new(HttpMethod::Post, REFRESH_ENDPOINT).with_body(body);

        let response = self
            .transport
            .send(&request)
            .await
            .map_err(map_transport_error)?;
        let payload: RefreshPayload = decode_data(&response)?;

        Ok(TokenPair {
            access_token: AccessToken::new(payload.access_token),
            refresh_token: payload.refresh_token.map(RefreshToken::new),
        })
    }
}
