//! Authorised request gateway.
//!
//! Every API call except login and refresh goes through [`ApiGateway`]. The
//! gateway attaches the current bearer token, classifies failures into
//! [`ApiError`], and recovers from an expired access token with exactly one
//! refresh no matter how many requests hit 401 at the same time.
//!
//! ## Refresh protocol
//! - The refresh state is `Idle` or `Refreshing { waiters }`, guarded by a
//!   synchronous mutex that is never held across an `.await`.
//! - The first request to see 401 while `Idle` becomes the leader and performs
//!   the refresh; requests seeing 401 while `Refreshing` park on a oneshot
//!   channel and receive the leader's outcome.
//! - A request whose 401 arrives after another request already rotated the
//!   token retries with the current token without refreshing again.
//! - A refresh only writes into the session it started from. If a logout or
//!   another login replaced that session meanwhile, the outcome is discarded.
//! - Each request is retried at most once. A second 401 is final.
//!
//! Lock order is refresh state first, then the session store.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use super::auth::AccessToken;
use super::auth_endpoints::AuthEndpoints;
use super::error::{ApiError, SessionError};
use super::pagination::PageQuery;
use super::ports::{HttpMethod, HttpTransport, Navigator, TransportRequest, TransportResponse};
use super::responses::{decode_data, map_status_error, map_transport_error};
use super::routing::Route;
use super::session_store::{SessionGeneration, SessionStore};

type RefreshOutcome = Result<AccessToken, ApiError>;

const UNAUTHORIZED_STATUS: u16 = 401;

/// A request issued through the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Verb.
    pub method: HttpMethod,
    /// Path relative to the API base URL.
    pub path: String,
    /// Query pairs.
    pub query: Vec<(String, String)>,
    /// JSON body.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Request without query or body.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// `GET path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// `DELETE path`.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Append paging and filter parameters.
    #[must_use]
    pub fn with_page(mut self, page: &PageQuery) -> Self {
        self.query.extend(page.to_pairs());
        self
    }

    /// Append one query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    fn to_transport(&self, request_id: Uuid, bearer: Option<AccessToken>) -> TransportRequest {
        let mut request = TransportRequest::new(self.method, &self.path);
        request.request_id = request_id;
        request.query.clone_from(&self.query);
        request.bearer = bearer;
        request.body.clone_from(&self.body);
        request
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    inner: TransportResponse,
}

impl ApiResponse {
    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.inner.status
    }

    /// Raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.inner.body
    }

    /// Decode the envelope and return its `data`.
    pub fn data<T>(&self) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        decode_data(&self.inner)
    }
}

enum RefreshState {
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    },
}

enum Recovery {
    Lead,
    Wait(oneshot::Receiver<RefreshOutcome>),
    Retry(AccessToken),
    SessionEnded,
}

/// Resets the refresh state if the leading request is dropped mid-refresh.
///
/// Dropping the parked senders wakes every waiter with a closed channel.
struct LeaderGuard<'a> {
    state: &'a Mutex<RefreshState>,
    armed: bool,
}

impl LeaderGuard<'_> {
    fn finish(mut self) -> Vec<oneshot::Sender<RefreshOutcome>> {
        self.armed = false;
        take_waiters(self.state)
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let abandoned = take_waiters(self.state);
            debug!(waiters = abandoned.len(), "token refresh abandoned");
        }
    }
}

fn take_waiters(state: &Mutex<RefreshState>) -> Vec<oneshot::Sender<RefreshOutcome>> {
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    match std::mem::replace(&mut *state, RefreshState::Idle) {
        RefreshState::Refreshing { waiters } => waiters,
        RefreshState::Idle => Vec::new(),
    }
}

/// Executes authorised API calls with transparent token refresh.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
///
/// use dashboard::domain::{ApiGateway, AuthEndpoints, PageQuery, SessionStore};
/// use dashboard::outbound::http::ReqwestTransport;
/// use dashboard::outbound::navigation::TracingNavigator;
/// use dashboard::outbound::storage::InMemorySessionStorage;
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = Arc::new(ReqwestTransport::new(
///     "http://localhost:8080/api/v1".parse()?,
///     std::time::Duration::from_secs(15),
/// )?);
/// let auth = AuthEndpoints::new(transport.clone());
/// let session = Arc::new(SessionStore::new(
///     Arc::new(InMemorySessionStorage::default()),
///     auth.clone(),
/// ));
/// session.initialize();
/// let gateway = ApiGateway::new(session, auth, transport, Arc::new(TracingNavigator::default()));
/// let patients: serde_json::Value = gateway.get_page("patients", &PageQuery::new()).await?;
/// # drop(patients);
/// # Ok(())
/// # }
/// ```
pub struct ApiGateway {
    session: Arc<SessionStore>,
    auth: AuthEndpoints,
    transport: Arc<dyn HttpTransport>,
    navigator: Arc<dyn Navigator>,
    refresh: Mutex<RefreshState>,
}

impl ApiGateway {
    /// Wire a gateway over the shared session store.
    pub fn new(
        session: Arc<SessionStore>,
        auth: AuthEndpoints,
        transport: Arc<dyn HttpTransport>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            session,
            auth,
            transport,
            navigator,
            refresh: Mutex::new(RefreshState::Idle),
        }
    }

    /// Session store the gateway authenticates with.
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Execute `request` and return the raw successful response.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "api_request",
            %request_id,
            method = %request.method,
            path = %request.path,
        );
        self.execute_once_retried(&request, request_id)
            .instrument(span)
            .await
    }

    /// Execute `request` and decode the envelope's `data`.
    pub async fn send_json<T>(&self, request: ApiRequest) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.execute(request).await?.data()
    }

    /// `GET path`, decoding `data`.
    pub async fn get<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::get(path)).await
    }

    /// `GET path` with paging parameters, decoding `data`.
    pub async fn get_page<T>(&self, path: &str, page: &PageQuery) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::get(path).with_page(page)).await
    }

    /// `POST path` with a JSON body, decoding `data`.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(HttpMethod::Post, path, body).await
    }

    /// `PUT path` with a JSON body, decoding `data`.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(HttpMethod::Put, path, body).await
    }

    /// `PATCH path` with a JSON body, decoding `data`.
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(HttpMethod::Patch, path, body).await
    }

    /// `DELETE path`, decoding `data` (use `()` when none is returned).
    pub async fn delete<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.send_json(ApiRequest::delete(path)).await
    }

    async fn send_with_body<T, B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body).map_err(|error| {
            ApiError::validation(format!("request body could not be encoded: {error}"))
        })?;
        self.send_json(ApiRequest::new(method, path).with_body(body))
            .await
    }

    async fn execute_once_retried(
        &self,
        request: &ApiRequest,
        request_id: Uuid,
    ) -> Result<ApiResponse, ApiError> {
        let sent_token = self.session.access_token();
        let first = self.send(request, request_id, sent_token.clone()).await?;
        if first.status != UNAUTHORIZED_STATUS {
            return classify(first);
        }

        debug!("access token rejected; recovering");
        let token = self.recover(sent_token.as_ref()).await?;
        let retried = self.send(request, request_id, Some(token)).await?;
        if retried.status == UNAUTHORIZED_STATUS {
            warn!("request rejected again after token refresh");
            return Err(ApiError::authentication_expired(
                "request rejected again after token refresh",
            ));
        }
        classify(retried)
    }

    async fn send(
        &self,
        request: &ApiRequest,
        request_id: Uuid,
        bearer: Option<AccessToken>,
    ) -> Result<TransportResponse, ApiError> {
        let transport_request = request.to_transport(request_id, bearer);
        self.transport
            .send(&transport_request)
            .await
            .map_err(map_transport_error)
    }

    fn lock_refresh(&self) -> MutexGuard<'_, RefreshState> {
        self.refresh.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Obtain a token worth retrying with after a 401.
    async fn recover(&self, sent: Option<&AccessToken>) -> RefreshOutcome {
        let recovery = {
            let mut state = self.lock_refresh();
            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    let (sender, receiver) = oneshot::channel();
                    waiters.push(sender);
                    Recovery::Wait(receiver)
                }
                RefreshState::Idle => match (self.session.access_token(), sent) {
                    (Some(current), Some(sent)) if &current != sent => Recovery::Retry(current),
                    (Some(current), None) => Recovery::Retry(current),
                    (None, Some(_)) => Recovery::SessionEnded,
                    _ => {
                        *state = RefreshState::Refreshing {
                            waiters: Vec::new(),
                        };
                        Recovery::Lead
                    }
                },
            }
        };

        match recovery {
            Recovery::Retry(token) => {
                debug!("token already rotated; retrying without refresh");
                Ok(token)
            }
            Recovery::SessionEnded => Err(ApiError::authentication_expired(
                "session ended before the request could be retried",
            )),
            Recovery::Wait(receiver) => {
                debug!("waiting for in-flight token refresh");
                receiver.await.unwrap_or_else(|_| {
                    Err(ApiError::authentication_expired("token refresh was abandoned"))
                })
            }
            Recovery::Lead => self.lead_refresh().await,
        }
    }

    async fn lead_refresh(&self) -> RefreshOutcome {
        let guard = LeaderGuard {
            state: &self.refresh,
            armed: true,
        };
        let outcome = self.refresh_session().await;
        let waiters = guard.finish();
        debug!(waiters = waiters.len(), "broadcasting token refresh outcome");
        for waiter in waiters {
            drop(waiter.send(outcome.clone()));
        }
        outcome
    }

    async fn refresh_session(&self) -> RefreshOutcome {
        let (generation, refresh_token) = self.session.refresh_credentials();
        let Some(refresh_token) = refresh_token else {
            warn!("no refresh token available; forcing logout");
            self.force_logout(generation);
            return Err(ApiError::authentication_expired(
                "no refresh token available",
            ));
        };

        match self.auth.refresh(&refresh_token).await {
            Ok(tokens) => match self.session.rotate_tokens(generation, tokens) {
                Ok(token) => {
                    info!("access token refreshed");
                    Ok(token)
                }
                Err(SessionError::NotAuthenticated) => Err(ApiError::authentication_expired(
                    "session ended during token refresh",
                )),
                Err(SessionError::Superseded) => Err(ApiError::authentication_expired(
                    "session was replaced during token refresh",
                )),
            },
            Err(error) => {
                warn!(%error, "token refresh failed; forcing logout");
                self.force_logout(generation);
                Err(ApiError::authentication_expired(format!(
                    "token refresh failed: {error}"
                )))
            }
        }
    }

    fn force_logout(&self, generation: SessionGeneration) {
        if self.session.expire(generation) {
            self.navigator.navigate(&Route::login());
        }
    }
}

fn classify(response: TransportResponse) -> Result<ApiResponse, ApiError> {
    if response.is_success() {
        Ok(ApiResponse { inner: response })
    } else {
        Err(map_status_error(&response))
    }
}
