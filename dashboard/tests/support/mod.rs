//! Shared helpers for dashboard integration tests.
//!
//! [`FakeBackend`] plays the hospital API in-process: it knows a few
//! accounts, issues numbered tokens, and lets a test expire every access
//! token at once to provoke a burst of 401 responses.

#![allow(dead_code, reason = "each integration crate uses a different subset")]

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dashboard::domain::ports::{
    HttpTransport, SessionStorage, TransportError, TransportRequest, TransportResponse,
};
use dashboard::domain::{ApiGateway, AuthEndpoints, SessionStore};
use dashboard::outbound::navigation::TracingNavigator;
use serde_json::{Value, json};

struct Account {
    password: &'static str,
    user: Value,
}

#[derive(Default)]
struct Tokens {
    issued: usize,
    valid_access: BTreeSet<String>,
    valid_refresh: BTreeSet<String>,
}

/// Scripted in-process backend.
pub struct FakeBackend {
    accounts: HashMap<&'static str, Account>,
    tokens: Mutex<Tokens>,
    refresh_delay: Duration,
    issue_refresh_tokens: bool,
    refresh_calls: AtomicUsize,
    resource_calls: AtomicUsize,
    resource_bearers: Mutex<Vec<Option<String>>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    /// Backend with the seeded admin, doctor, receptionist and patient.
    pub fn new() -> Self {
        let accounts = [
            (1, "admin@hospital.com", "admin123", "System", "Admin", "ADMIN"),
            (2, "doctor@hospital.com", "doctor123", "Sarah", "Wilson", "DOCTOR"),
            (3, "reception@hospital.com", "reception123", "Mary", "Jones", "RECEPTIONIST"),
            (4, "patient@hospital.com", "patient123", "John", "Smith", "PATIENT"),
        ]
        .into_iter()
        .map(|(id, email, password, first, last, role)| {
            let user = json!({
                "id": id,
                "email": email,
                "firstName": first,
                "lastName": last,
                "role": role
            });
            (email, Account { password, user })
        })
        .collect();

        Self {
            accounts,
            tokens: Mutex::new(Tokens::default()),
            refresh_delay: Duration::from_millis(25),
            issue_refresh_tokens: true,
            refresh_calls: AtomicUsize::new(0),
            resource_calls: AtomicUsize::new(0),
            resource_bearers: Mutex::new(Vec::new()),
        }
    }

    /// Logins return no refresh token.
    #[must_use]
    pub fn without_refresh_tokens(mut self) -> Self {
        self.issue_refresh_tokens = false;
        self
    }

    /// Invalidate every access token issued so far.
    pub fn expire_access_tokens(&self) {
        self.tokens.lock().expect("tokens mutex").valid_access.clear();
    }

    /// Invalidate every refresh token issued so far.
    pub fn revoke_refresh_tokens(&self) {
        self.tokens.lock().expect("tokens mutex").valid_refresh.clear();
    }

    /// Number of `/auth/refresh` calls received.
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Number of non-auth calls received.
    pub fn resource_calls(&self) -> usize {
        self.resource_calls.load(Ordering::SeqCst)
    }

    /// Bearer tokens seen on non-auth calls, in arrival order.
    pub fn resource_bearers(&self) -> Vec<Option<String>> {
        self.resource_bearers.lock().expect("bearers mutex").clone()
    }

    fn issue(&self, with_refresh: bool) -> (String, Option<String>) {
        let mut tokens = self.tokens.lock().expect("tokens mutex");
        tokens.issued += 1;
        let access = format!("access-{}", tokens.issued);
        tokens.valid_access.insert(access.clone());
        let refresh = with_refresh.then(|| format!("refresh-{}", tokens.issued));
        if let Some(refresh) = &refresh {
            tokens.valid_refresh.insert(refresh.clone());
        }
        (access, refresh)
    }

    fn login(&self, body: &Value) -> TransportResponse {
        let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
        let password = body.get("password").and_then(Value::as_str).unwrap_or_default();
        match self.accounts.get(email) {
            Some(account) if account.password == password => {
                let (access, refresh) = self.issue(self.issue_refresh_tokens);
                respond(
                    200,
                    &json!({
                        "success": true,
                        "message": "Login successful",
                        "data": {
                            "accessToken": access,
                            "refreshToken": refresh,
                            "user": account.user
                        }
                    }),
                )
            }
            _ => respond(
                401,
                &json!({ "success": false, "message": "Invalid email or password" }),
            ),
        }
    }

    async fn refresh(&self, body: &Value) -> TransportResponse {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.refresh_delay).await;
        let presented = body
            .get("refreshToken")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let known = self
            .tokens
            .lock()
            .expect("tokens mutex")
            .valid_refresh
            .contains(presented);
        if !known {
            return respond(
                401,
                &json!({ "success": false, "message": "Invalid refresh token" }),
            );
        }
        let (access, _) = self.issue(false);
        respond(
            200,
            &json!({ "success": true, "data": { "accessToken": access } }),
        )
    }

    async fn resource(&self, request: &TransportRequest) -> TransportResponse {
        self.resource_calls.fetch_add(1, Ordering::SeqCst);
        let bearer = request.bearer.as_ref().map(|token| token.expose().to_owned());
        self.resource_bearers
            .lock()
            .expect("bearers mutex")
            .push(bearer.clone());
        tokio::task::yield_now().await;

        let valid = bearer.as_ref().is_some_and(|token| {
            self.tokens
                .lock()
                .expect("tokens mutex")
                .valid_access
                .contains(token)
        });
        if !valid {
            return respond(401, &json!({ "success": false, "message": "Token expired" }));
        }
        match request.path.as_str() {
            "admin/users/99" => respond(
                404,
                &json!({ "success": false, "message": "User not found with id: 99" }),
            ),
            path => respond(
                200,
                &json!({
                    "success": true,
                    "message": "ok",
                    "data": { "path": path, "query": request.query }
                }),
            ),
        }
    }
}

fn respond(status: u16, body: &Value) -> TransportResponse {
    TransportResponse {
        status,
        body: serde_json::to_vec(body).expect("encode response"),
    }
}

#[async_trait]
impl HttpTransport for FakeBackend {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let body = request.body.clone().unwrap_or(Value::Null);
        let response = match request.path.as_str() {
            "auth/login" => self.login(&body),
            "auth/refresh" => self.refresh(&body).await,
            _ => self.resource(request).await,
        };
        Ok(response)
    }
}

/// Everything a test needs to drive the core against [`FakeBackend`].
pub struct Client {
    /// The backend double.
    pub backend: Arc<FakeBackend>,
    /// Shared session store.
    pub session: Arc<SessionStore>,
    /// Gateway wired to the store.
    pub gateway: ApiGateway,
    /// Records redirects issued by the gateway.
    pub navigator: Arc<TracingNavigator>,
}

/// Build an initialised client over `backend` and `storage`.
pub fn client(backend: Arc<FakeBackend>, storage: Arc<dyn SessionStorage>) -> Client {
    let auth = AuthEndpoints::new(backend.clone());
    let session = Arc::new(SessionStore::new(storage, auth.clone()));
    session.initialize();
    let navigator = Arc::new(TracingNavigator::default());
    let gateway = ApiGateway::new(session.clone(), auth, backend.clone(), navigator.clone());
    Client {
        backend,
        session,
        gateway,
        navigator,
    }
}
