//! Session store: the single authority for "who is logged in".
//!
//! The store keeps the session in memory and mirrors it into a
//! [`SessionStorage`] port under three independent keys. Persistence failures
//! are logged and never block the in-memory transition, so a full disk cannot
//! leave a user stuck in a session they asked to leave.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::auth::{AccessToken, LoginCredentials, LoginGrant, RefreshToken, TokenPair};
use super::auth_endpoints::AuthEndpoints;
use super::error::{ApiError, SessionError};
use super::ports::{SessionStorage, StorageKey};
use super::role::Role;
use super::session::{ActiveSession, AuthState};
use super::user::{User, UserPatch};

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    /// The authenticated user.
    pub user: User,
    /// Their role, used to pick the landing destination.
    pub role: Role,
}

/// Identifies one logged-in session.
///
/// Login, logout and forced expiry each start a new generation. Work that
/// outlives the session it began with compares generations before writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionGeneration(u64);

#[derive(Debug, Default)]
struct StoreState {
    initialized: bool,
    generation: SessionGeneration,
    session: Option<ActiveSession>,
}

impl StoreState {
    fn replace_session(&mut self, session: Option<ActiveSession>) -> Option<ActiveSession> {
        self.generation = SessionGeneration(self.generation.0.wrapping_add(1));
        std::mem::replace(&mut self.session, session)
    }
}

/// Owns the current session and its persisted mirror.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
///
/// use dashboard::domain::{AuthEndpoints, SessionStore};
/// use dashboard::outbound::storage::InMemorySessionStorage;
/// # use dashboard::domain::ports::HttpTransport;
/// # fn transport() -> Arc<dyn HttpTransport> { unimplemented!() }
///
/// let store = SessionStore::new(
///     Arc::new(InMemorySessionStorage::default()),
///     AuthEndpoints::new(transport()),
/// );
/// let state = store.initialize();
/// assert!(!state.is_authenticated());
/// ```
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    auth: AuthEndpoints,
    state: Mutex<StoreState>,
}

impl SessionStore {
    /// Create an uninitialised store.
    pub fn new(storage: Arc<dyn SessionStorage>, auth: AuthEndpoints) -> Self {
        Self {
            storage,
            auth,
            state: Mutex::new(StoreState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rebuild the session from storage.
    ///
    /// A session is restored only when both the access token and a decodable
    /// user record are present. Any other partial state is wiped. Calling this
    /// again after initialisation returns the current state unchanged.
    pub fn initialize(&self) -> AuthState {
        let mut state = self.lock();
        if state.initialized {
            return Self::view(&state);
        }

        let access_token = self.read(StorageKey::AccessToken);
        let refresh_token = self.read(StorageKey::RefreshToken);
        let user = self.read(StorageKey::User);

        state.session = match (access_token, user) {
            (Some(token), Some(raw_user)) => match serde_json::from_str::<User>(&raw_user) {
                Ok(user) => {
                    debug!(user_id = %user.id(), role = %user.role(), "restored persisted session");
                    Some(ActiveSession::new(
                        AccessToken::new(token),
                        refresh_token.map(RefreshToken::new),
                        user,
                    ))
                }
                Err(error) => {
                    warn!(%error, "discarding persisted session with corrupt user record");
                    self.clear_storage();
                    None
                }
            },
            (None, None) => {
                if refresh_token.is_some() {
                    warn!("discarding orphaned persisted refresh token");
                    self.clear_storage();
                }
                None
            }
            (token, user) => {
                warn!(
                    has_access_token = token.is_some(),
                    has_user = user.is_some(),
                    "discarding incomplete persisted session"
                );
                self.clear_storage();
                None
            }
        };
        state.initialized = true;
        Self::view(&state)
    }

    /// Authenticate with email and password.
    ///
    /// Invalid input is rejected before any network call. On success the
    /// tokens and user are stored in memory and persisted.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSuccess, ApiError> {
        let credentials = LoginCredentials::try_from_parts(email, password)
            .map_err(|error| ApiError::login_failed(error.to_string()))?;

        let LoginGrant {
            access_token,
            refresh_token,
            user,
        } = self.auth.login(&credentials).await.inspect_err(|error| {
            info!(email = credentials.email(), %error, "login rejected");
        })?;

        let mut state = self.lock();
        self.write(StorageKey::AccessToken, access_token.expose());
        match &refresh_token {
            Some(token) => self.write(StorageKey::RefreshToken, token.expose()),
            None => self.delete(StorageKey::RefreshToken),
        }
        self.persist_user(&user);

        info!(user_id = %user.id(), role = %user.role(), "login succeeded");
        let success = LoginSuccess {
            role: user.role(),
            user: user.clone(),
        };
        state.replace_session(Some(ActiveSession::new(access_token, refresh_token, user)));
        state.initialized = true;
        Ok(success)
    }

    /// End the session. Safe to call when already logged out.
    pub fn logout(&self) {
        let mut state = self.lock();
        if let Some(session) = state.replace_session(None) {
            info!(user_id = %session.user().id(), "logged out");
        }
        state.initialized = true;
        self.clear_storage();
    }

    /// Merge `patch` into the current user and persist the result.
    pub fn update_user(&self, patch: &UserPatch) -> Result<User, SessionError> {
        let mut state = self.lock();
        let session = state.session.as_mut().ok_or(SessionError::NotAuthenticated)?;
        let updated = session.user().clone().merged(patch);
        session.set_user(updated.clone());
        self.persist_user(&updated);
        debug!(user_id = %updated.id(), "updated session user");
        Ok(updated)
    }

    /// Whether a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.lock().session.is_some()
    }

    /// The logged-in user.
    pub fn current_user(&self) -> Option<User> {
        self.lock().session.as_ref().map(|session| session.user().clone())
    }

    /// Current access token.
    pub fn access_token(&self) -> Option<AccessToken> {
        self.lock()
            .session
            .as_ref()
            .map(|session| session.access_token().clone())
    }

    /// Current refresh token.
    pub fn refresh_token(&self) -> Option<RefreshToken> {
        self.lock()
            .session
            .as_ref()
            .and_then(|session| session.refresh_token().cloned())
    }

    /// Whether the logged-in user has `role`.
    pub fn has_role(&self, role: Role) -> bool {
        self.lock()
            .session
            .as_ref()
            .is_some_and(|session| session.role() == role)
    }

    /// Whether the logged-in user has any of `roles`.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.lock()
            .session
            .as_ref()
            .is_some_and(|session| roles.contains(&session.role()))
    }

    /// Snapshot of the authentication status.
    pub fn auth_state(&self) -> AuthState {
        Self::view(&self.lock())
    }

    /// Current session generation.
    pub fn generation(&self) -> SessionGeneration {
        self.lock().generation
    }

    /// Generation and refresh token read under one lock.
    pub fn refresh_credentials(&self) -> (SessionGeneration, Option<RefreshToken>) {
        let state = self.lock();
        let refresh_token = state
            .session
            .as_ref()
            .and_then(|session| session.refresh_token().cloned());
        (state.generation, refresh_token)
    }

    /// Install refreshed tokens into the session of `generation`.
    ///
    /// The stored refresh token is kept when the server did not rotate it.
    /// Nothing changes when that session has since been replaced or ended.
    pub fn rotate_tokens(
        &self,
        generation: SessionGeneration,
        tokens: TokenPair,
    ) -> Result<AccessToken, SessionError> {
        let mut state = self.lock();
        if state.generation != generation {
            debug!("discarding tokens refreshed for a replaced session");
            return Err(SessionError::Superseded);
        }
        let session = state.session.as_mut().ok_or(SessionError::NotAuthenticated)?;

        self.write(StorageKey::AccessToken, tokens.access_token.expose());
        session.set_access_token(tokens.access_token.clone());
        if let Some(refresh_token) = tokens.refresh_token {
            self.write(StorageKey::RefreshToken, refresh_token.expose());
            session.set_refresh_token(refresh_token);
        }
        debug!(user_id = %session.user().id(), "rotated session tokens");
        Ok(tokens.access_token)
    }

    /// Forced logout of the session of `generation`.
    ///
    /// Returns `false`, leaving everything untouched, when that session has
    /// already been replaced by a logout or another login.
    pub fn expire(&self, generation: SessionGeneration) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            debug!("skipping forced logout of a replaced session");
            return false;
        }
        if let Some(session) = state.replace_session(None) {
            warn!(user_id = %session.user().id(), "session expired; forcing logout");
        }
        self.clear_storage();
        true
    }

    fn view(state: &StoreState) -> AuthState {
        match (&state.session, state.initialized) {
            (_, false) => AuthState::Initializing,
            (Some(session), true) => AuthState::Authenticated(session.user().clone()),
            (None, true) => AuthState::Anonymous,
        }
    }

    fn persist_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(encoded) => self.write(StorageKey::User, &encoded),
            Err(error) => warn!(%error, "failed to encode session user"),
        }
    }

    fn read(&self, key: StorageKey) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value.filter(|raw| !raw.trim().is_empty()),
            Err(error) => {
                warn!(%key, %error, "session storage read failed");
                None
            }
        }
    }

    fn write(&self, key: StorageKey, value: &str) {
        if let Err(error) = self.storage.set(key, value) {
            warn!(%key, %error, "session storage write failed");
        }
    }

    fn delete(&self, key: StorageKey) {
        if let Err(error) = self.storage.remove(key) {
            warn!(%key, %error, "session storage removal failed");
        }
    }

    fn clear_storage(&self) {
        for key in StorageKey::ALL {
            self.delete(key);
        }
    }
}
