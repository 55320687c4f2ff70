//! Session lifecycle: login, token renewal, authenticated requests, logout
//!
//! A [`SessionManager`] owns the access/refresh token pair and the profile of
//! the logged-in user. Every state change goes through one mutation path that
//! mirrors changed tokens to the configured [`TokenStore`] and publishes a new
//! [`SessionSnapshot`] to subscribers before the lock is released.
//!
//! Renewal is proactive: after login (or restore) a single timer is armed to
//! fire `leeway` before the access token's `exp`. Arming a timer cancels the
//! previous one. A timer-driven renewal re-arms from the new token; a failed
//! renewal ends the chain and the next 401 surfaces the problem.
//!
//! Every login, restore and logout bumps the session generation. Responses
//! that were requested under an older generation are discarded.

use crate::api::{ApiClient, RequestOptions};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::outcome::FetchOutcome;
use crate::store::{MemoryTokenStore, TokenKey, TokenStore};
use crate::token;
use crate::types::{
    LoginRequest, RefreshRequest, RefreshResponse, TokenPair, UserData, VerifyRequest,
};
use chrono::Utc;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

const TOKEN_PATH: &str = "/api/token/";
const REFRESH_PATH: &str = "/api/token/refresh/";
const VERIFY_PATH: &str = "/api/token/verify/";
const PROFILE_PATH: &str = "/api/users/me/";

/// Observable view of the session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<UserData>,
    pub generation: u64,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn is_teacher(&self) -> bool {
        self.user.as_ref().is_some_and(UserData::is_teacher)
    }

    pub fn is_student(&self) -> bool {
        self.user.as_ref().is_some_and(UserData::is_student)
    }
}

struct RefreshTimer {
    id: u64,
    handle: AbortHandle,
    deadline: Instant,
}

#[derive(Default)]
struct SessionState {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<UserData>,
    generation: u64,
    timer: Option<RefreshTimer>,
    next_timer_id: u64,
}

impl SessionState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            user: self.user.clone(),
            generation: self.generation,
        }
    }
}

type RefreshFlight = Shared<BoxFuture<'static, bool>>;

#[derive(Default)]
struct FlightSlot {
    next_id: u64,
    current: Option<(u64, RefreshFlight)>,
}

struct Inner {
    api: ApiClient,
    store: Arc<dyn TokenStore>,
    leeway: Duration,
    state: Mutex<SessionState>,
    changes: watch::Sender<SessionSnapshot>,
    flight: Mutex<FlightSlot>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flight_slot(&self) -> MutexGuard<'_, FlightSlot> {
        self.flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` to the session state, then persist changed tokens and
    /// publish the resulting snapshot.
    fn mutate<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.state();
        let access_before = state.access_token.clone();
        let refresh_before = state.refresh_token.clone();

        let result = f(&mut state);

        if state.access_token != access_before {
            self.persist(TokenKey::Access, state.access_token.as_deref());
        }
        if state.refresh_token != refresh_before {
            self.persist(TokenKey::Refresh, state.refresh_token.as_deref());
        }

        let snapshot = state.snapshot();
        self.changes.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
        result
    }

    fn persist(&self, key: TokenKey, value: Option<&str>) {
        let result = match value {
            Some(value) => self.store.set(key, value),
            None => self.store.remove(key),
        };
        if let Err(e) = result {
            warn!(key = key.as_str(), error = %e, "failed to persist session token");
        }
    }

    fn clear_flight(&self, id: Option<u64>) {
        let mut slot = self.flight_slot();
        let matches = match (&slot.current, id) {
            (Some((current, _)), Some(id)) => *current == id,
            (_, None) => true,
            (None, Some(_)) => false,
        };
        if matches {
            slot.current = None;
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = state.timer.take() {
            timer.handle.abort();
        }
    }
}

/// Owner of the authenticated session. Clones share one session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn builder() -> SessionManagerBuilder {
        SessionManagerBuilder::default()
    }

    /// Create a session manager from loaded configuration
    pub fn from_config(
        config: &ClientConfig,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, ClientError> {
        Self::builder()
            .api(ApiClient::from_config(config)?)
            .shared_store(store)
            .refresh_leeway(config.refresh_leeway())
            .build()
    }

    /// Transport shared with catalog consumers
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state().snapshot()
    }

    /// Receive a snapshot after every session change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.changes.subscribe()
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.state().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner.state().refresh_token.clone()
    }

    pub fn user(&self) -> Option<UserData> {
        self.inner.state().user.clone()
    }

    pub fn generation(&self) -> u64 {
        self.inner.state().generation
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state().access_token.is_some()
    }

    pub fn is_teacher(&self) -> bool {
        self.inner.state().user.as_ref().is_some_and(UserData::is_teacher)
    }

    pub fn is_student(&self) -> bool {
        self.inner.state().user.as_ref().is_some_and(UserData::is_student)
    }

    pub fn has_pending_refresh(&self) -> bool {
        self.inner.state().timer.is_some()
    }

    /// When the pending refresh timer will fire
    pub fn refresh_deadline(&self) -> Option<Instant> {
        self.inner.state().timer.as_ref().map(|timer| timer.deadline)
    }

    /// Exchange credentials for a token pair and start a session.
    ///
    /// The previous session, if any, is replaced. A failing profile fetch does
    /// not fail the login.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        if username.is_empty() || password.is_empty() {
            return Err(ClientError::AuthenticationFailed(
                "username and password are required".into(),
            ));
        }

        let request = self
            .inner
            .api
            .request(Method::POST, TOKEN_PATH)
            .json(&LoginRequest { username, password });
        let pair: TokenPair = self.inner.api.execute(request).await.map_err(|e| {
            warn!(error = %e, "login rejected");
            ClientError::AuthenticationFailed(e.to_string())
        })?;

        self.start_session(pair.access, pair.refresh);
        info!("logged in");

        if let FetchOutcome::Failed(e) = self.fetch_user_profile().await {
            debug!(error = %e, "continuing without a user profile");
        }
        Ok(())
    }

    /// Restore a persisted session and load its profile.
    ///
    /// Returns `false` and stays logged out when the stored tokens are absent
    /// or unusable.
    pub async fn restore(&self) -> bool {
        if !self.restore_tokens() {
            return false;
        }
        if let FetchOutcome::Failed(e) = self.fetch_user_profile().await {
            debug!(error = %e, "restored session without a user profile");
        }
        true
    }

    /// Load persisted tokens into memory and arm renewal, without network I/O
    pub fn restore_tokens(&self) -> bool {
        let persisted = match self.inner.store.load() {
            Ok(persisted) => persisted,
            Err(e) => {
                warn!(error = %e, "cannot read persisted session");
                return false;
            }
        };

        let (Some(access), Some(refresh)) = (persisted.access, persisted.refresh) else {
            debug!("no persisted session");
            return false;
        };
        if refresh.trim().is_empty() {
            debug!("persisted refresh token is empty");
            return false;
        }
        if let Err(e) = token::expiry(&access) {
            warn!(error = %e, "discarding malformed persisted session");
            if let Err(e) = self.inner.store.clear() {
                warn!(error = %e, "failed to clear persisted session");
            }
            return false;
        }

        self.start_session(access, refresh);
        info!("session restored");
        true
    }

    fn start_session(&self, access: String, refresh: String) {
        let schedule_from = access.clone();
        self.inner.mutate(|state| {
            state.generation += 1;
            state.access_token = Some(access);
            state.refresh_token = Some(refresh);
            state.user = None;
        });
        self.inner.clear_flight(None);
        self.schedule_token_refresh(&schedule_from);
    }

    /// Clear tokens and profile, cancel renewal and wipe persisted storage.
    pub fn logout(&self) {
        let had_session = self.inner.mutate(|state| {
            let had_session = state.access_token.is_some() || state.refresh_token.is_some();
            state.access_token = None;
            state.refresh_token = None;
            state.user = None;
            state.generation += 1;
            if let Some(timer) = state.timer.take() {
                timer.handle.abort();
            }
            had_session
        });
        self.inner.clear_flight(None);

        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "failed to clear persisted session");
        }
        if had_session {
            info!("logged out");
        }
    }

    /// Arm the renewal timer from `token`'s expiry, replacing any pending one
    pub fn schedule_token_refresh(&self, token: &str) {
        let delay = token::refresh_delay(token, Utc::now(), self.inner.leeway);
        self.arm_refresh_timer(delay);
    }

    fn schedule_after_refresh(&self, token: &str) {
        let delay = token::refresh_delay(token, Utc::now(), self.inner.leeway);
        if delay.is_zero() {
            // A fresh token that is already due would renew in a tight loop.
            warn!("renewed access token is already inside the renewal window; automatic renewal stopped");
            if let Some(timer) = self.inner.state().timer.take() {
                timer.handle.abort();
            }
            return;
        }
        self.arm_refresh_timer(delay);
    }

    fn arm_refresh_timer(&self, delay: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime available; automatic token renewal disabled");
            return;
        };

        let weak = Arc::downgrade(&self.inner);
        let mut state = self.inner.state();
        if let Some(previous) = state.timer.take() {
            previous.handle.abort();
            debug!(timer = previous.id, "cancelled pending token refresh");
        }
        state.next_timer_id += 1;
        let id = state.next_timer_id;
        let task = runtime.spawn(run_refresh_timer(weak, id, delay));
        state.timer = Some(RefreshTimer {
            id,
            handle: task.abort_handle(),
            deadline: Instant::now() + delay,
        });
        debug!(
            timer = id,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "scheduled token refresh"
        );
    }

    /// Mint a new access token from the refresh token.
    ///
    /// Concurrent callers share one request and its result. Returns `false`
    /// without touching the tokens when there is no refresh token, the
    /// request fails, or the session changed while it was in flight.
    pub async fn try_refresh_tokens(&self) -> bool {
        let flight = {
            let mut slot = self.inner.flight_slot();
            if let Some((_, flight)) = &slot.current {
                debug!("joining in-flight token refresh");
                flight.clone()
            } else {
                let (refresh, generation) = {
                    let state = self.inner.state();
                    (state.refresh_token.clone(), state.generation)
                };
                let Some(refresh) = refresh else {
                    debug!("no refresh token; skipping token refresh");
                    return false;
                };

                slot.next_id += 1;
                let id = slot.next_id;
                let flight = run_refresh(
                    Arc::downgrade(&self.inner),
                    self.inner.api.clone(),
                    refresh,
                    generation,
                    id,
                )
                .boxed()
                .shared();
                slot.current = Some((id, flight.clone()));
                flight
            }
        };
        flight.await
    }

    /// Store a refresh response obtained under `generation`
    fn apply_refresh(&self, response: RefreshResponse, generation: u64) -> bool {
        let access = response.access.clone();
        let applied = self.inner.mutate(|state| {
            if state.generation != generation {
                return false;
            }
            state.access_token = Some(response.access);
            if let Some(rotated) = response.refresh {
                state.refresh_token = Some(rotated);
            }
            true
        });
        if !applied {
            debug!("discarding token refresh that finished after the session changed");
            return false;
        }

        info!("access token renewed");
        self.schedule_after_refresh(&access);
        true
    }

    /// Send an authenticated request.
    ///
    /// On 401 the session renews once and the request is replayed once with
    /// the new token; that second result is returned as-is. If renewal fails
    /// the session is logged out and `SessionExpired` is returned.
    #[instrument(skip(self, options), fields(method = %options.method))]
    pub async fn auth_fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        let token = self.access_token().ok_or(ClientError::NotAuthenticated)?;

        let api = &self.inner.api;
        match api.execute(api.request_with(path, &options, Some(&token))).await {
            Err(e) if e.is_unauthorized() => {
                warn!("access token rejected; renewing");
                let renewed = match self.access_token() {
                    Some(current) if current != token => {
                        debug!("access token was renewed concurrently");
                        Some(current)
                    }
                    _ => {
                        if self.try_refresh_tokens().await {
                            self.access_token()
                        } else {
                            None
                        }
                    }
                };

                let Some(token) = renewed else {
                    self.logout();
                    return Err(ClientError::SessionExpired);
                };
                api.execute(api.request_with(path, &options, Some(&token)))
                    .await
            }
            other => other,
        }
    }

    /// Load the current user's profile. Failures clear the profile but keep
    /// the session.
    pub async fn fetch_user_profile(&self) -> FetchOutcome {
        let generation = {
            let state = self.inner.state();
            if state.access_token.is_none() {
                return FetchOutcome::Skipped;
            }
            state.generation
        };

        match self
            .auth_fetch::<UserData>(PROFILE_PATH, RequestOptions::get())
            .await
        {
            Ok(user) => {
                let stored = self.inner.mutate(|state| {
                    if state.generation == generation && state.access_token.is_some() {
                        state.user = Some(user);
                        true
                    } else {
                        false
                    }
                });
                if stored {
                    debug!("user profile loaded");
                    FetchOutcome::Updated
                } else {
                    debug!("discarding user profile from an ended session");
                    FetchOutcome::Stale
                }
            }
            Err(e) => {
                error!(error = %e, "failed to load user profile");
                self.inner.mutate(|state| {
                    if state.generation == generation {
                        state.user = None;
                    }
                });
                FetchOutcome::Failed(e)
            }
        }
    }

    /// Ask the server whether the current access token is still valid
    pub async fn verify_token(&self) -> Result<bool, ClientError> {
        let token = self.access_token().ok_or(ClientError::NotAuthenticated)?;
        let request = self
            .inner
            .api
            .request(Method::POST, VERIFY_PATH)
            .json(&VerifyRequest { token: &token });

        match self
            .inner
            .api
            .execute::<serde_json::Value>(request)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_unauthorized() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// One refresh request. Holds the session weakly so an abandoned flight
/// parked in the slot does not keep the session alive.
async fn run_refresh(
    inner: Weak<Inner>,
    api: ApiClient,
    refresh: String,
    generation: u64,
    id: u64,
) -> bool {
    let request = api
        .request(Method::POST, REFRESH_PATH)
        .json(&RefreshRequest { refresh: &refresh });
    let result = api.execute::<RefreshResponse>(request).await;

    let Some(inner) = inner.upgrade() else {
        return false;
    };
    let session = SessionManager { inner };
    let refreshed = match result {
        Ok(response) => session.apply_refresh(response, generation),
        Err(e) => {
            warn!(error = %e, "token refresh failed");
            false
        }
    };
    session.inner.clear_flight(Some(id));
    refreshed
}

async fn run_refresh_timer(inner: Weak<Inner>, id: u64, delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let Some(inner) = inner.upgrade() else {
        return;
    };
    let session = SessionManager { inner };

    // Release the slot so the renewal can arm the next timer without
    // aborting this task.
    {
        let mut state = session.inner.state();
        if state.timer.as_ref().map(|timer| timer.id) != Some(id) {
            return;
        }
        state.timer = None;
    }

    if !session.try_refresh_tokens().await {
        warn!("scheduled token refresh failed; automatic renewal stopped");
    }
}

/// Builder for SessionManager
pub struct SessionManagerBuilder {
    api: Option<ApiClient>,
    base_url: Option<String>,
    store: Option<Arc<dyn TokenStore>>,
    leeway: Duration,
}

impl Default for SessionManagerBuilder {
    fn default() -> Self {
        Self {
            api: None,
            base_url: None,
            store: None,
            leeway: ClientConfig::default().refresh_leeway(),
        }
    }
}

impl SessionManagerBuilder {
    /// Use an existing transport
    pub fn api(mut self, api: ApiClient) -> Self {
        self.api = Some(api);
        self
    }

    /// Build a default transport for this base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Persist tokens in `store` (defaults to an in-memory store)
    pub fn store(self, store: impl TokenStore + 'static) -> Self {
        self.shared_store(Arc::new(store))
    }

    pub fn shared_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Renew this long before the access token expires
    pub fn refresh_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn build(self) -> Result<SessionManager, ClientError> {
        let api = match (self.api, self.base_url) {
            (Some(api), _) => api,
            (None, Some(url)) => ApiClient::new(url)?,
            (None, None) => {
                return Err(ClientError::Configuration(
                    "an API client or base_url is required".into(),
                ));
            }
        };
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::new()));
        let (changes, _) = watch::channel(SessionSnapshot::default());

        Ok(SessionManager {
            inner: Arc::new(Inner {
                api,
                store,
                leeway: self.leeway,
                state: Mutex::new(SessionState::default()),
                changes,
                flight: Mutex::new(FlightSlot::default()),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use serde_json::json;

    fn token_expiring_in(seconds: i64) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &json!({"exp": Utc::now().timestamp() + seconds}),
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap()
    }

    fn offline_session(store: MemoryTokenStore) -> SessionManager {
        // Nothing listens here; these tests never reach the network.
        SessionManager::builder()
            .base_url("http://127.0.0.1:9")
            .store(store)
            .build()
            .unwrap()
    }

    fn user(role: Role) -> UserData {
        UserData {
            id: 1,
            username: "alice".into(),
            email: String::new(),
            role,
            first_name: String::new(),
            last_name: String::new(),
            phone: None,
            group: None,
            course: None,
        }
    }

    #[test]
    fn test_snapshot_role_flags() {
        let mut snapshot = SessionSnapshot::default();
        assert!(!snapshot.is_authenticated());
        assert!(!snapshot.is_teacher());

        snapshot.access_token = Some("A1".into());
        snapshot.user = Some(user(Role::Student));
        assert!(snapshot.is_authenticated());
        assert!(snapshot.is_student());
        assert!(!snapshot.is_teacher());
    }

    #[test]
    fn test_builder_requires_transport() {
        let result = SessionManager::builder().build();
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_restore_tokens_arms_renewal() {
        let access = token_expiring_in(3600);
        let store = MemoryTokenStore::with_tokens(&access, "R1");
        let session = offline_session(store);

        assert!(session.restore_tokens());
        assert!(session.is_authenticated());
        assert_eq!(session.refresh_token().as_deref(), Some("R1"));
        assert!(session.has_pending_refresh());
        assert_eq!(session.generation(), 1);
    }

    #[tokio::test]
    async fn test_rescheduling_replaces_pending_timer() {
        let session = offline_session(MemoryTokenStore::new());

        session.schedule_token_refresh(&token_expiring_in(7200));
        let first = session.refresh_deadline().unwrap();

        session.schedule_token_refresh(&token_expiring_in(3600));
        let second = session.refresh_deadline().unwrap();

        assert!(second < first);
        assert_eq!(session.inner.state().next_timer_id, 2);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent_and_clears_storage() {
        let store = MemoryTokenStore::with_tokens(&token_expiring_in(3600), "R1");
        let session = offline_session(store.clone());
        assert!(session.restore_tokens());

        session.logout();
        assert!(!session.is_authenticated());
        assert!(session.refresh_token().is_none());
        assert!(!session.has_pending_refresh());
        assert!(store.is_empty());

        session.logout();
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn test_try_refresh_without_refresh_token_is_false() {
        let session = offline_session(MemoryTokenStore::new());
        assert!(!session.try_refresh_tokens().await);
    }

    #[tokio::test]
    async fn test_abandoned_refresh_does_not_keep_session_alive() {
        // Accepts connections into the backlog but never answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let session = SessionManager::builder()
            .base_url(format!("http://{}", listener.local_addr().unwrap()))
            .store(MemoryTokenStore::with_tokens(&token_expiring_in(3600), "R1"))
            .build()
            .unwrap();
        assert!(session.restore_tokens());

        let abandoned =
            tokio::time::timeout(Duration::from_millis(100), session.try_refresh_tokens()).await;
        assert!(abandoned.is_err());
        assert!(session.inner.flight_slot().current.is_some());

        let weak = Arc::downgrade(&session.inner);
        drop(session);
        assert!(weak.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_new_session_detaches_previous_refresh() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let store = MemoryTokenStore::with_tokens(&token_expiring_in(3600), "R1");
        let session = SessionManager::builder()
            .base_url(format!("http://{}", listener.local_addr().unwrap()))
            .store(store.clone())
            .build()
            .unwrap();
        assert!(session.restore_tokens());

        let _ = tokio::time::timeout(Duration::from_millis(100), session.try_refresh_tokens()).await;
        assert!(session.inner.flight_slot().current.is_some());

        store.set(TokenKey::Refresh, "R9").unwrap();
        assert!(session.restore_tokens());
        assert!(session.inner.flight_slot().current.is_none());
        assert_eq!(session.refresh_token().as_deref(), Some("R9"));
    }

    #[tokio::test]
    async fn test_subscribers_see_mutations() {
        let store = MemoryTokenStore::with_tokens(&token_expiring_in(3600), "R1");
        let session = offline_session(store);
        let mut changes = session.subscribe();

        assert!(session.restore_tokens());
        assert!(changes.has_changed().unwrap());
        assert!(changes.borrow_and_update().is_authenticated());

        session.logout();
        assert!(changes.has_changed().unwrap());
        assert!(!changes.borrow_and_update().is_authenticated());
    }
}
