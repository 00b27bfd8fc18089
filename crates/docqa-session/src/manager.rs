//! The session manager: the single source of truth for authentication.
//!
//! It mediates between three things that must always agree:
//! - the persisted token ([`TokenStore`])
//! - the pipeline's decoration rule ([`Credential`](docqa_transport::Credential))
//! - the in-memory [`Session`]
//!
//! # Consistency
//!
//! Every transition updates all three while holding one
//! `parking_lot::Mutex`, and that lock is never held across an `.await`.
//! Each operation therefore looks like:
//!
//! ```text
//! lock → read/prepare → unlock → network call (suspends) → lock → compare generation → write all three → unlock
//! ```
//!
//! The generation check after the suspension is what stops a slow identity
//! check from overwriting a logout that landed while it was in flight.

use std::sync::{Arc, Weak};

use docqa_protocol::{
    Identity, LoginForm, RegisterRequest, TokenResponse,
};
use docqa_transport::{ApiClient, InvalidationHook, TransportError};
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::{
    AuthFailure, Navigator, Route, Session, SessionConfig, SessionError,
    SessionStatus, TokenStore,
};

const LOGIN_PATH: &str = "auth/login";
const REGISTER_PATH: &str = "users/";
const IDENTITY_PATH: &str = "users/me";

/// Owns the client's authentication state.
///
/// Cloning gives another handle to the same session; hand clones to
/// whichever parts of the UI need to read or change it.
///
/// ## Lifecycle
///
/// ```text
/// new() ──→ initialize() ──→ [Authenticated | Anonymous]
///                                 │            │
///                     logout()/401│            │login()
///                                 ▼            ▼
///                            [Anonymous]  [Authenticated]
/// ```
#[derive(Clone)]
pub struct SessionManager {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<Session>,
    updates: watch::Sender<Session>,
    store: Box<dyn TokenStore>,
    client: ApiClient,
    navigator: Box<dyn Navigator>,
    config: SessionConfig,
}

/// The pipeline's inbound hook. Holds the session weakly: the session
/// owns the client, and the client owns this hook.
struct Invalidator {
    shared: Weak<Shared>,
}

impl InvalidationHook for Invalidator {
    fn on_unauthorized(&self, rejected: Option<&str>) {
        if let Some(shared) = self.shared.upgrade() {
            SessionManager { shared }.invalidate(rejected);
        }
    }
}

impl SessionManager {
    /// Creates a manager in `Uninitialized` and registers it as
    /// `client`'s invalidation hook.
    ///
    /// Any credential already installed on `client` is removed: nothing is
    /// trusted until [`initialize`](Self::initialize) or
    /// [`login`](Self::login) verifies it.
    pub fn new(
        client: ApiClient,
        store: impl TokenStore,
        navigator: impl Navigator,
        config: SessionConfig,
    ) -> Self {
        client.credential().clear();
        let (updates, _) = watch::channel(Session::default());

        let shared = Arc::new(Shared {
            state: Mutex::new(Session::default()),
            updates,
            store: Box::new(store),
            client,
            navigator: Box::new(navigator),
            config,
        });

        shared.client.set_invalidation_hook(Arc::new(Invalidator {
            shared: Arc::downgrade(&shared),
        }));

        Self { shared }
    }

    // =====================================================================
    // Operations
    // =====================================================================

    /// Restores the session from storage.
    ///
    /// - No stored token → `Anonymous` immediately.
    /// - Stored token → `Checking` with the token installed, then
    ///   `Authenticated` if the identity endpoint accepts it, otherwise
    ///   the token is discarded everywhere and the status is `Anonymous`.
    ///
    /// Only runs from `Uninitialized` or `Anonymous`; in any other state it
    /// returns the current status untouched. Never leaves the session in
    /// `Checking`.
    pub async fn initialize(&self) -> SessionStatus {
        let Some((token, generation)) = self.begin_check() else {
            return self.status();
        };

        tracing::debug!(generation, "verifying persisted token");
        let verified = self.fetch_identity(None).await;

        self.finish_check(&token, generation, verified)
    }

    /// Exchanges credentials for a token and authenticates the session.
    ///
    /// The token is verified against the identity endpoint before anything
    /// is committed. On success the token is persisted, installed, the
    /// status becomes `Authenticated`, and the UI is sent to
    /// [`Route::Home`]. On failure nothing changes.
    pub async fn login(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<(), AuthFailure> {
        let fallback = self.shared.config.login_fallback.as_str();
        let failed = |e: TransportError| {
            tracing::info!(error = %e, "login failed");
            AuthFailure::from_transport(&e, fallback)
        };

        let form = LoginForm {
            username: identifier.to_string(),
            password: secret.to_string(),
        };
        let token: TokenResponse = self
            .shared
            .client
            .post(LOGIN_PATH)
            .map_err(failed)?
            .form(&form)
            .exempt()
            .decode()
            .await
            .map_err(failed)?;
        token.validate().map_err(|e| failed(e.into()))?;

        let user = self
            .fetch_identity(Some(&token.access_token))
            .await
            .map_err(failed)?;

        self.commit_login(token.access_token, user)?;
        self.shared.navigator.navigate(Route::Home);
        Ok(())
    }

    /// Creates an account. Does not log in; call [`login`](Self::login)
    /// afterwards.
    pub async fn register(
        &self,
        email: &str,
        secret: &str,
        display_name: &str,
    ) -> Result<(), AuthFailure> {
        let fallback = self.shared.config.register_fallback.as_str();
        let failed = |e: TransportError| {
            tracing::info!(error = %e, "registration failed");
            AuthFailure::from_transport(&e, fallback)
        };

        let body = RegisterRequest {
            email: email.to_string(),
            password: secret.to_string(),
            full_name: display_name.to_string(),
        };
        self.shared
            .client
            .post(REGISTER_PATH)
            .map_err(failed)?
            .json(&body)
            .exempt()
            .execute()
            .await
            .map_err(failed)?;

        tracing::info!("account registered");
        Ok(())
    }

    /// Ends the session and sends the UI to [`Route::Login`].
    ///
    /// Idempotent: when already anonymous, only the navigation signal is
    /// emitted.
    pub fn logout(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.status == SessionStatus::Anonymous
                && state.token.is_none()
            {
                tracing::debug!("logout while already anonymous");
            } else {
                self.reset_locked(&mut state);
                tracing::info!("logged out");
            }
        }
        self.shared.navigator.navigate(Route::Login);
    }

    // =====================================================================
    // Accessors
    // =====================================================================

    pub fn status(&self) -> SessionStatus {
        self.shared.state.lock().status
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    /// `true` until `initialize` has resolved.
    pub fn is_loading(&self) -> bool {
        self.status().is_loading()
    }

    pub fn user(&self) -> Option<Identity> {
        self.shared.state.lock().user.clone()
    }

    /// The identity, or [`SessionError::NotAuthenticated`].
    pub fn require_user(&self) -> Result<Identity, SessionError> {
        self.user().ok_or(SessionError::NotAuthenticated)
    }

    pub fn token(&self) -> Option<String> {
        self.shared.state.lock().token.clone()
    }

    pub fn snapshot(&self) -> Session {
        self.shared.state.lock().clone()
    }

    /// A receiver that sees every transition (latest value wins).
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.shared.updates.subscribe()
    }

    /// The decorated client; share it with the rest of the application.
    pub fn client(&self) -> &ApiClient {
        &self.shared.client
    }

    // =====================================================================
    // Transitions (all synchronous, all under the state lock)
    // =====================================================================

    /// Enters `Checking` if there is a stored token. Returns the token and
    /// the generation to compare against afterwards, or `None` if the
    /// session resolved (or was already past initialization).
    fn begin_check(&self) -> Option<(String, u64)> {
        let mut state = self.shared.state.lock();
        if !matches!(
            state.status,
            SessionStatus::Uninitialized | SessionStatus::Anonymous
        ) {
            tracing::debug!(status = %state.status, "initialize skipped");
            return None;
        }

        let stored = match self.shared.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "could not read persisted token");
                None
            }
        };

        let Some(token) = stored else {
            tracing::debug!("no persisted token");
            if state.status == SessionStatus::Uninitialized {
                self.reset_locked(&mut state);
            }
            return None;
        };

        self.shared.client.credential().install(token.clone());
        state.status = SessionStatus::Checking;
        state.token = Some(token.clone());
        state.user = None;
        state.generation += 1;
        self.publish(&state);

        Some((token, state.generation))
    }

    fn finish_check(
        &self,
        token: &str,
        generation: u64,
        verified: Result<Identity, TransportError>,
    ) -> SessionStatus {
        let navigate_to_login = {
            let mut state = self.shared.state.lock();
            if state.generation != generation
                || state.token.as_deref() != Some(token)
            {
                tracing::debug!(
                    status = %state.status,
                    "discarding superseded identity check"
                );
                return state.status;
            }

            match verified {
                Ok(user) => {
                    tracing::info!(user_id = ?user.id, "session restored");
                    state.status = SessionStatus::Authenticated;
                    state.user = Some(user);
                    state.generation += 1;
                    self.publish(&state);
                    false
                }
                Err(e) => {
                    tracing::warn!(error = %e, "persisted token rejected");
                    self.reset_locked(&mut state);
                    true
                }
            }
        };

        if navigate_to_login {
            self.shared.navigator.navigate(Route::Login);
        }
        self.status()
    }

    fn commit_login(
        &self,
        token: String,
        user: Identity,
    ) -> Result<(), AuthFailure> {
        let mut state = self.shared.state.lock();

        // Persist first: if this fails nothing else has changed.
        self.shared.store.save(&token).map_err(|e| {
            AuthFailure::storage(&e, &self.shared.config.login_fallback)
        })?;

        self.shared.client.credential().install(token.clone());
        tracing::info!(user_id = ?user.id, "logged in");
        state.status = SessionStatus::Authenticated;
        state.token = Some(token);
        state.user = Some(user);
        state.generation += 1;
        self.publish(&state);
        Ok(())
    }

    /// Inbound hook target.
    ///
    /// - The token currently in force was rejected: the session ends and
    ///   the UI goes to [`Route::Login`]. Repeats find no token left, so a
    ///   burst of `401`s produces exactly one transition.
    /// - An anonymous request was rejected: nothing to clear, but the UI
    ///   still goes to [`Route::Login`], unless a credential has been
    ///   installed since the request left.
    /// - A replaced token was rejected: ignored.
    fn invalidate(&self, rejected: Option<&str>) {
        let navigate = {
            let mut state = self.shared.state.lock();
            match (rejected, state.token.as_deref()) {
                (Some(rejected), Some(current)) if rejected == current => {
                    self.reset_locked(&mut state);
                    tracing::info!("session invalidated by server");
                    true
                }
                (None, None) => {
                    tracing::debug!("anonymous request rejected");
                    true
                }
                _ => {
                    tracing::debug!(
                        "ignoring 401 for a credential no longer in force"
                    );
                    false
                }
            }
        };

        if navigate {
            self.shared.navigator.navigate(Route::Login);
        }
    }

    /// Clears storage, the decoration rule, and the identity; status
    /// becomes `Anonymous`. Caller holds the lock.
    fn reset_locked(&self, state: &mut Session) {
        if let Err(e) = self.shared.store.clear() {
            tracing::warn!(error = %e, "could not clear persisted token");
        }
        self.shared.client.credential().clear();
        state.status = SessionStatus::Anonymous;
        state.token = None;
        state.user = None;
        state.generation += 1;
        self.publish(state);
    }

    fn publish(&self, state: &Session) {
        self.shared.updates.send_replace(state.clone());
    }

    /// `GET /users/me`. With `bearer`, the probe uses that token and is
    /// exempt from invalidation (it isn't installed yet); without, it
    /// goes through the shared rule like any other request.
    async fn fetch_identity(
        &self,
        bearer: Option<&str>,
    ) -> Result<Identity, TransportError> {
        let mut request = self.shared.client.get(IDENTITY_PATH)?;
        if let Some(token) = bearer {
            request = request.bearer(token).exempt();
        }
        request.decode().await
    }
}

// =========================================================================
// Tests
// =========================================================================
