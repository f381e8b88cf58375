//! Session state machine: who is signed in, and whether that is still true.

use serde::Serialize;
use shared::models::{LoginRequest, SignupRequest, User};
use std::{
    fmt,
    sync::{PoisonError, RwLock},
};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::{
    api::ApiClient,
    error::{ClientError, ClientResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AuthStatus {
    /// Nothing has been checked yet.
    Unknown,
    Authenticated,
    Unauthenticated,
}

impl AuthStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Authenticated => "authenticated",
            Self::Unauthenticated => "unauthenticated",
        }
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only copy of the session for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub status: AuthStatus,
    /// True only while the status is `Authenticated` and an unexpired access token is stored.
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
struct SessionState {
    user: Option<User>,
    loading: bool,
    error: Option<String>,
}

/// Owns the signed-in user and drives the auth state machine.
#[derive(Debug)]
pub struct SessionManager {
    api: ApiClient,
    state: RwLock<SessionState>,
    status: watch::Sender<AuthStatus>,
}

impl SessionManager {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let (status, _) = watch::channel(AuthStatus::Unknown);
        Self {
            api,
            state: RwLock::new(SessionState {
                user: None,
                loading: true,
                error: None,
            }),
            status,
        }
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn status(&self) -> AuthStatus {
        *self.status.borrow()
    }

    /// Receiver that observes every status transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status() == AuthStatus::Authenticated && !self.api.tokens().is_expired()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.read_state(|state| state.user.clone())
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.read_state(|state| state.error.clone())
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let status = self.status();
        let is_authenticated = self.is_authenticated();
        self.read_state(|state| SessionSnapshot {
            status,
            is_authenticated,
            user: state.user.clone(),
            loading: state.loading,
            error: state.error.clone(),
        })
    }

    pub fn clear_error(&self) {
        self.write_state(|state| state.error = None);
    }

    /// Resume a session from stored tokens. Any failure, including a failed refresh,
    /// ends up `Unauthenticated` with the tokens cleared.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> AuthStatus {
        if self.api.tokens().read().is_none() {
            debug!("no stored session");
            self.end_session(None);
            return AuthStatus::Unauthenticated;
        }

        self.write_state(|state| state.loading = true);
        match self.api.current_user().await {
            Ok(user) => {
                self.begin_session(user);
                AuthStatus::Authenticated
            }
            Err(err) => {
                warn!(error = %err, "could not restore stored session");
                self.api.discard_tokens();
                self.end_session(None);
                AuthStatus::Unauthenticated
            }
        }
    }

    /// Sign in and load the profile.
    ///
    /// # Errors
    /// Returns the validation, authentication or transport error after recording its
    /// message, clearing stored tokens and moving to `Unauthenticated`.
    #[instrument(skip_all, fields(login = %request.username))]
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<User> {
        self.write_state(|state| {
            state.loading = true;
            state.error = None;
        });

        match self.try_login(request).await {
            Ok(user) => {
                self.begin_session(user.clone());
                Ok(user)
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                self.api.discard_tokens();
                self.end_session(Some(err.user_message()));
                Err(err)
            }
        }
    }

    async fn try_login(&self, request: &LoginRequest) -> ClientResult<User> {
        request.validate()?;
        self.api.login(request).await?;
        self.api.current_user().await
    }

    /// Register, then sign in with the same email and password.
    ///
    /// # Errors
    /// Returns local validation and registration errors without touching the current
    /// status; once registration succeeds, login's errors apply.
    #[instrument(skip_all, fields(username = %request.username))]
    pub async fn signup(&self, request: &SignupRequest) -> ClientResult<User> {
        self.write_state(|state| {
            state.loading = true;
            state.error = None;
        });

        let registered = match request.validate() {
            Ok(()) => self.api.signup(request).await,
            Err(err) => Err(err.into()),
        };
        if let Err(err) = registered {
            warn!(error = %err, "signup failed");
            self.write_state(|state| {
                state.loading = false;
                state.error = Some(err.user_message());
            });
            return Err(err);
        }

        info!("account created; signing in");
        self.login(&request.login_request()).await
    }

    /// Notify the backend if possible, then drop all local session state.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.api.logout().await;
        self.end_session(None);
        info!("signed out");
    }

    /// Renew the access token now.
    ///
    /// # Errors
    /// Any failure logs the session out before the error is returned.
    #[instrument(skip(self))]
    pub async fn refresh_token(&self) -> ClientResult<()> {
        match self.api.refresh().await {
            Ok(_) => Ok(()),
            Err(err) => {
                warn!(error = %err, "refresh failed; signing out");
                self.logout().await;
                self.write_state(|state| state.error = Some(err.user_message()));
                Err(err)
            }
        }
    }

    /// Drop the session locally after the credentials stopped working elsewhere.
    pub fn invalidate(&self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(%reason, "session invalidated");
        self.api.discard_tokens();
        self.end_session(Some(reason));
    }

    /// Forward an error seen by another store: errors that mean the credentials are gone
    /// end the session.
    pub(crate) fn observe_error(&self, err: &ClientError) {
        if err.ends_session() && self.status() == AuthStatus::Authenticated {
            self.invalidate(err.user_message());
        }
    }

    fn begin_session(&self, user: User) {
        info!(user_id = %user.id, username = %user.username, "session authenticated");
        self.write_state(|state| {
            state.user = Some(user);
            state.loading = false;
            state.error = None;
        });
        self.status.send_replace(AuthStatus::Authenticated);
    }

    fn end_session(&self, error: Option<String>) {
        self.write_state(|state| {
            state.user = None;
            state.loading = false;
            state.error = error;
        });
        let previous = self.status.send_replace(AuthStatus::Unauthenticated);
        if previous != AuthStatus::Unauthenticated {
            debug!(from = %previous, "session unauthenticated");
        }
    }

    fn read_state<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write_state(&self, f: impl FnOnce(&mut SessionState)) {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner));
    }
}
