//! Authenticated session state.
//!
//! # Design
//! The session is an explicit object owned by the caller (normally the
//! `Library` facade) rather than ambient global state. Its only write access
//! points are `login`, `logout`, `refresh_token`, `set_user` and the auth
//! check pair. Token, cached user and login throttle are mirrored into a
//! `Storage` so a restarted client picks them up again.

use tracing::{info, warn};

use super::storage::Storage;
use super::throttle::LoginThrottle;
use crate::error::ApiError;
use crate::types::User;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const THROTTLE_KEY: &str = "login_throttle";

pub struct Session {
    storage: Box<dyn Storage>,
    token: Option<String>,
    user: Option<User>,
    throttle: LoginThrottle,
    check_in_flight: bool,
    error: Option<String>,
}

impl Session {
    /// Rebuild the session from whatever `storage` holds. Unreadable entries
    /// are dropped from storage rather than trusted.
    pub fn restore(mut storage: Box<dyn Storage>) -> Self {
        let token = storage.get(TOKEN_KEY).filter(|t| !t.is_empty());

        let user = match storage.get(USER_KEY) {
            Some(raw) if raw != "undefined" => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "discarding unreadable cached user");
                    storage.remove(USER_KEY);
                    None
                }
            },
            _ => None,
        };

        let throttle = match storage.get(THROTTLE_KEY) {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "discarding unreadable login throttle state");
                LoginThrottle::default()
            }),
            None => LoginThrottle::default(),
        };

        Self {
            storage,
            token,
            user,
            throttle,
            check_in_flight: false,
            error: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_checking(&self) -> bool {
        self.check_in_flight
    }

    pub fn set_error(&mut self, message: Option<String>) {
        self.error = message;
    }

    pub fn login(&mut self, token: String, user: Option<User>) {
        info!(user = user.as_ref().and_then(|u| u.id.as_deref()), "logged in");
        self.storage.set(TOKEN_KEY, token.clone());
        self.token = Some(token);
        self.set_user(user);
        self.error = None;
    }

    pub fn logout(&mut self) {
        if self.token.is_some() {
            info!("logged out");
        }
        self.storage.remove(TOKEN_KEY);
        self.storage.remove(USER_KEY);
        self.token = None;
        self.user = None;
        self.check_in_flight = false;
    }

    pub fn refresh_token(&mut self, token: String) {
        self.storage.set(TOKEN_KEY, token.clone());
        self.token = Some(token);
    }

    pub fn set_user(&mut self, user: Option<User>) {
        match user.as_ref().map(serde_json::to_string) {
            Some(Ok(raw)) => self.storage.set(USER_KEY, raw),
            Some(Err(e)) => warn!(error = %e, "could not cache user"),
            None => self.storage.remove(USER_KEY),
        }
        self.user = user;
    }

    /// Claim the auth-check slot. Fails when there is no token to check or
    /// when another check has not finished yet.
    pub fn begin_auth_check(&mut self) -> Result<(), ApiError> {
        if self.token.is_none() {
            return Err(ApiError::NotAuthenticated);
        }
        if self.check_in_flight {
            return Err(ApiError::AuthCheckInProgress);
        }
        self.check_in_flight = true;
        self.error = None;
        Ok(())
    }

    /// Release the auth-check slot. A failed check ends the session.
    pub fn finish_auth_check(&mut self, outcome: Result<Option<User>, &ApiError>) {
        self.check_in_flight = false;
        match outcome {
            Ok(Some(user)) => self.set_user(Some(user)),
            Ok(None) => {}
            Err(e) => {
                self.logout();
                self.error = Some(e.to_string());
            }
        }
    }

    pub fn throttle(&self) -> &LoginThrottle {
        &self.throttle
    }

    /// Mutate the login throttle and persist the result.
    pub fn update_throttle<R>(&mut self, f: impl FnOnce(&mut LoginThrottle) -> R) -> R {
        let result = f(&mut self.throttle);
        match serde_json::to_string(&self.throttle) {
            Ok(raw) => self.storage.set(THROTTLE_KEY, raw),
            Err(e) => warn!(error = %e, "could not persist login throttle"),
        }
        result
    }
}
