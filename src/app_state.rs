//! State shared by every request handler.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{Error, auth::DEFAULT_COOKIE_DURATION, db::initialize};

/// Handlers take the narrower state structs derived from this with [FromRef].
#[derive(Debug, Clone)]
pub struct AppState {
    /// Encrypts and signs the private auth cookie.
    pub cookie_key: Key,
    /// How long a session lasts without activity.
    pub cookie_duration: Duration,
    /// Canonical timezone name, e.g. "Pacific/Auckland", that decides what "today" is.
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create the tables if needed and derive the cookie key from `cookie_secret`.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

/// Lets handlers on the main router extract a `PrivateCookieJar`.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// The same secret always yields the same key, so sessions survive restarts.
pub fn create_cookie_key(secret: &str) -> Key {
    Key::from(&Sha512::digest(secret))
}
