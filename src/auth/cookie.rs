//! The encrypted auth cookie: issuing it on log-in, reading it on each request,
//! sliding its expiry forward and clearing it on log-out.

use axum::extract::FromRef;
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, Key, SameSite},
};
use time::{Duration, OffsetDateTime, UtcOffset};

use crate::{
    AppState, Error,
    auth::{Token, UserID},
    timezone::get_local_offset,
};

/// The name of the cookie holding the serialized [Token].
pub const COOKIE_TOKEN: &str = "token";
/// How long a session lasts without activity unless configured otherwise.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(5);

/// Everything needed to issue, read and refresh auth cookies.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Encrypts and signs the private cookie.
    pub cookie_key: Key,
    /// How long a session lasts without activity.
    pub cookie_duration: Duration,
    /// Canonical timezone name that expiry times are written in.
    pub local_timezone: String,
}

impl SessionConfig {
    /// The current UTC offset of the configured timezone.
    pub fn local_offset(&self) -> Result<UtcOffset, Error> {
        get_local_offset(&self.local_timezone)
            .ok_or_else(|| Error::InvalidTimezoneError(self.local_timezone.clone()))
    }
}

impl FromRef<AppState> for SessionConfig {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl FromRef<SessionConfig> for Key {
    fn from_ref(config: &SessionConfig) -> Self {
        config.cookie_key.clone()
    }
}

/// The auth cookie with its security attributes, not yet added to a jar.
fn auth_cookie(value: String, expires_at: OffsetDateTime) -> Cookie<'static> {
    Cookie::build((COOKIE_TOKEN, value))
        .expires(expires_at)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(true)
        .build()
}

fn expiry_from_now(duration: Duration, local_offset: UtcOffset) -> Result<OffsetDateTime, Error> {
    let now = OffsetDateTime::now_utc().to_offset(local_offset);

    now.checked_add(duration).ok_or_else(|| {
        Error::InvalidDateFormat(
            format!("adding {duration} overflows the date time"),
            now.to_string(),
        )
    })
}

fn add_token(jar: PrivateCookieJar, token: &Token) -> Result<PrivateCookieJar, Error> {
    let value = serde_json::to_string(token)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    Ok(jar.add(auth_cookie(value, token.expires_at)))
}

/// Log `user_id` in by adding an auth cookie that expires `duration` from now.
///
/// The expiry is written in `local_offset` so it reads naturally in the server's timezone.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
    local_offset: UtcOffset,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = expiry_from_now(duration, local_offset)?;

    add_token(
        jar,
        &Token {
            user_id,
            expires_at,
        },
    )
}

/// Overwrite the auth cookie with a placeholder that browsers discard immediately.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    let mut cookie = auth_cookie("deleted".to_owned(), OffsetDateTime::UNIX_EPOCH);
    cookie.set_max_age(Duration::ZERO);

    jar.add(cookie)
}

/// The session token in `jar`, if it is present, readable and unexpired.
///
/// # Errors
///
/// Returns [Error::CookieMissing] without a cookie and [Error::InvalidCredentials]
/// for a cookie that cannot be read or has expired.
pub fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::CookieMissing)?;
    let token: Token =
        serde_json::from_str(cookie.value_trimmed()).map_err(|_| Error::InvalidCredentials)?;

    if token.expires_at <= OffsetDateTime::now_utc() {
        return Err(Error::InvalidCredentials);
    }

    Ok(token)
}

/// Push the session's expiry out to `duration` from now. Never shortens it.
///
/// On error the jar is dropped, leaving the client's cookie as it was.
pub fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
    local_offset: UtcOffset,
) -> Result<PrivateCookieJar, Error> {
    let token = get_token_from_cookies(&jar)?;
    let new_expiry = expiry_from_now(duration, local_offset)?;

    if new_expiry <= token.expires_at {
        return Ok(jar);
    }

    add_token(
        jar,
        &Token {
            expires_at: new_expiry,
            ..token
        },
    )
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime, UtcOffset};

    use crate::{
        Error,
        auth::{
            UserID,
            cookie::{
                COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, SessionConfig,
                extend_auth_cookie_duration_if_needed, get_token_from_cookies,
                invalidate_auth_cookie, set_auth_cookie,
            },
        },
    };

    fn test_key() -> Key {
        Key::from(&Sha512::digest(b"foobar"))
    }

    /// A jar holding alice's auth cookie, valid for `duration`.
    fn logged_in_jar(duration: Duration) -> PrivateCookieJar {
        let jar = PrivateCookieJar::new(test_key());
        set_auth_cookie(jar, UserID::new(1), duration, UtcOffset::UTC).unwrap()
    }

    #[track_caller]
    fn assert_close(got: OffsetDateTime, want: OffsetDateTime) {
        assert!(
            (got - want).abs() < Duration::seconds(1),
            "got date time {got}, want {want}"
        );
    }

    #[test]
    fn issued_cookie_holds_user_and_expiry() {
        let jar = logged_in_jar(DEFAULT_COOKIE_DURATION);

        let token = get_token_from_cookies(&jar).unwrap();
        let cookie = jar.get(COOKIE_TOKEN).unwrap();

        assert_eq!(token.user_id, UserID::new(1));
        assert_close(
            token.expires_at,
            OffsetDateTime::now_utc() + DEFAULT_COOKIE_DURATION,
        );
        assert_eq!(cookie.expires_datetime(), Some(token.expires_at));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn expiry_uses_local_offset() {
        let offset = UtcOffset::from_hms(13, 0, 0).unwrap();
        let jar = PrivateCookieJar::new(test_key());

        let jar = set_auth_cookie(jar, UserID::new(1), DEFAULT_COOKIE_DURATION, offset).unwrap();

        let token = get_token_from_cookies(&jar).unwrap();
        assert_eq!(token.expires_at.offset(), offset);
    }

    #[test]
    fn missing_cookie_is_an_error() {
        let jar = PrivateCookieJar::new(test_key());

        assert_eq!(get_token_from_cookies(&jar), Err(Error::CookieMissing));
    }

    #[test]
    fn expired_token_is_rejected() {
        let jar = logged_in_jar(-Duration::minutes(1));

        assert_eq!(
            get_token_from_cookies(&jar),
            Err(Error::InvalidCredentials)
        );
    }

    #[test]
    fn refresh_extends_a_shorter_session() {
        let jar = logged_in_jar(DEFAULT_COOKIE_DURATION);

        let jar = extend_auth_cookie_duration_if_needed(jar, Duration::minutes(10), UtcOffset::UTC)
            .unwrap();

        let want = OffsetDateTime::now_utc() + Duration::minutes(10);
        let token = get_token_from_cookies(&jar).unwrap();
        assert_close(token.expires_at, want);
        assert_close(
            jar.get(COOKIE_TOKEN).unwrap().expires_datetime().unwrap(),
            want,
        );
    }

    #[test]
    fn refresh_never_shortens_a_session() {
        let jar = logged_in_jar(DEFAULT_COOKIE_DURATION);
        let want = jar.get(COOKIE_TOKEN).unwrap().expires_datetime();

        let jar = extend_auth_cookie_duration_if_needed(jar, Duration::seconds(5), UtcOffset::UTC)
            .unwrap();

        assert_eq!(jar.get(COOKIE_TOKEN).unwrap().expires_datetime(), want);
    }

    #[test]
    fn invalidated_cookie_is_expired_and_unreadable() {
        let jar = invalidate_auth_cookie(logged_in_jar(DEFAULT_COOKIE_DURATION));

        let cookie = jar.get(COOKIE_TOKEN).unwrap();
        assert_eq!(cookie.value(), "deleted");
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(
            get_token_from_cookies(&jar),
            Err(Error::InvalidCredentials)
        );
    }

    #[test]
    fn session_config_rejects_unknown_timezone() {
        let mut config = SessionConfig {
            cookie_key: test_key(),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: "Etc/UTC".to_owned(),
        };
        assert_eq!(config.local_offset(), Ok(UtcOffset::UTC));

        config.local_timezone = "Mars/Olympus_Mons".to_owned();
        assert_eq!(
            config.local_offset(),
            Err(Error::InvalidTimezoneError("Mars/Olympus_Mons".to_owned()))
        );
    }
}
