//! The log-in page and the endpoint that checks credentials and issues the auth cookie.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        SessionConfig, User, get_user_by_username, invalidate_auth_cookie, normalize_redirect_url,
        register_user::REGISTRATION_SUCCESS_MESSAGE, set_auth_cookie,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, InputField, base, loading_spinner, log_in_register, success_notice,
    },
};

pub const INVALID_USERNAME_ERROR_MSG: &str = "Invalid username";
pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect password";
const INTERNAL_ERROR_MSG: &str = "An internal error occurred. Please try again later.";

/// How long the auth cookie lasts when "remember me" is ticked.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to check credentials and issue the auth cookie.
#[derive(Debug, Clone)]
pub struct LoginState {
    pub session: SessionConfig,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            session: SessionConfig::from_ref(state),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.session.cookie_key.clone()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LogInQuery {
    pub redirect_url: Option<String>,
    /// Set when the client arrives straight from registration.
    pub registered: Option<bool>,
}

/// The fields submitted by the log-in form.
///
/// `remember_me` comes from a checkbox, so any value means it was ticked.
#[derive(Debug, Deserialize)]
pub struct LogInForm {
    pub username: String,
    pub password: String,
    pub remember_me: Option<String>,
    pub redirect_url: Option<String>,
}

/// Why a log-in attempt was turned away.
#[derive(Debug, PartialEq)]
enum Refusal {
    UnknownUser,
    WrongPassword,
    Internal,
}

impl Refusal {
    fn message(&self) -> &'static str {
        match self {
            Refusal::UnknownUser => INVALID_USERNAME_ERROR_MSG,
            Refusal::WrongPassword => INVALID_CREDENTIALS_ERROR_MSG,
            Refusal::Internal => INTERNAL_ERROR_MSG,
        }
    }
}

fn log_in_form(username: &str, refusal: Option<&Refusal>, redirect_url: Option<&str>) -> Markup {
    let username_error = refusal
        .filter(|refusal| **refusal == Refusal::UnknownUser)
        .map(Refusal::message);
    let password_error = refusal
        .filter(|refusal| **refusal != Refusal::UnknownUser)
        .map(Refusal::message);

    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-indicator="#indicator"
            hx-disabled-elt="#password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (InputField::new("Username", "username", "text")
                .value(username)
                .error(username_error)
                .into_html())
            (InputField::new("Password", "password", "password")
                .error(password_error)
                .into_html())

            div class="flex items-center gap-x-3"
            {
                input type="checkbox" name="remember_me" id="remember_me" class="rounded-xs";
                label for="remember_me" class="text-sm text-gray-900 dark:text-white"
                {
                    "Keep me logged in for a week"
                }
            }

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                "Log in"
            }

            p class="text-sm text-gray-500 dark:text-gray-400"
            {
                "New here? "
                a
                    href=(endpoints::REGISTER_VIEW)
                    class="font-semibold text-blue-600 hover:underline"
                {
                    "Create an account"
                }
            }
        }
    }
}

/// `raw_url` if it is safe to send the client to after logging in.
fn checked_redirect_url(raw_url: Option<&str>) -> Option<String> {
    let raw_url = raw_url?;
    let redirect_url = normalize_redirect_url(raw_url);

    if redirect_url.is_none() {
        tracing::warn!("ignoring unsafe redirect URL {raw_url}");
    }

    redirect_url
}

/// Display the log-in page, with a notice when the client has just registered.
pub async fn get_log_in_page(Query(query): Query<LogInQuery>) -> Response {
    let redirect_url = checked_redirect_url(query.redirect_url.as_deref());
    let content = html! {
        @if query.registered == Some(true) {
            (success_notice(REGISTRATION_SUCCESS_MESSAGE))
        }

        (log_in_form("", None, redirect_url.as_deref()))
    };

    base("Log In", &[], &log_in_register("Log in to your account", &content)).into_response()
}

fn authenticate(state: &LoginState, username: &str, password: &str) -> Result<User, Refusal> {
    let lookup = match state.db_connection.lock() {
        Ok(connection) => get_user_by_username(username, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            Err(Error::DatabaseLockError)
        }
    };

    let user = match lookup {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Refusal::UnknownUser),
        Err(error) => {
            tracing::error!("could not look up user \"{username}\": {error}");
            return Err(Refusal::Internal);
        }
    };

    match user.password_hash.verify(password) {
        Ok(true) => Ok(user),
        Ok(false) => Err(Refusal::WrongPassword),
        Err(error) => {
            tracing::error!("could not verify the password of user {}: {error}", user.id);
            Err(Refusal::Internal)
        }
    }
}

/// Check the submitted credentials and log the user in.
///
/// On success the auth cookie is set and the client is sent to the dashboard,
/// or to the page they were trying to reach. Otherwise the form is returned
/// with a message under the offending field.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(form): Form<LogInForm>,
) -> Response {
    let redirect_url = checked_redirect_url(form.redirect_url.as_deref());
    let username = form.username.trim();

    let user = match authenticate(&state, username, &form.password) {
        Ok(user) => user,
        Err(refusal) => {
            return log_in_form(username, Some(&refusal), redirect_url.as_deref()).into_response();
        }
    };

    let lifetime = match form.remember_me {
        Some(_) => REMEMBER_ME_COOKIE_DURATION,
        None => state.session.cookie_duration,
    };
    let updated_jar = state
        .session
        .local_offset()
        .and_then(|local_offset| set_auth_cookie(jar.clone(), user.id, lifetime, local_offset));

    match updated_jar {
        Ok(updated_jar) => {
            tracing::info!("user {} logged in", user.id);
            let destination = redirect_url.unwrap_or_else(|| endpoints::DASHBOARD_VIEW.to_owned());

            (StatusCode::SEE_OTHER, HxRedirect(destination), updated_jar).into_response()
        }
        Err(error) => {
            tracing::error!("could not set the auth cookie for user {}: {error}", user.id);

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
                .into_response()
        }
    }
}
