//! The crate-wide error type and how each error is shown to the client.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{alert::Alert, internal_server_error::InternalServerError, not_found::NotFoundError};

/// SQLite's extended result code for a failed UNIQUE constraint.
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    // Authentication and sessions.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("the auth cookie is missing")]
    CookieMissing,

    /// The auth cookie's expiry could not be parsed or moved forward.
    /// Holds the underlying error and the offending date string.
    #[error("could not format expiry cookie date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    // Registration.
    /// Holds a message for the user explaining what is wrong with the password.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// bcrypt failed. The message is for the server log only.
    #[error("hashing failed: {0}")]
    HashingError(String),

    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    #[error("the username is already taken")]
    DuplicateUsername,

    #[error("the email address is already registered")]
    DuplicateEmail,

    // Transaction form input.
    #[error("amount must be between 0.01 and 999,999,999")]
    InvalidAmount,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{0} must be at most {1} characters")]
    TooLong(&'static str, usize),

    // Storage.
    /// A lookup matched no rows, or a URL named something that does not exist.
    #[error("the requested resource could not be found")]
    NotFound,

    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    #[error("could not acquire the database lock")]
    DatabaseLockError,

    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    // Server configuration.
    /// The configured name is not a canonical IANA timezone.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, Some(description)) = &value
            && failure.extended_code == SQLITE_CONSTRAINT_UNIQUE
        {
            // The description ends with the offending column, e.g. "... failed: user.email".
            match description.rsplit(' ').next() {
                Some("user.username") => return Error::DuplicateUsername,
                Some("user.email") => return Error::DuplicateEmail,
                _ => {}
            }
        }

        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {error}");
                Error::SqlError(error)
            }
        }
    }
}

/// What the server operator should do about a bad timezone setting.
fn timezone_fix(timezone: &str) -> String {
    format!(
        "Could not get local timezone \"{timezone}\". Check your server settings and \
        ensure the timezone has been set to valid, canonical timezone string"
    )
}

const TIMEZONE_ERROR_TITLE: &str = "Invalid Timezone Settings";

/// Full page responses, for handlers that render pages.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: TIMEZONE_ERROR_TITLE,
                fix: &timezone_fix(&timezone),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// The status code and alert for an HTMX request that failed with this error.
    fn alert(self) -> (StatusCode, Alert) {
        let alert = |message: &str, details: String| Alert::Error {
            message: message.to_owned(),
            details,
        };

        match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                alert(TIMEZONE_ERROR_TITLE, timezone_fix(&timezone)),
            ),
            Error::InvalidAmount | Error::MissingField(_) | Error::TooLong(_, _) => (
                StatusCode::BAD_REQUEST,
                alert("Invalid input", capitalize(&self.to_string())),
            ),
            Error::UpdateMissingTransaction => (
                StatusCode::NOT_FOUND,
                alert(
                    "Could not update transaction",
                    "The transaction could not be found.".to_owned(),
                ),
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                alert(
                    "Could not delete transaction",
                    "The transaction could not be found. Try refreshing the page to see \
                    if the transaction has already been deleted."
                        .to_owned(),
                ),
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                alert(
                    "Not found",
                    "The requested resource could not be found.".to_owned(),
                ),
            ),
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    alert(
                        "Something went wrong",
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                    ),
                )
            }
        }
    }

    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = self.alert();

        (status_code, alert.into_html()).into_response()
    }
}

/// Uppercase the first letter of `text` so error messages read as sentences.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;

    use super::{Error, capitalize};

    #[test]
    fn unique_violation_maps_to_duplicate_username() {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute(
                "CREATE TABLE user (username TEXT UNIQUE, email TEXT UNIQUE)",
                (),
            )
            .unwrap();
        connection
            .execute("INSERT INTO user VALUES ('alice', 'a@example.com')", ())
            .unwrap();

        let username_error = connection
            .execute("INSERT INTO user VALUES ('alice', 'b@example.com')", ())
            .map_err(Error::from)
            .unwrap_err();
        let email_error = connection
            .execute("INSERT INTO user VALUES ('bob', 'a@example.com')", ())
            .map_err(Error::from)
            .unwrap_err();

        assert_eq!(username_error, Error::DuplicateUsername);
        assert_eq!(email_error, Error::DuplicateEmail);
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }

    #[test]
    fn not_found_renders_404_page() {
        assert_eq!(
            Error::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn missing_transaction_alerts_are_not_found() {
        for error in [Error::UpdateMissingTransaction, Error::DeleteMissingTransaction] {
            assert_eq!(error.into_alert_response().status(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let response = Error::TooLong("Category", 100).into_alert_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn capitalizes_first_letter() {
        assert_eq!(capitalize("category is required"), "Category is required");
        assert_eq!(capitalize(""), "");
    }
}
