//! The registration page for creating a new user account.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{
        MIN_PASSWORD_LENGTH, PasswordHash, User, ValidatedPassword, create_user, validate_email,
    },
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, InputField, LINK_STYLE, base, loading_spinner, log_in_register},
    internal_server_error::get_internal_server_error_redirect,
};

/// The message shown on the log-in page after a successful registration.
pub const REGISTRATION_SUCCESS_MESSAGE: &str = "Account created successfully!";

/// The inputs of the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Username,
    Email,
    Password,
    ConfirmPassword,
}

/// Why a registration was turned away.
#[derive(Debug)]
enum Refusal {
    /// The user can correct the field and submit again.
    Invalid(Field, String),
    /// The account could not be created for reasons outside the user's control.
    Failed(Error),
}

impl Refusal {
    fn invalid(field: Field, message: &str) -> Self {
        Self::Invalid(field, message.to_owned())
    }
}

fn registration_form(form: &RegisterForm, problem: Option<(Field, &str)>) -> Markup {
    let error_for = |field: Field| {
        problem
            .filter(|(problem_field, _)| *problem_field == field)
            .map(|(_, message)| message)
    };

    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            (InputField::new("Username", "username", "text")
                .value(&form.username)
                .error(error_for(Field::Username))
                .into_html())
            (InputField::new("Email", "email", "email")
                .value(&form.email)
                .error(error_for(Field::Email))
                .into_html())
            (InputField::new("Password", "password", "password")
                .min_length(MIN_PASSWORD_LENGTH)
                .error(error_for(Field::Password))
                .into_html())
            (InputField::new("Confirm Password", "confirm_password", "password")
                .min_length(MIN_PASSWORD_LENGTH)
                .error(error_for(Field::ConfirmPassword))
                .into_html())

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                "Create Account"
            }

            p class="text-sm text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                a href=(endpoints::LOG_IN_VIEW) class=(LINK_STYLE) { "Log in here" }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let form = registration_form(&RegisterForm::default(), None);
    base("Register", &[], &log_in_register("Create an account", &form)).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Check the fields a user can get wrong, in the order they appear on the form.
fn check_form(form: &RegisterForm) -> Result<ValidatedPassword, Refusal> {
    if form.username.is_empty() {
        return Err(Refusal::invalid(Field::Username, "Username is required"));
    }

    validate_email(&form.email).map_err(|error| {
        tracing::debug!("rejected registration: {error}");
        Refusal::invalid(Field::Email, "Enter a valid email address")
    })?;

    let password = ValidatedPassword::new(&form.password).map_err(|error| match error {
        Error::TooWeak(message) => Refusal::Invalid(Field::Password, message),
        error => Refusal::Failed(error),
    })?;

    if form.password != form.confirm_password {
        return Err(Refusal::invalid(Field::ConfirmPassword, "Passwords do not match"));
    }

    Ok(password)
}

fn create_account(state: &RegistrationState, form: &RegisterForm) -> Result<User, Refusal> {
    let password = check_form(form)?;
    let password_hash =
        PasswordHash::new(password, PasswordHash::DEFAULT_COST).map_err(Refusal::Failed)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Refusal::Failed(Error::DatabaseLockError))?;

    create_user(&form.username, &form.email, password_hash, &connection).map_err(
        |error| match error {
            Error::DuplicateUsername => {
                Refusal::invalid(Field::Username, "That username is already taken")
            }
            Error::DuplicateEmail => {
                Refusal::invalid(Field::Email, "That email address is already registered")
            }
            error => Refusal::Failed(error),
        },
    )
}

/// Handle a registration request.
///
/// On success the client is redirected to the log-in page, otherwise the form
/// is returned with an error message next to the offending field.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Form(mut user_data): Form<RegisterForm>,
) -> Response {
    user_data.username = user_data.username.trim().to_owned();
    user_data.email = user_data.email.trim().to_owned();

    match create_account(&state, &user_data) {
        Ok(user) => {
            tracing::info!("registered user {} ({})", user.username, user.id);
            let redirect_url = format!("{}?registered=true", endpoints::LOG_IN_VIEW);

            (HxRedirect(redirect_url), StatusCode::SEE_OTHER).into_response()
        }
        Err(Refusal::Invalid(field, message)) => {
            registration_form(&user_data, Some((field, message.as_str()))).into_response()
        }
        Err(Refusal::Failed(error)) => {
            tracing::error!("could not register user {}: {error}", user_data.username);
            get_internal_server_error_redirect()
        }
    }
}

#[cfg(test)]
mod get_register_page_tests {
    use crate::{
        auth::register_user::get_register_page,
        endpoints,
        test_utils::{assert_content_type, assert_status_ok, assert_valid_html, parse_html_document},
    };

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;
        assert_status_ok(&response);
        assert_content_type(&response, "text/html; charset=utf-8");

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let h1_selector = scraper::Selector::parse("h1").unwrap();
        let titles: Vec<_> = document.select(&h1_selector).collect();
        assert_eq!(titles.len(), 1, "want 1 h1, got {}", titles.len());
        assert_eq!(titles[0].text().collect::<String>().trim(), "Create an account");

        let form_selector = scraper::Selector::parse("form").unwrap();
        let form = document
            .select(&form_selector)
            .next()
            .expect("could not find registration form");
        assert_eq!(form.value().attr("hx-post"), Some(endpoints::USERS));

        for (type_, id) in [
            ("text", "username"),
            ("email", "email"),
            ("password", "password"),
            ("password", "confirm_password"),
        ] {
            let selector_string = format!("input[type={type_}]#{id}");
            let input_selector = scraper::Selector::parse(&selector_string).unwrap();
            let inputs = form.select(&input_selector).count();
            assert_eq!(inputs, 1, "want 1 {type_} input #{id}, got {inputs}");
        }

        let link_selector = scraper::Selector::parse("a[href]").unwrap();
        let links: Vec<_> = form
            .select(&link_selector)
            .filter_map(|link| link.value().attr("href"))
            .collect();
        assert_eq!(links, [endpoints::LOG_IN_VIEW]);
    }
}
