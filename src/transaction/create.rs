//! The page and endpoint for adding a new income or expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    timezone::local_today,
    transaction::{
        core::{TransactionKind, create_transaction},
        form::{FormAction, TransactionForm, TransactionFormDefaults, transaction_form_view},
        list_page::{NOTICE_ADDED, list_url_with_notice},
    },
};

/// The state needed to show the new record page or create a record.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

fn new_transaction_view(kind: TransactionKind, defaults: &TransactionFormDefaults<'_>) -> Markup {
    let nav_bar = NavBar::new(kind.view_endpoint()).into_html();
    let form =
        transaction_form_view(kind, FormAction::Create(kind.create_api_endpoint()), defaults);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            (form)
        }
    };

    base(&format!("New {}", kind.singular()), &[], &content)
}

fn new_transaction_page(
    kind: TransactionKind,
    state: &CreateTransactionState,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let defaults = TransactionFormDefaults {
        amount: None,
        date: today,
        label: None,
        icon: None,
        note: None,
    };

    Ok(new_transaction_view(kind, &defaults).into_response())
}

/// Display the form for adding an expense, dated today.
pub async fn get_new_expense_page(
    State(state): State<CreateTransactionState>,
) -> Result<Response, Error> {
    new_transaction_page(TransactionKind::Expense, &state)
}

/// Display the form for adding an income, dated today.
pub async fn get_new_income_page(
    State(state): State<CreateTransactionState>,
) -> Result<Response, Error> {
    new_transaction_page(TransactionKind::Income, &state)
}

fn create_transaction_for(
    kind: TransactionKind,
    state: &CreateTransactionState,
    user_id: UserID,
    form: &TransactionForm,
) -> Response {
    let new_transaction = match form.validate(kind) {
        Ok(new_transaction) => new_transaction,
        Err(error) => {
            tracing::debug!("rejected new {}: {error}", kind.table());
            return error.into_alert_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_transaction(kind, user_id, &new_transaction, &connection) {
        Ok(transaction) => {
            tracing::info!("user {user_id} created {} {}", kind.table(), transaction.id);

            (
                HxRedirect(list_url_with_notice(kind, NOTICE_ADDED)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("could not create {}: {error}", kind.table());
            error.into_alert_response()
        }
    }
}

/// A route handler for creating a new expense, redirects to the expenses page on success.
pub async fn create_expense_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    create_transaction_for(TransactionKind::Expense, &state, user_id, &form)
}

/// A route handler for creating a new income, redirects to the income page on success.
pub async fn create_income_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    create_transaction_for(TransactionKind::Income, &state, user_id, &form)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use scraper::Selector;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        auth::{PasswordHash, UserID, create_user},
        db::initialize,
        endpoints,
        test_utils::{
            assert_form_input_with_value, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, must_get_form, parse_html_document,
        },
        transaction::{
            core::{TransactionKind, get_transactions},
            form::TransactionForm,
        },
    };

    use super::{
        CreateTransactionState, create_expense_endpoint, create_income_endpoint,
        get_new_expense_page,
    };

    fn get_state() -> (CreateTransactionState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user(
            "alice",
            "alice@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();

        (
            CreateTransactionState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Etc/UTC".to_owned(),
            },
            user.id,
        )
    }

    fn form(amount: &str, label: &str, icon: Option<&str>) -> TransactionForm {
        TransactionForm {
            amount: amount.to_owned(),
            date: date!(2025 - 06 - 01),
            label: label.to_owned(),
            icon: icon.map(str::to_owned),
            note: None,
        }
    }

    #[tokio::test]
    async fn new_expense_page_defaults_to_today() {
        let (state, _) = get_state();

        let response = get_new_expense_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_EXPENSE, "hx-post");
        let today = OffsetDateTime::now_utc().date().to_string();
        assert_form_input_with_value(&form, "date", "date", &today);
        assert_eq!(
            form.select(&Selector::parse("textarea[name=note]").unwrap())
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn creates_expense_and_redirects_with_notice() {
        let (state, user_id) = get_state();

        let response = create_expense_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(form("42.5", "Groceries", None)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, "/expenses?notice=added");

        let connection = state.db_connection.lock().unwrap();
        let expenses = get_transactions(TransactionKind::Expense, user_id, &connection).unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].label, "Groceries");
        assert_eq!(expenses[0].amount.to_string(), "42.50");
        assert_eq!(expenses[0].icon.as_deref(), Some("💳"));
    }

    #[tokio::test]
    async fn creates_income_with_custom_icon() {
        let (state, user_id) = get_state();

        let response = create_income_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(form("1000", "Salary", Some("💰"))),
        )
        .await;

        assert_hx_redirect(&response, "/income?notice=added");
        let connection = state.db_connection.lock().unwrap();
        let incomes = get_transactions(TransactionKind::Income, user_id, &connection).unwrap();
        assert_eq!(incomes[0].icon.as_deref(), Some("💰"));
    }

    #[tokio::test]
    async fn invalid_form_returns_alert_and_creates_nothing() {
        let (state, user_id) = get_state();

        let response = create_expense_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(form("0", "Groceries", None)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let connection = state.db_connection.lock().unwrap();
        assert!(
            get_transactions(TransactionKind::Expense, user_id, &connection)
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn blank_label_is_rejected() {
        let (state, user_id) = get_state();

        let response = create_income_endpoint(
            State(state),
            Extension(user_id),
            Form(form("10", "  ", None)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
