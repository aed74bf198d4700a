//! The page and endpoint for editing an existing income or expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints::format_endpoint,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
    transaction::{
        core::{TransactionId, TransactionKind, get_transaction, update_transaction},
        form::{FormAction, TransactionForm, TransactionFormDefaults, transaction_form_view},
        list_page::{NOTICE_UPDATED, list_url_with_notice},
    },
};

/// The state needed to edit a record.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn edit_transaction_page(
    kind: TransactionKind,
    state: &EditTransactionState,
    user_id: UserID,
    id: TransactionId,
) -> Result<Response, Error> {
    let transaction = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_transaction(kind, id, user_id, &connection)?
    };

    let update_url = format_endpoint(kind.record_api_endpoint(), transaction.id);
    let defaults = TransactionFormDefaults {
        amount: Some(transaction.amount),
        date: transaction.date,
        label: Some(&transaction.label),
        icon: transaction.icon.as_deref(),
        note: transaction.note.as_deref(),
    };
    let form = transaction_form_view(kind, FormAction::Update(&update_url), &defaults);

    let content = html! {
        (NavBar::new(kind.view_endpoint()).into_html())

        div class=(FORM_CONTAINER_STYLE)
        {
            (form)
        }
    };

    Ok(base(&format!("Edit {}", kind.singular()), &[], &content).into_response())
}

/// Display the form for editing the expense with `id`.
///
/// Shows the 404 page if the expense does not exist or belongs to someone else.
pub async fn get_edit_expense_page(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(id): Path<TransactionId>,
) -> Result<Response, Error> {
    edit_transaction_page(TransactionKind::Expense, &state, user_id, id)
}

/// Display the form for editing the income with `id`.
pub async fn get_edit_income_page(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(id): Path<TransactionId>,
) -> Result<Response, Error> {
    edit_transaction_page(TransactionKind::Income, &state, user_id, id)
}

fn update_transaction_for(
    kind: TransactionKind,
    state: &EditTransactionState,
    user_id: UserID,
    id: TransactionId,
    form: &TransactionForm,
) -> Response {
    let update = match form.validate(kind) {
        Ok(update) => update,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_transaction(kind, id, user_id, &update, &connection) {
        Ok(0) => Error::UpdateMissingTransaction.into_alert_response(),
        Ok(_) => (
            HxRedirect(list_url_with_notice(kind, NOTICE_UPDATED)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not update {} {id}: {error}", kind.table());
            error.into_alert_response()
        }
    }
}

/// A route handler for updating an expense, redirects to the expenses page on success.
pub async fn update_expense_endpoint(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(id): Path<TransactionId>,
    Form(form): Form<TransactionForm>,
) -> Response {
    update_transaction_for(TransactionKind::Expense, &state, user_id, id, &form)
}

/// A route handler for updating an income, redirects to the income page on success.
pub async fn update_income_endpoint(
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(id): Path<TransactionId>,
    Form(form): Form<TransactionForm>,
) -> Response {
    update_transaction_for(TransactionKind::Income, &state, user_id, id, &form)
}
