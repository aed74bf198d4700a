//! The endpoints for deleting an income or expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    auth::UserID,
    transaction::core::{TransactionId, TransactionKind, delete_transaction},
};

/// The state needed to delete a record.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn delete_transaction_for(
    kind: TransactionKind,
    state: &DeleteTransactionState,
    user_id: UserID,
    id: TransactionId,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_transaction(kind, id, user_id, &connection) {
        Ok(0) => Error::DeleteMissingTransaction.into_alert_response(),
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(_) => Alert::SuccessSimple {
            message: format!("{} deleted.", kind.singular()),
        }
        .into_response(),
        Err(error) => {
            tracing::error!("could not delete {} {id}: {error}", kind.table());
            error.into_alert_response()
        }
    }
}

/// A route handler for deleting an expense.
pub async fn delete_expense_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(id): Path<TransactionId>,
) -> Response {
    delete_transaction_for(TransactionKind::Expense, &state, user_id, id)
}

/// A route handler for deleting an income.
pub async fn delete_income_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(id): Path<TransactionId>,
) -> Response {
    delete_transaction_for(TransactionKind::Income, &state, user_id, id)
}
