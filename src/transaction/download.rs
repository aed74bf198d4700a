//! The endpoints for downloading a user's incomes or expenses as CSV.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use time::{format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error,
    auth::UserID,
    csv_export::export_csv,
    timezone::local_now,
    transaction::core::{TransactionKind, get_transactions},
};

const FILE_TIMESTAMP_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year][month][day][hour][minute][second]");

/// The state needed to export records.
#[derive(Debug, Clone)]
pub struct DownloadTransactionsState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for DownloadTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

fn download_transactions(
    kind: TransactionKind,
    state: &DownloadTransactionsState,
    user_id: UserID,
) -> Result<Response, Error> {
    let now = local_now(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_transactions(kind, user_id, &connection)?
    };

    let timestamp = now
        .format(FILE_TIMESTAMP_FORMAT)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), now.to_string()))?;
    let disposition = format!(
        "attachment; filename=\"{}_{timestamp}.csv\"",
        kind.plural()
    );
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), timestamp))?;

    tracing::debug!(
        "exporting {} {} for user {user_id}",
        transactions.len(),
        kind.table()
    );

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export_csv(kind, &transactions),
    )
        .into_response())
}

/// Download the current user's expenses as a CSV file.
pub async fn download_expenses(
    State(state): State<DownloadTransactionsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    download_transactions(TransactionKind::Expense, &state, user_id)
}

/// Download the current user's incomes as a CSV file.
pub async fn download_income(
    State(state): State<DownloadTransactionsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    download_transactions(TransactionKind::Income, &state, user_id)
}
