//! A personal expense tracker served as server-rendered HTML.
//!
//! Users register, log in and record incomes and expenses. Each kind has a
//! list page with a running total and CSV download, and the dashboard
//! summarises both with totals, recent activity and charts.

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod aggregation;
mod alert;
mod amount;
mod app_state;
mod auth;
mod charts;
mod csv_export;
mod dashboard;
mod db;
mod endpoints;
mod error;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod routing;
#[cfg(test)]
mod test_utils;
mod timezone;
mod transaction;

pub use aggregation::{
    Bucket, Totals, TransactionItem, bucket_by_category, bucket_by_day, build_recent_transactions,
    compute_totals,
};
pub use amount::Amount;
pub use app_state::AppState;
pub use auth::{
    PasswordHash, User, UserID, ValidatedPassword, create_user, get_user_by_username,
    update_password,
};
pub use csv_export::build_export_rows;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::{NewTransaction, Transaction, TransactionKind, create_transaction};

/// How long in-flight requests get to finish once shutdown starts.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// Wait for ctrl+c or SIGTERM, then ask the server behind `handle` to stop
/// once in-flight requests finish.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let received = shutdown_signal().await;
    tracing::info!("received {received}, shutting down");

    handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
}

/// Resolves with the name of the first shutdown signal received.
///
/// A signal that cannot be listened for is logged and never fires.
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("could not listen for ctrl+c: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                tracing::error!("could not listen for SIGTERM: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "ctrl+c",
        _ = terminate => "SIGTERM",
    }
}
