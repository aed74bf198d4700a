use std::{env, fs::OpenOptions, net::SocketAddr, process::exit, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

use expense_tracker::{AppState, build_router, graceful_shutdown, logging_middleware};

/// Serve the expense tracker over HTTP.
///
/// The cookie secret is read from the SECRET environment variable.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database, created if missing.
    #[arg(long)]
    db_path: String,

    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Canonical timezone name that decides what "today" is, e.g. "Pacific/Auckland".
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,

    /// Log the headers and body of every request and response.
    #[arg(long)]
    log_bodies: bool,
}

const DEBUG_LOG_PATH: &str = "debug.log";

/// Log `message` and stop the process. Used for startup errors only.
fn fail(message: &str) -> ! {
    tracing::error!("{message}");
    exit(1);
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    if time_tz::timezones::get_by_name(&args.timezone).is_none() {
        fail(&format!("Unknown timezone \"{}\"", args.timezone));
    }

    let secret = env::var("SECRET")
        .unwrap_or_else(|_| fail("The environment variable SECRET must be set"));

    let connection = Connection::open(&args.db_path).unwrap_or_else(|error| {
        fail(&format!("Could not open the database at {}: {error}", args.db_path))
    });
    let state = AppState::new(connection, &secret, &args.timezone)
        .unwrap_or_else(|error| fail(&format!("Could not initialize the database: {error}")));

    let mut router = build_router(state);
    if args.log_bodies {
        router = router.layer(middleware::from_fn(logging_middleware));
    }
    router = with_request_spans(router);

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    tracing::info!("HTTP server listening on {addr}");

    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        fail(&format!("The server stopped unexpectedly: {error}"));
    }
}

/// INFO and above to stdout, DEBUG and above to the debug log file.
fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(LevelFilter::INFO);

    let debug_log = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(DEBUG_LOG_PATH)
    {
        Ok(file) => Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .with_filter(LevelFilter::DEBUG),
        ),
        Err(error) => {
            eprintln!("Could not open {DEBUG_LOG_PATH}, logging to stdout only: {error}");
            None
        }
    };

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();
}

/// Open a span per request, named after the route that matched.
fn with_request_spans(router: Router) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request| {
            let matched_path = request
                .extensions()
                .get::<MatchedPath>()
                .map(MatchedPath::as_str);

            tracing::debug_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                matched_path,
            )
        })
        // Handlers log their own errors.
        .on_failure(());

    router.layer(trace_layer)
}
