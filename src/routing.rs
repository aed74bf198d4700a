//! URL routing for the whole app.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, auth_guard_hx, get_log_in_page, get_log_out, get_register_page, post_log_in,
        register_user,
    },
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    transaction::{
        create_expense_endpoint, create_income_endpoint, delete_expense_endpoint,
        delete_income_endpoint, download_expenses, download_income, get_edit_expense_page,
        get_edit_income_page, get_expenses_page, get_income_page, get_new_expense_page,
        get_new_income_page, update_expense_endpoint, update_income_endpoint,
    },
};

/// Every route of the app. Pages and HTMX endpoints that need a session sit
/// behind the auth guards.
pub fn build_router(state: AppState) -> Router {
    let page_guard = middleware::from_fn_with_state(state.clone(), auth_guard);
    let htmx_guard = middleware::from_fn_with_state(state.clone(), auth_guard_hx);

    Router::new()
        .merge(guarded_pages().layer(page_guard))
        .merge(guarded_htmx_endpoints().layer(htmx_guard))
        .merge(public_routes())
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(endpoints::INTERNAL_ERROR_VIEW, get(get_internal_server_error_page))
}

fn guarded_pages() -> Router<AppState> {
    Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::EXPENSES_VIEW, get(get_expenses_page))
        .route(endpoints::NEW_EXPENSE_VIEW, get(get_new_expense_page))
        .route(endpoints::EDIT_EXPENSE_VIEW, get(get_edit_expense_page))
        .route(endpoints::DOWNLOAD_EXPENSES, get(download_expenses))
        .route(endpoints::INCOME_VIEW, get(get_income_page))
        .route(endpoints::NEW_INCOME_VIEW, get(get_new_income_page))
        .route(endpoints::EDIT_INCOME_VIEW, get(get_edit_income_page))
        .route(endpoints::DOWNLOAD_INCOME, get(download_income))
}

/// Requests sent by HTMX, which needs `HX-Redirect` rather than a 303 to leave the page.
fn guarded_htmx_endpoints() -> Router<AppState> {
    Router::new()
        .route(endpoints::POST_EXPENSE, post(create_expense_endpoint))
        .route(
            endpoints::EXPENSE_API,
            put(update_expense_endpoint).delete(delete_expense_endpoint),
        )
        .route(endpoints::POST_INCOME, post(create_income_endpoint))
        .route(
            endpoints::INCOME_API,
            put(update_income_endpoint).delete(delete_income_endpoint),
        )
}

/// The site root opens the dashboard.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
