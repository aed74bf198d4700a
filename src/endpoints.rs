//! Route paths. Paths with a `{param}` segment are filled in with [format_endpoint].

// Pages.
pub const ROOT: &str = "/";
pub const DASHBOARD_VIEW: &str = "/dashboard";
pub const EXPENSES_VIEW: &str = "/expenses";
pub const NEW_EXPENSE_VIEW: &str = "/expenses/new";
pub const EDIT_EXPENSE_VIEW: &str = "/expenses/{expense_id}/edit";
pub const DOWNLOAD_EXPENSES: &str = "/expenses/download";
pub const INCOME_VIEW: &str = "/income";
pub const NEW_INCOME_VIEW: &str = "/income/new";
pub const EDIT_INCOME_VIEW: &str = "/income/{income_id}/edit";
pub const DOWNLOAD_INCOME: &str = "/income/download";
pub const REGISTER_VIEW: &str = "/register";
pub const LOG_IN_VIEW: &str = "/log_in";
/// Where HTMX requests are sent when the server fails.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
pub const STATIC: &str = "/static";

// HTMX endpoints.
pub const LOG_IN_API: &str = "/api/log_in";
pub const LOG_OUT: &str = "/api/log_out";
pub const USERS: &str = "/api/users";
pub const POST_EXPENSE: &str = "/api/expenses";
/// Updates (PUT) or deletes (DELETE) one expense.
pub const EXPENSE_API: &str = "/api/expenses/{expense_id}";
pub const POST_INCOME: &str = "/api/income";
/// Updates (PUT) or deletes (DELETE) one income.
pub const INCOME_API: &str = "/api/income/{income_id}";

/// Replace the first `{param}` segment of `endpoint_path` with `id`.
///
/// Paths without a parameter are returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some((before, rest)) = endpoint_path.split_once('{') else {
        return endpoint_path.to_owned();
    };
    let after = rest.split_once('}').map_or("", |(_, after)| after);

    format!("{before}{id}{after}")
}
