//! The pages listing a user's incomes or expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    AppState, Error,
    aggregation::bucket_by_day,
    auth::UserID,
    charts::{PageChart, bar_chart, chart_container, charts_scripts},
    endpoints::format_endpoint,
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links, format_amount, format_decimal, success_notice,
    },
    navigation::NavBar,
    timezone::local_today,
    transaction::core::{Transaction, TransactionKind, get_transactions},
};

/// The number of days shown in the chart at the top of the page.
const CHART_WINDOW_DAYS: u32 = 60;

/// The state needed for the income and expense pages.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The one-off message set by the create and edit endpoints when they redirect here.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

pub const NOTICE_ADDED: &str = "added";
pub const NOTICE_UPDATED: &str = "updated";

fn notice_message(kind: TransactionKind, notice: &str) -> Option<&'static str> {
    match (kind, notice) {
        (TransactionKind::Expense, NOTICE_ADDED) => Some("Expense added successfully."),
        (TransactionKind::Income, NOTICE_ADDED) => Some("Income added successfully."),
        (TransactionKind::Expense, NOTICE_UPDATED) => Some("Expense updated."),
        (TransactionKind::Income, NOTICE_UPDATED) => Some("Income updated successfully."),
        _ => None,
    }
}

/// The URL of the list page for `kind` showing `notice`.
pub fn list_url_with_notice(kind: TransactionKind, notice: &str) -> String {
    format!("{}?notice={notice}", kind.view_endpoint())
}

/// Display the current user's expenses.
pub async fn get_expenses_page(
    State(state): State<TransactionsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<NoticeQuery>,
) -> Result<Response, Error> {
    transactions_page(TransactionKind::Expense, &state, user_id, &query)
}

/// Display the current user's incomes.
pub async fn get_income_page(
    State(state): State<TransactionsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<NoticeQuery>,
) -> Result<Response, Error> {
    transactions_page(TransactionKind::Income, &state, user_id, &query)
}

fn transactions_page(
    kind: TransactionKind,
    state: &TransactionsPageState,
    user_id: UserID,
    query: &NoticeQuery,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_transactions(kind, user_id, &connection).inspect_err(|error| {
            tracing::error!("could not get {} for user {user_id}: {error}", kind.table())
        })?
    };

    let buckets = bucket_by_day(&transactions, today, CHART_WINDOW_DAYS);
    let chart = PageChart::new(
        "daily-chart",
        bar_chart(
            &format!("{} by day", kind.plural()),
            "Last 60 days",
            kind.plural(),
            &buckets,
        ),
    );
    let notice = query
        .notice
        .as_deref()
        .and_then(|notice| notice_message(kind, notice));

    Ok(transactions_view(kind, &transactions, notice, &chart).into_response())
}

fn transactions_view(
    kind: TransactionKind,
    transactions: &[Transaction],
    notice: Option<&str>,
    chart: &PageChart,
) -> Markup {
    let nav_bar = NavBar::new(kind.view_endpoint()).into_html();
    let total: Decimal = transactions
        .iter()
        .map(|transaction| transaction.amount.value())
        .sum();
    let is_expense = kind == TransactionKind::Expense;
    let column_count = if is_expense { 6 } else { 5 };

    let table_row = |transaction: &Transaction| {
        let action_links = edit_delete_action_links(
            &format_endpoint(kind.edit_view_endpoint(), transaction.id),
            &format_endpoint(kind.record_api_endpoint(), transaction.id),
            &format!(
                "Are you sure you want to delete the {} '{}'? This cannot be undone.",
                kind.singular().to_lowercase(),
                transaction.label
            ),
            "closest tr",
            "delete",
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    time datetime=(transaction.date) { (transaction.date) }
                }

                td class=(TABLE_CELL_STYLE) { (transaction.icon.as_deref().unwrap_or_default()) }

                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (transaction.label)
                }

                td class="px-6 py-4 text-right tabular-nums"
                {
                    (format_amount(transaction.amount))
                }

                @if is_expense {
                    td class=(TABLE_CELL_STYLE) { (transaction.note.as_deref().unwrap_or_default()) }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (action_links)
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full lg:max-w-5xl space-y-4"
            {
                @if let Some(notice) = notice {
                    (success_notice(notice))
                }

                header class="flex justify-between flex-wrap items-end gap-2"
                {
                    div
                    {
                        h1 class="text-xl font-bold" { (kind.plural()) }
                        p id="total" class="text-sm text-gray-500 dark:text-gray-400"
                        {
                            "Total: " (format_decimal(total))
                        }
                    }

                    div class="flex gap-4"
                    {
                        a href=(kind.download_endpoint()) class=(LINK_STYLE) download
                        {
                            "Download CSV"
                        }

                        a href=(kind.new_view_endpoint()) class=(LINK_STYLE)
                        {
                            "Add " (kind.singular())
                        }
                    }
                }

                (chart_container(chart))

                section class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Icon" }
                                th scope="col" class=(TABLE_CELL_STYLE) { (kind.label_name()) }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                                @if is_expense {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Note" }
                                }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for transaction in transactions {
                                (table_row(transaction))
                            }

                            @if transactions.is_empty() {
                                tr
                                {
                                    td
                                        colspan=(column_count)
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "Nothing here yet. Add your first "
                                        (kind.singular().to_lowercase())
                                        " "
                                        a href=(kind.new_view_endpoint()) class=(LINK_STYLE)
                                        {
                                            "here"
                                        }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base(kind.plural(), &charts_scripts(std::slice::from_ref(chart)), &content)
}
