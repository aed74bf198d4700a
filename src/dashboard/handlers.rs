//! Dashboard HTTP handler and view rendering.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    aggregation::{
        Bucket, Totals, TransactionItem, bucket_by_category, bucket_by_day,
        build_recent_transactions, compute_totals, latest,
    },
    auth::UserID,
    charts::{PageChart, bar_chart, chart_container, charts_scripts, donut_chart},
    dashboard::cards::{recent_kind_card, recent_transactions_card, summary_cards},
    endpoints,
    html::{base, link},
    navigation::NavBar,
    timezone::local_today,
    transaction::{Transaction, TransactionKind, get_transactions},
};

const RECENT_TRANSACTIONS_LIMIT: usize = 6;
const RECENT_EXPENSES_LIMIT: usize = 5;
const RECENT_INCOMES_LIMIT: usize = 6;
const EXPENSE_CHART_WINDOW_DAYS: u32 = 30;
const INCOME_CHART_WINDOW_DAYS: u32 = 60;
const INCOME_SOURCES_LIMIT: usize = 6;

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading incomes and expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Holds all the data needed to render the dashboard.
struct DashboardData {
    totals: Totals,
    recent_transactions: Vec<TransactionItem>,
    recent_expenses: Vec<Transaction>,
    recent_incomes: Vec<Transaction>,
    charts: [PageChart; 3],
}

/// Display a page with an overview of the user's incomes and expenses.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let (incomes, expenses) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let incomes = get_transactions(TransactionKind::Income, user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get incomes: {error}"))?;
        let expenses = get_transactions(TransactionKind::Expense, user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get expenses: {error}"))?;

        (incomes, expenses)
    };

    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW);

    if incomes.is_empty() && expenses.is_empty() {
        return Ok(dashboard_no_data_view(nav_bar).into_response());
    }

    let data = build_dashboard_data(&incomes, &expenses, today);

    Ok(dashboard_view(nav_bar, &data).into_response())
}

fn build_dashboard_data(
    incomes: &[Transaction],
    expenses: &[Transaction],
    today: Date,
) -> DashboardData {
    let totals = compute_totals(incomes, expenses);

    DashboardData {
        totals,
        recent_transactions: build_recent_transactions(
            incomes,
            expenses,
            RECENT_TRANSACTIONS_LIMIT,
        ),
        recent_expenses: latest(expenses, RECENT_EXPENSES_LIMIT),
        recent_incomes: latest(incomes, RECENT_INCOMES_LIMIT),
        charts: build_dashboard_charts(&totals, incomes, expenses, today),
    }
}

/// Creates the balance overview, daily expenses and income sources charts.
fn build_dashboard_charts(
    totals: &Totals,
    incomes: &[Transaction],
    expenses: &[Transaction],
    today: Date,
) -> [PageChart; 3] {
    let overview = [
        ("Total Balance", totals.balance),
        ("Total Income", totals.total_income),
        ("Total Expenses", totals.total_expense),
    ]
    .map(|(label, total)| Bucket {
        label: label.to_owned(),
        total,
    });

    [
        PageChart::new(
            "financial-overview-chart",
            donut_chart("Financial Overview", "", "Overview", &overview),
        ),
        PageChart::new(
            "expenses-chart",
            bar_chart(
                "Expenses",
                "Last 30 days",
                "Spent",
                &bucket_by_day(expenses, today, EXPENSE_CHART_WINDOW_DAYS),
            ),
        ),
        PageChart::new(
            "income-chart",
            donut_chart(
                "Income by Source",
                "Last 60 days",
                "Income",
                &bucket_by_category(
                    incomes,
                    today,
                    INCOME_CHART_WINDOW_DAYS,
                    INCOME_SOURCES_LIMIT,
                ),
            ),
        ),
    ]
}

/// Renders the dashboard page when the user has no incomes or expenses.
fn dashboard_no_data_view(nav_bar: NavBar) -> Markup {
    let nav_bar = nav_bar.into_html();
    let new_expense_link = link(endpoints::NEW_EXPENSE_VIEW, "expense");
    let new_income_link = link(endpoints::NEW_INCOME_VIEW, "income");

    let content = html!(
        (nav_bar)

        div class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Your summary and charts will show up here once you add an "
                (new_expense_link) " or an " (new_income_link) "."
            }
        }
    );

    base("Dashboard", &[], &content)
}

fn dashboard_view(nav_bar: NavBar, data: &DashboardData) -> Markup {
    let nav_bar = nav_bar.into_html();
    let [overview_chart, expenses_chart, income_chart] = &data.charts;

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            (summary_cards(&data.totals))

            section class="grid grid-cols-1 xl:grid-cols-2 gap-4 w-full mb-4"
            {
                (recent_transactions_card(&data.recent_transactions))
                (chart_container(overview_chart))
            }

            section class="grid grid-cols-1 xl:grid-cols-2 gap-4 w-full mb-4"
            {
                (recent_kind_card(TransactionKind::Expense, &data.recent_expenses))
                (chart_container(expenses_chart))
            }

            section class="grid grid-cols-1 xl:grid-cols-2 gap-4 w-full mb-4"
            {
                (chart_container(income_chart))
                (recent_kind_card(TransactionKind::Income, &data.recent_incomes))
            }
        }
    );

    base("Dashboard", &charts_scripts(&data.charts), &content)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use scraper::{Html, Selector};
    use time::{Duration, OffsetDateTime, macros::date};

    use crate::{
        amount::Amount,
        auth::{PasswordHash, UserID, create_user},
        db::initialize,
        test_utils::{assert_valid_html, parse_html_document},
        transaction::{Transaction, TransactionKind, create_transaction},
    };

    use super::{DashboardState, build_dashboard_data, get_dashboard_page};

    fn get_state() -> (DashboardState, UserID) {
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
            DashboardState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Etc/UTC".to_owned(),
            },
            user.id,
        )
    }

    fn insert(
        state: &DashboardState,
        kind: TransactionKind,
        user_id: UserID,
        amount: i64,
        days_ago: i64,
        label: &str,
    ) {
        let date = OffsetDateTime::now_utc().date() - Duration::days(days_ago);
        let connection = state.db_connection.lock().unwrap();
        create_transaction(
            kind,
            user_id,
            &Transaction::build(Amount::new(amount.into()), date, label),
            &connection,
        )
        .unwrap();
    }

    fn texts(html: &Html, selector: &str) -> Vec<String> {
        html.select(&Selector::parse(selector).unwrap())
            .map(|element| element.text().collect::<String>().trim().to_owned())
            .collect()
    }

    fn transaction(id: i64, amount: i64, date: time::Date, label: &str) -> Transaction {
        Transaction {
            id,
            owner: UserID::new(1),
            amount: Amount::new(amount.into()),
            date,
            label: label.to_owned(),
            icon: None,
            note: None,
        }
    }

    #[tokio::test]
    async fn no_data_view_links_to_new_record_pages() {
        let (state, user_id) = get_state();

        let response = get_dashboard_page(State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(texts(&html, "h2"), ["Nothing here yet..."]);
        let links: Vec<_> = html
            .select(&Selector::parse("main a, div a").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .collect();
        assert!(links.contains(&"/expenses/new"));
        assert!(links.contains(&"/income/new"));
        assert!(html.select(&Selector::parse("#summary").unwrap()).next().is_none());
    }

    #[tokio::test]
    async fn dashboard_shows_only_current_users_records() {
        let (state, user_id) = get_state();
        let other_user = {
            let connection = state.db_connection.lock().unwrap();
            create_user(
                "bob",
                "bob@example.com",
                PasswordHash::new_unchecked("hunter3"),
                &connection,
            )
            .unwrap()
            .id
        };
        insert(&state, TransactionKind::Income, user_id, 1000, 3, "Salary");
        insert(&state, TransactionKind::Expense, user_id, 250, 1, "Rent");
        insert(&state, TransactionKind::Expense, other_user, 999, 1, "Boat");

        let response = get_dashboard_page(State(state), Extension(user_id))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(
            texts(&html, "#summary p"),
            ["$750.00", "$1,000.00", "$250.00"]
        );
        assert_eq!(
            texts(&html, "#recent-transactions li p.font-medium"),
            ["Rent", "Salary"]
        );
        assert!(!html.html().contains("Boat"));
        for id in ["financial-overview-chart", "expenses-chart", "income-chart"] {
            let selector = Selector::parse(&format!("#{id}")).unwrap();
            assert!(html.select(&selector).next().is_some(), "missing chart {id}");
        }
    }

    #[test]
    fn dashboard_data_respects_limits_and_windows() {
        let today = date!(2025 - 06 - 30);
        let incomes: Vec<_> = (0..8)
            .map(|i| {
                transaction(
                    i,
                    100,
                    today - time::Duration::days(i * 10),
                    &format!("Source {i}"),
                )
            })
            .collect();
        let expenses: Vec<_> = (0..7)
            .map(|i| transaction(i, 10, today - time::Duration::days(i * 7), "Food"))
            .collect();

        let data = build_dashboard_data(&incomes, &expenses, today);

        assert_eq!(data.recent_transactions.len(), 6);
        assert_eq!(data.recent_expenses.len(), 5);
        assert_eq!(data.recent_incomes.len(), 6);
        assert_eq!(data.recent_incomes[0].label, "Source 0");
        assert_eq!(data.totals.total_income, rust_decimal::Decimal::new(800, 0));
        assert_eq!(data.totals.total_expense, rust_decimal::Decimal::new(70, 0));
        // The income chart covers 60 days, so sources from 60 or more days ago are left out.
        assert!(data.charts[2].options.contains("Source 5"));
        assert!(!data.charts[2].options.contains("Source 6"));
    }
}
