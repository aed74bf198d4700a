//! Cards for the dashboard: the overall totals and the recent transaction lists.

use maud::{Markup, html};
use time::Date;

use crate::{
    aggregation::{Totals, TransactionItem},
    html::{LINK_STYLE, format_amount, format_decimal},
    transaction::{Transaction, TransactionKind},
};

const CARD_STYLE: &str = "w-full p-4 bg-white border border-gray-200 rounded-lg shadow-sm \
    dark:bg-gray-800 dark:border-gray-700";
const INCOME_AMOUNT_STYLE: &str = "text-green-600 dark:text-green-400 tabular-nums";
const EXPENSE_AMOUNT_STYLE: &str = "text-red-600 dark:text-red-400 tabular-nums";

/// The total balance, income and expenses side by side.
pub(super) fn summary_cards(totals: &Totals) -> Markup {
    let balance_style = if totals.balance.is_sign_negative() {
        EXPENSE_AMOUNT_STYLE
    } else {
        "tabular-nums"
    };

    html! {
        section id="summary" class="grid grid-cols-1 md:grid-cols-3 gap-4 w-full mb-4"
        {
            (summary_card("Total Balance", &format_decimal(totals.balance), balance_style))
            (summary_card("Total Income", &format_decimal(totals.total_income), INCOME_AMOUNT_STYLE))
            (summary_card("Total Expenses", &format_decimal(totals.total_expense), EXPENSE_AMOUNT_STYLE))
        }
    }
}

fn summary_card(title: &str, value: &str, value_style: &str) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            h3 class="text-sm text-gray-500 dark:text-gray-400" { (title) }
            p class={ "text-2xl font-bold " (value_style) } { (value) }
        }
    }
}

/// The newest incomes and expenses in one list.
pub(super) fn recent_transactions_card(items: &[TransactionItem]) -> Markup {
    html! {
        div id="recent-transactions" class=(CARD_STYLE)
        {
            h3 class="text-xl font-semibold mb-2" { "Recent Transactions" }

            ul class="divide-y divide-gray-200 dark:divide-gray-700"
            {
                @for item in items {
                    (list_row(None, &item.title, item.date, &signed_amount(item), item.is_income))
                }
            }
        }
    }
}

/// The newest records of one kind with a link to the full list.
pub(super) fn recent_kind_card(kind: TransactionKind, transactions: &[Transaction]) -> Markup {
    let is_income = kind == TransactionKind::Income;
    let id = format!("recent-{}", kind.table());

    html! {
        div id=(id) class=(CARD_STYLE)
        {
            div class="flex justify-between items-baseline mb-2"
            {
                h3 class="text-xl font-semibold" { (kind.plural()) }
                a href=(kind.view_endpoint()) class=(LINK_STYLE) { "See all" }
            }

            @if transactions.is_empty() {
                p class="text-gray-500 dark:text-gray-400"
                {
                    "No " (kind.plural().to_lowercase()) " yet. "
                    a href=(kind.new_view_endpoint()) class=(LINK_STYLE) { "Add one" }
                    "."
                }
            } @else {
                ul class="divide-y divide-gray-200 dark:divide-gray-700"
                {
                    @for transaction in transactions {
                        (list_row(
                            transaction.icon.as_deref(),
                            &transaction.label,
                            transaction.date,
                            &format_signed(is_income, &format_amount(transaction.amount)),
                            is_income,
                        ))
                    }
                }
            }
        }
    }
}

fn list_row(icon: Option<&str>, title: &str, date: Date, amount: &str, is_income: bool) -> Markup {
    let amount_style = if is_income {
        INCOME_AMOUNT_STYLE
    } else {
        EXPENSE_AMOUNT_STYLE
    };

    html! {
        li class="flex items-center justify-between py-2 gap-4"
        {
            div class="flex items-center gap-2"
            {
                @if let Some(icon) = icon {
                    span aria-hidden="true" { (icon) }
                }

                div
                {
                    p class="font-medium" { (title) }
                    time datetime=(date) class="text-sm text-gray-500 dark:text-gray-400" { (date) }
                }
            }

            span class=(amount_style) { (amount) }
        }
    }
}

fn signed_amount(item: &TransactionItem) -> String {
    format_signed(item.is_income, &format_amount(item.amount))
}

fn format_signed(is_income: bool, amount: &str) -> String {
    if is_income {
        format!("+ {amount}")
    } else {
        format!("- {amount}")
    }
}
