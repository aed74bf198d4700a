//! Summaries and chart series for the dashboard and list pages.
//!
//! Every function here is pure: the callers load one user's records from the
//! database and pass them in, so nothing in this module filters by owner.
//! Sums use exact decimals.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use time::{Date, Duration, Month};

use crate::{amount::Amount, transaction::Transaction};

/// The overall totals for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    /// Income minus expenses, may be negative.
    pub balance: Decimal,
}

/// A single row in the "recent transactions" list.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionItem {
    /// The source of an income or the category of an expense.
    pub title: String,
    pub amount: Amount,
    pub date: Date,
    pub is_income: bool,
}

/// A labelled total, used as one point of a chart series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub label: String,
    pub total: Decimal,
}

/// Sum `incomes` and `expenses` and compute the balance.
pub fn compute_totals(incomes: &[Transaction], expenses: &[Transaction]) -> Totals {
    let total_income = sum(incomes);
    let total_expense = sum(expenses);

    Totals {
        total_income,
        total_expense,
        balance: total_income - total_expense,
    }
}

fn sum<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Decimal {
    transactions
        .into_iter()
        .map(|transaction| transaction.amount.value())
        .sum()
}

/// Merge incomes and expenses into one list, newest first, keeping at most `limit` items.
///
/// On equal dates incomes come before expenses, and records of the same kind
/// keep their input order.
pub fn build_recent_transactions(
    incomes: &[Transaction],
    expenses: &[Transaction],
    limit: usize,
) -> Vec<TransactionItem> {
    let mut items: Vec<TransactionItem> = incomes
        .iter()
        .map(|income| (income, true))
        .chain(expenses.iter().map(|expense| (expense, false)))
        .map(|(transaction, is_income)| TransactionItem {
            title: transaction.label.clone(),
            amount: transaction.amount,
            date: transaction.date,
            is_income,
        })
        .collect();

    // `sort_by` is stable.
    items.sort_by(|a, b| b.date.cmp(&a.date));
    items.truncate(limit);

    items
}

/// Get the `n` most recent records, newest first.
///
/// Records on the same day keep their input order.
pub fn latest(transactions: &[Transaction], n: usize) -> Vec<Transaction> {
    let mut sorted = transactions.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.truncate(n);

    sorted
}

/// The first day of the trailing window of `window_days` days that ends on
/// `reference_date`, or `None` for an empty window.
fn window_start(reference_date: Date, window_days: u32) -> Option<Date> {
    if window_days == 0 {
        return None;
    }

    let offset = Duration::days(i64::from(window_days) - 1);
    Some(reference_date.checked_sub(offset).unwrap_or(Date::MIN))
}

fn in_window<'a>(
    transactions: &'a [Transaction],
    reference_date: Date,
    window_days: u32,
) -> impl Iterator<Item = &'a Transaction> {
    let start = window_start(reference_date, window_days);

    transactions.iter().filter(move |transaction| {
        start.is_some_and(|start| start <= transaction.date && transaction.date <= reference_date)
    })
}

/// Total the records in the trailing window per calendar day, oldest day first.
///
/// Days without any records are skipped rather than filled with zero. Records
/// dated after `reference_date` are ignored.
pub fn bucket_by_day(
    transactions: &[Transaction],
    reference_date: Date,
    window_days: u32,
) -> Vec<Bucket> {
    let mut totals: BTreeMap<Date, Decimal> = BTreeMap::new();

    for transaction in in_window(transactions, reference_date, window_days) {
        *totals.entry(transaction.date).or_default() += transaction.amount.value();
    }

    totals
        .into_iter()
        .map(|(date, total)| Bucket {
            label: format_day_label(date),
            total,
        })
        .collect()
}

/// Total the records in the trailing window per label, largest total first,
/// keeping at most `top_n` labels.
///
/// Labels with equal totals keep the order in which they first appear.
pub fn bucket_by_category(
    transactions: &[Transaction],
    reference_date: Date,
    window_days: u32,
    top_n: usize,
) -> Vec<Bucket> {
    let mut buckets: Vec<Bucket> = Vec::new();
    let mut index_by_label: HashMap<&str, usize> = HashMap::new();

    for transaction in in_window(transactions, reference_date, window_days) {
        let index = *index_by_label
            .entry(transaction.label.as_str())
            .or_insert_with(|| {
                buckets.push(Bucket {
                    label: transaction.label.clone(),
                    total: Decimal::ZERO,
                });
                buckets.len() - 1
            });

        buckets[index].total += transaction.amount.value();
    }

    buckets.sort_by(|a, b| b.total.cmp(&a.total));
    buckets.truncate(top_n);

    buckets
}

/// Formats a date as a two digit day and an abbreviated month, e.g. "01 Jan".
pub fn format_day_label(date: Date) -> String {
    let month = match date.month() {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    };

    format!("{:02} {month}", date.day())
}
