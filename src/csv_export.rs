//! Formats income and expense records as CSV for download.

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::transaction::{Transaction, TransactionKind};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Build the CSV lines for `transactions`: a header followed by one row per
/// record, oldest first.
///
/// Every field except the amount is quoted.
pub fn build_export_rows(kind: TransactionKind, transactions: &[Transaction]) -> Vec<String> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by_key(|transaction| transaction.date);

    let mut rows = Vec::with_capacity(sorted.len() + 1);
    rows.push(format!("Date,{},Amount,Icon", kind.label_name()));
    rows.extend(sorted.into_iter().map(format_row));

    rows
}

/// Join the rows from [build_export_rows] into a CSV document.
pub fn export_csv(kind: TransactionKind, transactions: &[Transaction]) -> String {
    let mut csv = build_export_rows(kind, transactions).join("\n");
    csv.push('\n');
    csv
}

fn format_row(transaction: &Transaction) -> String {
    format!(
        "\"{}\",\"{}\",{},\"{}\"",
        format_date(transaction.date),
        escape(&transaction.label),
        transaction.amount,
        escape(transaction.icon.as_deref().unwrap_or_default())
    )
}

fn format_date(date: Date) -> String {
    // The format only has numeric components so it cannot fail.
    date.format(DATE_FORMAT).unwrap_or_default()
}

fn escape(field: &str) -> String {
    field.replace('"', "\"\"")
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use time::macros::date;

    use crate::{
        amount::Amount,
        auth::UserID,
        transaction::{Transaction, TransactionKind},
    };

    use super::{build_export_rows, export_csv};

    fn create_test_transaction(
        amount: &str,
        date: time::Date,
        label: &str,
        icon: Option<&str>,
    ) -> Transaction {
        Transaction {
            id: 0,
            owner: UserID::new(1),
            amount: Amount::from_str(amount).unwrap(),
            date,
            label: label.to_owned(),
            icon: icon.map(str::to_owned),
            note: None,
        }
    }

    #[test]
    fn header_depends_on_kind() {
        assert_eq!(
            build_export_rows(TransactionKind::Expense, &[]),
            ["Date,Category,Amount,Icon"]
        );
        assert_eq!(
            build_export_rows(TransactionKind::Income, &[]),
            ["Date,Source,Amount,Icon"]
        );
    }

    #[test]
    fn rows_are_sorted_and_quoted() {
        let expenses = vec![
            create_test_transaction("300", date!(2024 - 01 - 15), "Food", Some("🍔")),
            create_test_transaction("1200", date!(2024 - 01 - 01), "Rent", None),
        ];

        let rows = build_export_rows(TransactionKind::Expense, &expenses);

        assert_eq!(
            rows,
            [
                "Date,Category,Amount,Icon",
                "\"2024-01-01\",\"Rent\",1200.00,\"\"",
                "\"2024-01-15\",\"Food\",300.00,\"🍔\"",
            ]
        );
    }

    #[test]
    fn quotes_are_doubled() {
        let incomes = vec![create_test_transaction(
            "12.5",
            date!(2024 - 02 - 29),
            "He said \"hi\"",
            Some("\""),
        )];

        let rows = build_export_rows(TransactionKind::Income, &incomes);

        assert_eq!(rows[1], "\"2024-02-29\",\"He said \"\"hi\"\"\",12.50,\"\"\"\"");
    }

    #[test]
    fn csv_reader_recovers_fields() {
        let incomes = vec![
            create_test_transaction("5000", date!(2024 - 01 - 01), "Salary, bonus", None),
            create_test_transaction("0.99", date!(2024 - 01 - 02), "He said \"hi\"", Some("💼")),
        ];

        let csv = export_csv(TransactionKind::Income, &incomes);
        let mut reader = csv::Reader::from_reader(csv.as_bytes());

        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            ["Date", "Source", "Amount", "Icon"]
        );

        let records: Vec<Vec<String>> = reader
            .records()
            .map(|record| record.unwrap().iter().map(str::to_owned).collect())
            .collect();
        assert_eq!(
            records,
            [
                ["2024-01-01", "Salary, bonus", "5000.00", ""],
                ["2024-01-02", "He said \"hi\"", "0.99", "💼"],
            ]
        );
        assert_eq!(
            Amount::from_str(&records[1][2]).unwrap(),
            incomes[1].amount
        );
    }

    #[test]
    fn export_ends_with_newline() {
        let csv = export_csv(TransactionKind::Expense, &[]);

        assert_eq!(csv, "Date,Category,Amount,Icon\n");
    }
}
