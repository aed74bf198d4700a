use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

use expense_tracker::{
    Amount, PasswordHash, Transaction, TransactionKind, ValidatedPassword, create_transaction,
    create_user, initialize_db,
};

/// A utility for creating a database with a demo user and some records.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// (days ago, source, cents, icon)
const INCOMES: [(i64, &str, i64, &str); 4] = [
    (2, "Salary", 4_200_00, "💼"),
    (16, "Freelance", 850_00, "💻"),
    (32, "Salary", 4_200_00, "💼"),
    (45, "Dividends", 120_55, "📈"),
];

/// (days ago, category, cents, icon, note)
const EXPENSES: [(i64, &str, i64, &str, &str); 8] = [
    (0, "Groceries", 86_40, "🛒", "Weekly shop"),
    (1, "Transport", 25_00, "🚌", ""),
    (3, "Dining", 42_90, "🍜", "Dinner with friends"),
    (5, "Groceries", 64_15, "🛒", ""),
    (9, "Utilities", 180_00, "💡", "Power bill"),
    (14, "Rent", 1_650_00, "🏠", ""),
    (21, "Entertainment", 19_99, "🎬", "Streaming"),
    (44, "Rent", 1_650_00, "🏠", ""),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user \"test\" with the password \"test\"...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user("test", "test@example.com", password_hash, &conn)?;

    println!("Creating incomes and expenses...");

    let today = OffsetDateTime::now_utc().date();

    for (days_ago, source, cents, icon) in INCOMES {
        let income = Transaction::build(
            Amount::new(Decimal::new(cents, 2)),
            today - Duration::days(days_ago),
            source,
        )
        .icon(icon);
        create_transaction(TransactionKind::Income, user.id, &income, &conn)?;
    }

    for (days_ago, category, cents, icon, note) in EXPENSES {
        let mut expense = Transaction::build(
            Amount::new(Decimal::new(cents, 2)),
            today - Duration::days(days_ago),
            category,
        )
        .icon(icon);
        if !note.is_empty() {
            expense = expense.note(note);
        }
        create_transaction(TransactionKind::Expense, user.id, &expense, &conn)?;
    }

    println!("Success!");

    Ok(())
}
