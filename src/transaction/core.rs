//! Defines the core data models and database queries for income and expense records.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, amount::Amount, auth::UserID, endpoints};

/// Alias for the integer type used for record IDs.
pub type TransactionId = i64;

/// The number of rows changed by an `UPDATE` or `DELETE`.
pub type RowsAffected = usize;

// ============================================================================
// MODELS
// ============================================================================

/// Whether a record is money earned or money spent.
///
/// The two kinds share one record shape but live in separate tables and pages.
/// Incomes are labelled by their source (e.g. "Salary") and expenses by their
/// category (e.g. "Rent").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// The database table that holds this kind of record.
    pub fn table(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// The column holding the record's label.
    pub fn label_column(self) -> &'static str {
        match self {
            TransactionKind::Income => "source",
            TransactionKind::Expense => "category",
        }
    }

    /// The human readable name of the label, also used as the CSV column header.
    pub fn label_name(self) -> &'static str {
        match self {
            TransactionKind::Income => "Source",
            TransactionKind::Expense => "Category",
        }
    }

    /// The icon used when a new record is created without one.
    pub fn default_icon(self) -> &'static str {
        match self {
            TransactionKind::Income => "💼",
            TransactionKind::Expense => "💳",
        }
    }

    /// The name of one record, e.g. "Expense".
    pub fn singular(self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }

    /// The name used for page titles and exported files, e.g. "Expenses".
    pub fn plural(self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expenses",
        }
    }

    pub fn view_endpoint(self) -> &'static str {
        match self {
            TransactionKind::Income => endpoints::INCOME_VIEW,
            TransactionKind::Expense => endpoints::EXPENSES_VIEW,
        }
    }

    pub fn new_view_endpoint(self) -> &'static str {
        match self {
            TransactionKind::Income => endpoints::NEW_INCOME_VIEW,
            TransactionKind::Expense => endpoints::NEW_EXPENSE_VIEW,
        }
    }

    pub fn edit_view_endpoint(self) -> &'static str {
        match self {
            TransactionKind::Income => endpoints::EDIT_INCOME_VIEW,
            TransactionKind::Expense => endpoints::EDIT_EXPENSE_VIEW,
        }
    }

    pub fn download_endpoint(self) -> &'static str {
        match self {
            TransactionKind::Income => endpoints::DOWNLOAD_INCOME,
            TransactionKind::Expense => endpoints::DOWNLOAD_EXPENSES,
        }
    }

    pub fn create_api_endpoint(self) -> &'static str {
        match self {
            TransactionKind::Income => endpoints::POST_INCOME,
            TransactionKind::Expense => endpoints::POST_EXPENSE,
        }
    }

    /// The endpoint for updating (PUT) and deleting (DELETE) a single record.
    pub fn record_api_endpoint(self) -> &'static str {
        match self {
            TransactionKind::Income => endpoints::INCOME_API,
            TransactionKind::Expense => endpoints::EXPENSE_API,
        }
    }
}

/// An income or expense belonging to a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the record, unique within its kind.
    pub id: TransactionId,
    /// The user that owns the record.
    pub owner: UserID,
    /// How much money was earned or spent. Never negative.
    pub amount: Amount,
    /// The day the money moved.
    pub date: Date,
    /// The source of an income or the category of an expense.
    pub label: String,
    /// A short display token such as an emoji.
    pub icon: Option<String>,
    /// A free text note, only used for expenses.
    pub note: Option<String>,
}

impl Transaction {
    /// Start building a new record.
    ///
    /// Shortcut for [NewTransaction] for discoverability.
    pub fn build(amount: Amount, date: Date, label: &str) -> NewTransaction {
        NewTransaction {
            amount,
            date,
            label: label.to_owned(),
            icon: None,
            note: None,
        }
    }
}

/// The validated fields for creating or updating a record.
///
/// Use [crate::transaction::TransactionForm] to validate user input.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub amount: Amount,
    pub date: Date,
    pub label: String,
    /// `None` when the user left the icon blank.
    pub icon: Option<String>,
    pub note: Option<String>,
}

impl NewTransaction {
    /// Set the icon.
    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_owned());
        self
    }

    /// Set the note.
    pub fn note(mut self, note: &str) -> Self {
        self.note = Some(note.to_owned());
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new record of `kind` owned by `owner`.
///
/// A blank icon is replaced with the kind's default icon.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    kind: TransactionKind,
    owner: UserID,
    new_transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let icon = new_transaction
        .icon
        .as_deref()
        .unwrap_or(kind.default_icon());

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO {table} (user_id, {label}, amount, date, icon, note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, user_id, {label}, amount, date, icon, note",
            table = kind.table(),
            label = kind.label_column()
        ))?
        .query_row(
            (
                owner.as_i64(),
                &new_transaction.label,
                new_transaction.amount,
                new_transaction.date,
                icon,
                &new_transaction.note,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve the record of `kind` with `id` if it belongs to `owner`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a record owned by `owner`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    kind: TransactionKind,
    id: TransactionId,
    owner: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT id, user_id, {label}, amount, date, icon, note FROM {table}
             WHERE id = :id AND user_id = :user_id",
            table = kind.table(),
            label = kind.label_column()
        ))?
        .query_one(
            &[(":id", &id), (":user_id", &owner.as_i64())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Get every record of `kind` owned by `owner`, oldest first.
///
/// Records on the same day are returned in the order they were created.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_transactions(
    kind: TransactionKind,
    owner: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT id, user_id, {label}, amount, date, icon, note FROM {table}
             WHERE user_id = :user_id
             ORDER BY date ASC, id ASC",
            table = kind.table(),
            label = kind.label_column()
        ))?
        .query_map(&[(":user_id", &owner.as_i64())], map_transaction_row)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Overwrite the record of `kind` with `id` if it belongs to `owner`.
///
/// Expenses keep their current icon when `update.icon` is `None`, whereas
/// incomes always take the new icon, clearing it if `None`.
///
/// Returns the number of rows changed, which is zero if the record does not
/// exist or belongs to another user.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn update_transaction(
    kind: TransactionKind,
    id: TransactionId,
    owner: UserID,
    update: &NewTransaction,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let icon_assignment = match kind {
        TransactionKind::Income => "icon = :icon",
        TransactionKind::Expense => "icon = COALESCE(:icon, icon)",
    };

    connection
        .execute(
            &format!(
                "UPDATE {table}
                 SET {label} = :label, amount = :amount, date = :date, {icon_assignment}, note = :note
                 WHERE id = :id AND user_id = :user_id",
                table = kind.table(),
                label = kind.label_column()
            ),
            rusqlite::named_params! {
                ":label": &update.label,
                ":amount": update.amount,
                ":date": update.date,
                ":icon": &update.icon,
                ":note": &update.note,
                ":id": id,
                ":user_id": owner.as_i64(),
            },
        )
        .map_err(Error::from)
}

/// Delete the record of `kind` with `id` if it belongs to `owner`.
///
/// Returns the number of rows deleted.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn delete_transaction(
    kind: TransactionKind,
    id: TransactionId,
    owner: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            &format!(
                "DELETE FROM {table} WHERE id = :id AND user_id = :user_id",
                table = kind.table()
            ),
            &[(":id", &id), (":user_id", &owner.as_i64())],
        )
        .map_err(Error::from)
}

/// Create the income and expense tables in the database.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_transaction_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    for kind in [TransactionKind::Income, TransactionKind::Expense] {
        connection.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    {label} TEXT NOT NULL,
                    amount TEXT NOT NULL,
                    date TEXT NOT NULL,
                    icon TEXT,
                    note TEXT,
                    FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                    )",
                table = kind.table(),
                label = kind.label_column()
            ),
            (),
        )?;

        // Every query filters by owner and most sort by date.
        connection.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_user_date ON {table}(user_id, date);",
                table = kind.table()
            ),
            (),
        )?;
    }

    Ok(())
}

/// Map a database row to a Transaction.
///
/// Expects the columns id, user_id, label, amount, date, icon, note in that order.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let owner = UserID::new(row.get(1)?);
    let label = row.get(2)?;
    let amount = row.get(3)?;
    let date = row.get(4)?;
    let icon = row.get(5)?;
    let note = row.get(6)?;

    Ok(Transaction {
        id,
        owner,
        amount,
        date,
        label,
        icon,
        note,
    })
}

// ============================================================================
// TESTS
// ============================================================================
