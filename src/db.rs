//! Creates the application's database schema.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{auth::create_user_table, transaction::create_transaction_tables};

/// Create the tables for users, incomes and expenses if they do not exist.
///
/// Foreign keys are switched on so that records cannot reference a missing user.
///
/// # Errors
/// Returns an error if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_transaction_tables(&transaction)?;

    transaction.commit()
}

#[cfg(test)]
mod db_tests {
    use rusqlite::Connection;

    use super::initialize;

    fn table_names(connection: &Connection) -> Vec<String> {
        connection
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn creates_tables() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let tables = table_names(&connection);
        for table in ["expense", "income", "user"] {
            assert!(tables.iter().any(|name| name == table), "missing {table} in {tables:?}");
        }
    }

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();
        initialize(&connection).unwrap();
    }

    #[test]
    fn enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let result = connection.execute(
            "INSERT INTO expense (user_id, category, amount, date) VALUES (42, 'Food', '1.00', '2025-01-01')",
            (),
        );

        assert!(result.is_err());
    }
}
