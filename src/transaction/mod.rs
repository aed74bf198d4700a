//! Incomes and expenses.
//!
//! Both kinds of record share one model and one set of handlers, with
//! [TransactionKind] selecting the table, labels and URLs:
//! - `core`: the model and database functions,
//! - `form`: the create/edit form and its validation,
//! - the page and endpoint handlers for listing, creating, editing, deleting
//!   and downloading records.

mod core;
mod create;
mod delete;
mod download;
mod edit;
mod form;
mod list_page;

pub use core::{
    NewTransaction, RowsAffected, Transaction, TransactionId, TransactionKind,
    create_transaction, create_transaction_tables, delete_transaction, get_transaction,
    get_transactions, map_transaction_row, update_transaction,
};
pub use create::{
    create_expense_endpoint, create_income_endpoint, get_new_expense_page, get_new_income_page,
};
pub use delete::{delete_expense_endpoint, delete_income_endpoint};
pub use download::{download_expenses, download_income};
pub use edit::{
    get_edit_expense_page, get_edit_income_page, update_expense_endpoint, update_income_endpoint,
};
pub use form::TransactionForm;
pub use list_page::{get_expenses_page, get_income_page};
