//! Dashboard module
//!
//! Provides an overview page with the user's totals, recent transactions and
//! charts of recent spending and income.

mod cards;
mod handlers;

pub use handlers::{DashboardState, get_dashboard_page};
