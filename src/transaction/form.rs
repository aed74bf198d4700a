//! The form used to create and edit incomes and expenses.

use std::str::FromStr;

use maud::{Markup, html};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    amount::Amount,
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, loading_spinner},
    transaction::core::{NewTransaction, TransactionKind},
};

pub const MAX_LABEL_LENGTH: usize = 100;
pub const MAX_ICON_LENGTH: usize = 50;
pub const MAX_NOTE_LENGTH: usize = 200;

/// The largest amount a single record may hold.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(999_999_999, 0, 0, false, 0);
/// The smallest amount a single record may hold.
pub const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// The raw form data for creating or editing a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionForm {
    /// The amount as typed by the user, e.g. "12.34".
    pub amount: String,
    pub date: Date,
    /// The source of an income or the category of an expense.
    pub label: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Only shown for expenses, ignored for incomes.
    #[serde(default)]
    pub note: Option<String>,
}

impl TransactionForm {
    /// Check the form against the rules for `kind` and convert it into a [NewTransaction].
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [Error::InvalidAmount] if the amount is not a number between 0.01 and 999,999,999,
    /// - [Error::MissingField] if the label is blank,
    /// - [Error::TooLong] if the label, icon or note has too many characters.
    pub fn validate(&self, kind: TransactionKind) -> Result<NewTransaction, Error> {
        let amount = parse_amount(&self.amount)?;

        let label = self.label.trim();
        if label.is_empty() {
            return Err(Error::MissingField(kind.label_name()));
        }
        check_length(label, kind.label_name(), MAX_LABEL_LENGTH)?;

        let icon = non_blank(self.icon.as_deref());
        if let Some(icon) = icon {
            check_length(icon, "Icon", MAX_ICON_LENGTH)?;
        }

        let note = match kind {
            TransactionKind::Expense => non_blank(self.note.as_deref()),
            TransactionKind::Income => None,
        };
        if let Some(note) = note {
            check_length(note, "Note", MAX_NOTE_LENGTH)?;
        }

        Ok(NewTransaction {
            amount,
            date: self.date,
            label: label.to_owned(),
            icon: icon.map(str::to_owned),
            note: note.map(str::to_owned),
        })
    }
}

fn parse_amount(raw_amount: &str) -> Result<Amount, Error> {
    let value = Decimal::from_str(raw_amount.trim()).map_err(|_| Error::InvalidAmount)?;
    let amount = Amount::new(value);

    if amount.value() < MIN_AMOUNT || amount.value() > MAX_AMOUNT {
        return Err(Error::InvalidAmount);
    }

    Ok(amount)
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|text| !text.is_empty())
}

fn check_length(text: &str, field: &'static str, max_length: usize) -> Result<(), Error> {
    if text.chars().count() > max_length {
        Err(Error::TooLong(field, max_length))
    } else {
        Ok(())
    }
}

/// The values to pre-fill the form with.
pub struct TransactionFormDefaults<'a> {
    pub amount: Option<Amount>,
    pub date: Date,
    pub label: Option<&'a str>,
    pub icon: Option<&'a str>,
    pub note: Option<&'a str>,
}

/// How the form is submitted.
pub enum FormAction<'a> {
    Create(&'a str),
    Update(&'a str),
}

/// Render the form for a record of `kind`.
///
/// Errors from the server are shown in the alert container.
pub fn transaction_form_view(
    kind: TransactionKind,
    action: FormAction<'_>,
    defaults: &TransactionFormDefaults<'_>,
) -> Markup {
    let amount_str = defaults.amount.map(|amount| amount.to_string());
    let (hx_post, hx_put, submit_text, heading) = match action {
        FormAction::Create(url) => (
            Some(url),
            None,
            format!("Add {}", kind.singular()),
            format!("New {}", kind.singular()),
        ),
        FormAction::Update(url) => (
            None,
            Some(url),
            "Save".to_owned(),
            format!("Edit {}", kind.singular()),
        ),
    };
    let label_name = kind.label_name();
    let label_placeholder = match kind {
        TransactionKind::Income => "Salary",
        TransactionKind::Expense => "Groceries",
    };

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="w-full space-y-4 md:space-y-6"
        {
            h2 class="text-xl font-bold" { (heading) }

            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    min="0.01"
                    max="999999999"
                    placeholder="0.00"
                    required
                    autofocus
                    value=[amount_str.as_deref()]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    name="date"
                    id="date"
                    type="date"
                    required
                    value=(defaults.date)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="label" class=(FORM_LABEL_STYLE) { (label_name) }

                input
                    name="label"
                    id="label"
                    type="text"
                    placeholder=(label_placeholder)
                    maxlength=(MAX_LABEL_LENGTH)
                    required
                    value=[defaults.label]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="icon" class=(FORM_LABEL_STYLE) { "Icon" }

                input
                    name="icon"
                    id="icon"
                    type="text"
                    placeholder=(kind.default_icon())
                    maxlength=(MAX_ICON_LENGTH)
                    value=[defaults.icon]
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if kind == TransactionKind::Expense {
                div
                {
                    label for="note" class=(FORM_LABEL_STYLE) { "Note" }

                    textarea
                        name="note"
                        id="note"
                        rows="3"
                        maxlength=(MAX_NOTE_LENGTH)
                        class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @if let Some(note) = defaults.note { (note) }
                    }
                }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                (submit_text)
            }
        }
    }
}

#[cfg(test)]
mod validation_tests {
    use time::macros::date;

    use crate::{
        Error,
        amount::Amount,
        transaction::core::{Transaction, TransactionKind},
    };

    use super::TransactionForm;

    fn form(amount: &str, label: &str) -> TransactionForm {
        TransactionForm {
            amount: amount.to_owned(),
            date: date!(2025 - 03 - 14),
            label: label.to_owned(),
            icon: None,
            note: None,
        }
    }

    #[test]
    fn valid_form_becomes_new_transaction() {
        let got = TransactionForm {
            icon: Some(" 🛒 ".to_owned()),
            note: Some("weekly shop".to_owned()),
            ..form("12.345", "  Groceries ")
        }
        .validate(TransactionKind::Expense);

        let want = Transaction::build(
            Amount::new("12.35".parse().unwrap()),
            date!(2025 - 03 - 14),
            "Groceries",
        )
        .icon("🛒")
        .note("weekly shop");
        assert_eq!(got, Ok(want));
    }

    #[test]
    fn rejects_amounts_outside_range() {
        for amount in ["0", "0.001", "-5", "1000000000", "abc", ""] {
            assert_eq!(
                form(amount, "Rent").validate(TransactionKind::Expense),
                Err(Error::InvalidAmount),
                "amount {amount:?} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_amount_bounds() {
        assert!(form("0.01", "Rent").validate(TransactionKind::Expense).is_ok());
        assert!(form("999999999", "Rent").validate(TransactionKind::Expense).is_ok());
    }

    #[test]
    fn blank_label_names_the_field() {
        assert_eq!(
            form("1", "   ").validate(TransactionKind::Income),
            Err(Error::MissingField("Source"))
        );
        assert_eq!(
            form("1", "").validate(TransactionKind::Expense),
            Err(Error::MissingField("Category"))
        );
    }

    #[test]
    fn label_length_is_counted_in_characters() {
        let hundred_emoji = "🍕".repeat(100);
        assert!(form("1", &hundred_emoji).validate(TransactionKind::Expense).is_ok());

        let too_long = "a".repeat(101);
        assert_eq!(
            form("1", &too_long).validate(TransactionKind::Expense),
            Err(Error::TooLong("Category", 100))
        );
    }

    #[test]
    fn icon_and_note_limits() {
        let long_icon = TransactionForm {
            icon: Some("x".repeat(51)),
            ..form("1", "Rent")
        };
        assert_eq!(
            long_icon.validate(TransactionKind::Income),
            Err(Error::TooLong("Icon", 50))
        );

        let long_note = TransactionForm {
            note: Some("x".repeat(201)),
            ..form("1", "Rent")
        };
        assert_eq!(
            long_note.validate(TransactionKind::Expense),
            Err(Error::TooLong("Note", 200))
        );
    }

    #[test]
    fn blank_icon_and_income_note_are_dropped() {
        let got = TransactionForm {
            icon: Some("  ".to_owned()),
            note: Some("ignored".to_owned()),
            ..form("100", "Salary")
        }
        .validate(TransactionKind::Income)
        .unwrap();

        assert_eq!(got.icon, None);
        assert_eq!(got.note, None);
    }
}
