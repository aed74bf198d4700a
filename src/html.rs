//! Page scaffolding, shared Tailwind classes and money formatting used by every view.

use std::sync::OnceLock;

use maud::{DOCTYPE, Markup, PreEscaped, html};
use numfmt::{Formatter, Precision};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

use crate::{amount::Amount, endpoints};

pub const LINK_STYLE: &str = "text-blue-600 hover:text-blue-500 \
    dark:text-blue-500 dark:hover:text-blue-400 underline";

pub const BUTTON_PRIMARY_STYLE: &str = "w-full px-4 py-2 rounded text-white \
    bg-blue-500 dark:bg-blue-600 disabled:bg-blue-700 \
    hover:enabled:bg-blue-600 hover:enabled:dark:bg-blue-700";

const BUTTON_DELETE_STYLE: &str = "text-red-600 hover:text-red-500 \
    dark:text-red-500 dark:hover:text-red-400 underline bg-transparent \
    border-none cursor-pointer";

pub const FORM_CONTAINER_STYLE: &str = "flex flex-col items-center max-w-md mx-auto \
    px-6 py-8 lg:py-0 text-gray-900 dark:text-white";
pub const FORM_LABEL_STYLE: &str = "block mb-2 text-sm font-medium text-gray-900 dark:text-white";
pub const FORM_TEXT_INPUT_STYLE: &str = "block w-full p-2.5 rounded text-sm \
    text-gray-900 dark:text-white disabled:text-gray-500 \
    bg-gray-50 dark:bg-gray-700 border border-gray-300 dark:border-gray-600 \
    dark:placeholder-gray-400 focus:border-blue-600 focus:ring-blue-600 \
    focus:dark:border-blue-500 focus:dark:ring-blue-500";

pub const TABLE_HEADER_STYLE: &str = "text-xs uppercase text-gray-700 dark:text-gray-400 \
    bg-gray-50 dark:bg-gray-700";
pub const TABLE_ROW_STYLE: &str = "border-b bg-white dark:bg-gray-800 dark:border-gray-700";
pub const TABLE_CELL_STYLE: &str = "px-6 py-4";

pub const PAGE_CONTAINER_STYLE: &str =
    "flex flex-col items-center mx-auto px-6 py-8 lg:py-5 text-gray-900 dark:text-white";

const FIELD_ERROR_STYLE: &str = "text-base text-red-500";

/// Extra elements a page adds to the `<head>` of [base].
pub enum HeadElement {
    /// The path or URL of a script file.
    ScriptLink(String),
    /// Inline JavaScript.
    ScriptSource(PreEscaped<String>),
}

/// Wrap `content` in the HTML document shared by every page.
pub fn base(title: &str, head_elements: &[HeadElement], content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Expense Tracker" }
                link rel="icon" type="image/png" href="/static/favicon-32x32.png" sizes="32x32";
                link rel="icon" type="image/png" href="/static/favicon-128x128.png" sizes="128x128";
                link rel="stylesheet" href="/static/main.css";

                script
                    src="/static/htmx-2.0.8-min.js"
                    integrity="sha384-/TgkGk7p307TH7EXJDuUlgG3Ce1UVolAOFopFekQkkXihi5u/6OCvVKyz1W+idaz"
                    {}
                script
                    src="/static/htmx-ext-response-targets-2.0.4.js"
                    integrity="sha384-T41oglUPvXLGBVyRdZsVRxNWnOOqCynaPubjUVjxhsjFTKrFJGEMm3/0KGmNQ+Pg"
                    {}

                style
                {
                    "#indicator.htmx-indicator { display: none; } "
                    "#indicator.htmx-request .htmx-indicator, "
                    "#indicator.htmx-request.htmx-indicator { display: inline; } "
                    ".echarts-tooltip { z-index: 30 !important; }"
                }

                @for element in head_elements
                {
                    @match element
                    {
                        HeadElement::ScriptSource(text) => script { (text) }
                        HeadElement::ScriptLink(path) => script src=(path) {}
                    }
                }

                script src="/static/app.js" defer {}
            }

            body hx-ext="response-targets" class="min-h-screen bg-gray-50 dark:bg-gray-900"
            {
                (content)

                // Target for out-of-band error alerts.
                div
                    id="alert-container"
                    class="hidden fixed bottom-4 left-1/2 -translate-x-1/2 z-50 w-full max-w-md px-4"
                {}
            }
        }
    }
}

/// A full page explaining an error, with a link back to the dashboard.
pub fn error_view(title: &str, header: &str, description: &str, fix: &str) -> Markup {
    let content = html! {
        main class="mx-auto max-w-screen-sm px-4 py-8 lg:py-16 text-center"
        {
            h1 class="mb-4 text-7xl lg:text-9xl font-extrabold text-blue-600 dark:text-blue-500"
            {
                (header)
            }

            p class="mb-4 text-3xl md:text-4xl font-bold text-gray-900 dark:text-white"
            {
                (description)
            }

            p class="mb-4 text-xl md:text-2xl text-gray-900 dark:text-white" { (fix) }

            a
                href=(endpoints::ROOT)
                class="inline-flex my-4 px-5 py-2.5 rounded text-sm font-medium text-white
                    bg-blue-600 hover:bg-blue-800 dark:focus:ring-blue-900"
            {
                "Back to Homepage"
            }
        }
    };

    base(title, &[], &content)
}

/// The card layout shared by the log-in and registration pages.
pub fn log_in_register(form_title: &str, form: &Markup) -> Markup {
    html! {
        main class="flex flex-col items-center justify-center mx-auto px-6 py-8"
        {
            p class="flex items-center mb-6 text-2xl font-semibold text-gray-900 dark:text-white"
            {
                img class="w-8 h-8 mr-2" src="/static/favicon-128x128.png" alt="";
                "Expense Tracker"
            }

            div class="w-full sm:max-w-md rounded-lg shadow bg-white dark:bg-gray-800"
            {
                div class="p-6 sm:p-8 space-y-4 md:space-y-6"
                {
                    h1 class="text-xl md:text-2xl font-bold text-gray-900 dark:text-white"
                    {
                        (form_title)
                    }

                    (form)
                }
            }
        }
    }
}

/// A labelled, required input for the log-in and registration forms.
///
/// The input's `name` doubles as its ID. Password inputs never echo a value back.
pub struct InputField<'a> {
    label: &'a str,
    name: &'a str,
    input_type: &'a str,
    value: &'a str,
    min_length: Option<u8>,
    error_message: Option<&'a str>,
}

impl<'a> InputField<'a> {
    pub fn new(label: &'a str, name: &'a str, input_type: &'a str) -> Self {
        Self {
            label,
            name,
            input_type,
            value: "",
            min_length: None,
            error_message: None,
        }
    }

    pub fn value(mut self, value: &'a str) -> Self {
        self.value = value;
        self
    }

    pub fn min_length(mut self, min_length: u8) -> Self {
        self.min_length = Some(min_length);
        self
    }

    /// Show `error_message` under the input and focus it.
    pub fn error(mut self, error_message: Option<&'a str>) -> Self {
        self.error_message = error_message;
        self
    }

    pub fn into_html(self) -> Markup {
        let is_password = self.input_type == "password";

        html! {
            div
            {
                label for=(self.name) class=(FORM_LABEL_STYLE) { (self.label) }

                input
                    type=(self.input_type)
                    name=(self.name)
                    id=(self.name)
                    class=(FORM_TEXT_INPUT_STYLE)
                    placeholder=[is_password.then_some("••••••••")]
                    value=[(!is_password).then_some(self.value)]
                    minlength=[self.min_length]
                    required
                    autofocus[self.error_message.is_some()];

                @if let Some(error_message) = self.error_message
                {
                    p class=(FIELD_ERROR_STYLE) { (error_message) }
                }
            }
        }
    }
}

/// A spinning indicator shown in submit buttons while HTMX waits for a response.
pub fn loading_spinner() -> Markup {
    // Path data from https://flowbite.com/docs/components/spinner/
    html! {
        svg
            aria-hidden="true"
            class="inline w-4 h-4 me-2 mb-1 text-white animate-spin"
            viewBox="0 0 100 101"
            fill="none"
            xmlns="http://www.w3.org/2000/svg"
        {
            path
                d="M100 50.5908C100 78.2051 77.6142 100.591 50 100.591C22.3858 100.591 0 78.2051 0 50.5908C0 22.9766 22.3858 0.59082 50 0.59082C77.6142 0.59082 100 22.9766 100 50.5908ZM9.08144 50.5908C9.08144 73.1895 27.4013 91.5094 50 91.5094C72.5987 91.5094 90.9186 73.1895 90.9186 50.5908C90.9186 27.9921 72.5987 9.67226 50 9.67226C27.4013 9.67226 9.08144 27.9921 9.08144 50.5908Z"
                fill="#E5E7EB" {}
            path
                d="M93.9676 39.0409C96.393 38.4038 97.8624 35.9116 97.0079 33.5539C95.2932 28.8227 92.871 24.3692 89.8167 20.348C85.8452 15.1192 80.8826 10.7238 75.2124 7.41289C69.5422 4.10194 63.2754 1.94025 56.7698 1.05124C51.7666 0.367541 46.6976 0.446843 41.7345 1.27873C39.2613 1.69328 37.813 4.19778 38.4501 6.62326C39.0873 9.04874 41.5694 10.4717 44.0505 10.1071C47.8511 9.54855 51.7191 9.52689 55.5402 10.0491C60.8642 10.7766 65.9928 12.5457 70.6331 15.2552C75.2735 17.9648 79.3347 21.5619 82.5849 25.841C84.9175 28.9121 86.7997 32.2913 88.1811 35.8758C89.083 38.2158 91.5421 39.6781 93.9676 39.0409Z"
                fill="currentColor" {}
        }
    }
}

/// An inline link for use inside running text.
pub fn link(url: &str, text: &str) -> Markup {
    html! {
        a href=(url) class=(LINK_STYLE) { (text) }
    }
}

/// Groups whole dollars with commas, e.g. 1234567 as "1,234,567".
fn dollar_formatter() -> &'static Formatter {
    static FORMATTER: OnceLock<Formatter> = OnceLock::new();

    FORMATTER.get_or_init(|| {
        Formatter::new()
            .separator(',')
            .unwrap_or_else(|_| Formatter::new())
            .precision(Precision::Decimals(0))
    })
}

/// Format an exact decimal, such as a total or balance, as dollars and cents.
///
/// Half cents round away from zero. Negative values put the sign before the
/// dollar sign, e.g. "-$3.50".
pub fn format_decimal(value: Decimal) -> String {
    let value = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if value.is_sign_negative() && !value.is_zero() {
        "-"
    } else {
        ""
    };

    let value = value.abs();
    let dollars = value.trunc();
    let cents = ((value - dollars) * Decimal::ONE_HUNDRED)
        .to_u8()
        .unwrap_or_default();

    // numfmt switches to scientific notation from a trillion up.
    let dollars = match dollars.to_u64() {
        Some(whole) if whole < 1_000_000_000_000 => dollar_formatter().fmt_string(whole),
        _ => dollars.to_string(),
    };

    format!("{sign}${dollars}.{cents:02}")
}

/// Format an amount of money for display, e.g. "$1,200.00".
pub fn format_amount(amount: Amount) -> String {
    format_decimal(amount.value())
}

/// An "Edit" link and a "Delete" button for a row in a list.
///
/// The delete button sends an HTMX DELETE request to `delete_url` after the
/// user confirms `confirm_message`, then swaps `target` using `swap`.
pub fn edit_delete_action_links(
    edit_url: &str,
    delete_url: &str,
    confirm_message: &str,
    target: &str,
    swap: &str,
) -> Markup {
    html!(
        a href=(edit_url) class=(LINK_STYLE) { "Edit" }

        button
            type="button"
            hx-delete=(delete_url)
            hx-confirm=(confirm_message)
            hx-target=(target)
            hx-target-error="#alert-container"
            hx-swap=(swap)
            class=(BUTTON_DELETE_STYLE)
        {
            "Delete"
        }
    )
}

/// A green banner confirming that the previous action succeeded.
pub fn success_notice(message: &str) -> Markup {
    html!(
        div
            id="success-notice"
            role="status"
            class="w-full p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50
                dark:bg-gray-800 dark:text-green-400"
        {
            (message)
        }
    )
}
