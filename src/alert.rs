//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered into the fixed `#alert-container` at the bottom of every
//! page. The markup uses an out-of-band swap so that an alert still shows when
//! the triggering request swaps its response somewhere else, e.g. when a
//! table row is deleted.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// A message for the user, with optional details.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    Success { message: String, details: String },
    SuccessSimple { message: String },
    Error { message: String, details: String },
    ErrorSimple { message: String },
}

impl Alert {
    fn is_error(&self) -> bool {
        matches!(self, Alert::Error { .. } | Alert::ErrorSimple { .. })
    }

    fn message(&self) -> &str {
        match self {
            Alert::Success { message, .. }
            | Alert::SuccessSimple { message }
            | Alert::Error { message, .. }
            | Alert::ErrorSimple { message } => message,
        }
    }

    fn details(&self) -> Option<&str> {
        match self {
            Alert::Success { details, .. } | Alert::Error { details, .. }
                if !details.is_empty() =>
            {
                Some(details)
            }
            _ => None,
        }
    }

    pub fn into_markup(self) -> Markup {
        let colour_style = if self.is_error() {
            "text-red-800 border-red-300 bg-red-50 dark:bg-gray-800 dark:text-red-400 dark:border-red-800"
        } else {
            "text-green-800 border-green-300 bg-green-50 dark:bg-gray-800 dark:text-green-400 dark:border-green-800"
        };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div
                    role="alert"
                    class={ "flex items-start p-4 mb-4 text-sm border rounded-lg " (colour_style) }
                {
                    div class="flex-1"
                    {
                        span class="font-medium" { (self.message()) }

                        @if let Some(details) = self.details()
                        {
                            p class="mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Dismiss"
                        class="ms-3 font-bold"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "×"
                    }
                }
            }
        }
    }

    pub fn into_html(self) -> Html<String> {
        Html(self.into_markup().into_string())
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}
