//! The 500 page, and the HTMX redirect that sends clients to it.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{endpoints, html::error_view};

/// A 500 page with an explanation and a suggested fix.
pub struct InternalServerError<'a> {
    pub description: &'a str,
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        let page = error_view("Internal Server Error", "500", self.description, self.fix);

        (StatusCode::INTERNAL_SERVER_ERROR, page).into_response()
    }
}

pub async fn get_internal_server_error_page() -> Response {
    InternalServerError::default().into_response()
}

/// Send the client to the internal server error page from an HTMX request.
pub fn get_internal_server_error_redirect() -> Response {
    let redirect = HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned());

    (redirect, StatusCode::INTERNAL_SERVER_ERROR).into_response()
}
