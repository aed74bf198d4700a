//! Route guards that admit requests carrying a valid auth cookie and keep the session alive.

use axum::{
    extract::{Request, State},
    http::{StatusCode, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use axum_htmx::HxRedirect;

use crate::auth::{
    SessionConfig, extend_auth_cookie_duration_if_needed, get_token_from_cookies,
    redirect::{htmx_return_target, log_in_url, page_return_target},
};

/// How a guarded route sends an unauthenticated client to the log-in page.
#[derive(Debug, Clone, Copy)]
enum Rejection {
    /// A plain `303 See Other` for full page loads.
    Page,
    /// An `HX-Redirect` header, since HTMX does not follow redirects into a full page swap.
    Htmx,
}

impl Rejection {
    fn respond(self, refused: &Parts) -> Response {
        match self {
            Rejection::Page => {
                let log_in = log_in_url(page_return_target(&refused.uri).as_deref());
                Redirect::to(&log_in).into_response()
            }
            Rejection::Htmx => {
                let log_in = log_in_url(htmx_return_target(&refused.headers).as_deref());
                (HxRedirect(log_in), StatusCode::OK).into_response()
            }
        }
    }
}

/// Guard for pages: unauthenticated clients are redirected to the log-in page,
/// which sends them back to the requested page afterwards.
///
/// Handlers behind the guard can take `Extension<UserID>` for the logged in user.
pub async fn auth_guard(
    State(session): State<SessionConfig>,
    request: Request,
    next: Next,
) -> Response {
    guard(session, Rejection::Page, request, next).await
}

/// Guard for the HTMX API: unauthenticated clients get an `HX-Redirect` to the
/// log-in page, which sends them back to the page the request came from.
///
/// Handlers behind the guard can take `Extension<UserID>` for the logged in user.
pub async fn auth_guard_hx(
    State(session): State<SessionConfig>,
    request: Request,
    next: Next,
) -> Response {
    guard(session, Rejection::Htmx, request, next).await
}

async fn guard(
    session: SessionConfig,
    rejection: Rejection,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = PrivateCookieJar::from_headers(&parts.headers, session.cookie_key.clone());

    let token = match get_token_from_cookies(&jar) {
        Ok(token) => token,
        Err(error) => {
            tracing::debug!("refused {} {}: {error}", parts.method, parts.uri.path());
            return rejection.respond(&parts);
        }
    };

    parts.extensions.insert(token.user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    refresh_session(&session, jar, response)
}

/// Push the auth cookie's expiry out to a full session length from now.
///
/// The response is passed through unchanged if the cookie cannot be refreshed.
fn refresh_session(
    session: &SessionConfig,
    jar: PrivateCookieJar,
    mut response: Response,
) -> Response {
    let refreshed_jar = session.local_offset().and_then(|local_offset| {
        extend_auth_cookie_duration_if_needed(jar, session.cookie_duration, local_offset)
    });

    match refreshed_jar {
        Ok(jar) => {
            let cookie_headers = jar.into_response();
            for value in cookie_headers.headers().get_all(SET_COOKIE) {
                response.headers_mut().append(SET_COOKIE, value.clone());
            }
        }
        Err(error) => tracing::error!("could not refresh the auth cookie: {error}"),
    }

    response
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{http::header::SET_COOKIE, response::IntoResponse};
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, SameSite},
    };
    use axum_htmx::{HX_CURRENT_URL, HX_REDIRECT, HX_REQUEST};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime, UtcOffset};

    use crate::{
        Amount, AppState, Transaction, TransactionKind,
        auth::{COOKIE_TOKEN, PasswordHash, UserID, create_user, set_auth_cookie},
        build_router, create_transaction, endpoints,
    };

    fn get_server() -> (TestServer, AppState) {
        let connection = Connection::open_in_memory().unwrap();
        let state = AppState::new(connection, "42", "Etc/UTC").unwrap();

        (TestServer::new(build_router(state.clone())), state)
    }

    /// The encrypted auth cookie a browser would hold after logging in as `user_id`.
    fn auth_cookie(state: &AppState, user_id: UserID, lifetime: Duration) -> Cookie<'static> {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());
        let jar = set_auth_cookie(jar, user_id, lifetime, UtcOffset::UTC).unwrap();

        let response = jar.into_response();
        let header = response.headers().get(SET_COOKIE).unwrap();
        Cookie::parse(header.to_str().unwrap().to_owned()).unwrap()
    }

    fn log_in_location(return_to: &str) -> String {
        let query = serde_urlencoded::to_string([("redirect_url", return_to)]).unwrap();
        format!("{}?{query}", endpoints::LOG_IN_VIEW)
    }

    #[tokio::test]
    async fn dashboard_is_served_with_valid_cookie() {
        let (server, state) = get_server();
        let cookie = auth_cookie(&state, UserID::new(1), Duration::minutes(5));

        server
            .get(endpoints::DASHBOARD_VIEW)
            .add_cookie(cookie)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn pages_see_the_logged_in_user() {
        let (server, state) = get_server();
        let (alice, bob) = {
            let connection = state.db_connection.lock().unwrap();
            let hash = PasswordHash::new_unchecked("hunter2");
            let alice = create_user("alice", "alice@example.com", hash.clone(), &connection);
            let bob = create_user("bob", "bob@example.com", hash, &connection);
            let (alice, bob) = (alice.unwrap().id, bob.unwrap().id);

            let date = OffsetDateTime::now_utc().date();
            let amount = Amount::new(rust_decimal::Decimal::new(1250, 2));
            let groceries = Transaction::build(amount, date, "Groceries");
            create_transaction(TransactionKind::Expense, alice, &groceries, &connection).unwrap();

            (alice, bob)
        };

        let alice_page = server
            .get(endpoints::EXPENSES_VIEW)
            .add_cookie(auth_cookie(&state, alice, Duration::minutes(5)))
            .await;
        let bob_page = server
            .get(endpoints::EXPENSES_VIEW)
            .add_cookie(auth_cookie(&state, bob, Duration::minutes(5)))
            .await;

        assert!(alice_page.text().contains("Groceries"));
        assert!(!bob_page.text().contains("Groceries"));
    }

    #[tokio::test]
    async fn missing_cookie_redirects_back_to_requested_page() {
        let (server, _) = get_server();

        let response = server.get("/income?notice=deleted").await;

        response.assert_status_see_other();
        assert_eq!(
            response.header("location"),
            log_in_location("/income?notice=deleted")
        );
    }

    #[tokio::test]
    async fn unreadable_cookie_redirects_to_log_in() {
        let (server, _) = get_server();

        let response = server
            .get(endpoints::EXPENSES_VIEW)
            .add_cookie(Cookie::new(COOKIE_TOKEN, "FOOBAR"))
            .await;

        response.assert_status_see_other();
        assert_eq!(
            response.header("location"),
            log_in_location(endpoints::EXPENSES_VIEW)
        );
    }

    #[tokio::test]
    async fn expired_cookie_redirects_to_log_in() {
        let (server, state) = get_server();
        let cookie = auth_cookie(&state, UserID::new(1), -Duration::minutes(1));

        let response = server
            .get(endpoints::DASHBOARD_VIEW)
            .add_cookie(cookie)
            .await;

        response.assert_status_see_other();
        assert_eq!(
            response.header("location"),
            log_in_location(endpoints::DASHBOARD_VIEW)
        );
    }

    #[tokio::test]
    async fn guarded_request_slides_cookie_expiry_forward() {
        let (server, state) = get_server();
        let cookie = auth_cookie(&state, UserID::new(1), Duration::seconds(5));

        let response = server
            .get(endpoints::DASHBOARD_VIEW)
            .add_cookie(cookie)
            .await;

        let refreshed = response.cookie(COOKIE_TOKEN);
        let want_expiry = OffsetDateTime::now_utc() + state.cookie_duration;
        let got_expiry = refreshed.expires_datetime().unwrap();
        assert!(
            (got_expiry - want_expiry).abs() < Duration::seconds(2),
            "got expiry {got_expiry}, want {want_expiry}"
        );
        assert_eq!(refreshed.http_only(), Some(true));
        assert_eq!(refreshed.same_site(), Some(SameSite::Strict));
    }

    #[tokio::test]
    async fn api_without_cookie_sends_hx_redirect_to_current_page() {
        let (server, _) = get_server();

        let response = server
            .delete("/api/income/1")
            .add_header(HX_REQUEST, "true")
            .add_header(HX_CURRENT_URL, "http://localhost:3000/income")
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.header(HX_REDIRECT),
            log_in_location(endpoints::INCOME_VIEW)
        );
    }

    #[tokio::test]
    async fn api_without_htmx_headers_returns_to_dashboard() {
        let (server, _) = get_server();

        let response = server.delete("/api/expenses/1").await;

        assert_eq!(
            response.header(HX_REDIRECT),
            log_in_location(endpoints::DASHBOARD_VIEW)
        );
    }
}
