//! Works out where a client should land after logging in.

use axum::http::{HeaderMap, Uri};
use axum_htmx::{HX_CURRENT_URL, HX_REQUEST};

use crate::endpoints;

/// The path and query of `uri` if it names a page on this site other than the log-in page.
fn local_page(uri: &Uri) -> Option<String> {
    let path_and_query = uri.path_and_query()?;
    let path = path_and_query.path();

    let is_local = path.starts_with('/') && !path.starts_with("//");
    (is_local && path != endpoints::LOG_IN_VIEW).then(|| path_and_query.as_str().to_owned())
}

/// Accept `raw_url` as a post log-in destination only if it is a relative link to a local page.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;

    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }

    local_page(&uri)
}

/// The page a refused page request was trying to reach.
pub fn page_return_target(uri: &Uri) -> Option<String> {
    local_page(uri)
}

/// The page an HTMX request was sent from, read from the `HX-Current-URL` header.
///
/// HTMX sends the full URL, so only its path and query are kept.
pub fn htmx_return_target(headers: &HeaderMap) -> Option<String> {
    let is_htmx = headers
        .get(HX_REQUEST)
        .is_some_and(|value| value.as_bytes().eq_ignore_ascii_case(b"true"));

    if !is_htmx {
        tracing::warn!("API request without the HX-Request header");
        return None;
    }

    let current_url = headers.get(HX_CURRENT_URL)?.to_str().ok()?;
    let target = current_url
        .parse::<Uri>()
        .ok()
        .and_then(|uri| local_page(&uri));

    if target.is_none() {
        tracing::warn!("ignoring HX-Current-URL {current_url}");
    }

    target
}

/// The log-in page URL that sends the client on to `return_to`, or to the dashboard.
pub fn log_in_url(return_to: Option<&str>) -> String {
    let return_to = return_to.unwrap_or(endpoints::DASHBOARD_VIEW);

    match serde_urlencoded::to_string([("redirect_url", return_to)]) {
        Ok(query) => format!("{}?{query}", endpoints::LOG_IN_VIEW),
        Err(error) => {
            tracing::error!("could not encode redirect URL {return_to}: {error}");
            endpoints::LOG_IN_VIEW.to_owned()
        }
    }
}
