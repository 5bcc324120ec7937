//! Internal navigation-route encoding.

use url::form_urlencoded;

/// Encodes the sole internal route: `/?url=<percent-encoded absolute URL>`.
pub fn internal_route(absolute_url: &str) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("url", absolute_url)
        .finish();
    format!("/?{query}")
}
