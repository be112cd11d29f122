//! Turning address-bar input into a navigable URL.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Characters `encodeURIComponent` escapes.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Placeholder the query replaces in a search template.
pub const QUERY_PLACEHOLDER: &str = "%s";

/// Resolve `input` to a URL.
///
/// An absolute URL is used as-is, a bare hostname gets `http://`, and
/// anything else becomes a query substituted into `template`.
pub fn resolve(input: &str, template: &str) -> String {
    let input = input.trim();

    if let Ok(url) = Url::parse(input) {
        return url.to_string();
    }

    if let Ok(url) = Url::parse(&format!("http://{input}")) {
        if url.host_str().is_some_and(|host| host.contains('.')) {
            return url.to_string();
        }
    }

    let query = utf8_percent_encode(input, URI_COMPONENT).to_string();
    template.replacen(QUERY_PLACEHOLDER, &query, 1)
}
