//! Wisp path normalization shared by the server and the client.

use crate::config::defaults;

/// Normalize a wisp path so it starts and ends with `/`.
///
/// An empty path yields the default wisp path. Existing slashes are never
/// doubled, so the function is idempotent.
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return defaults::WISP_PATH.to_string();
    }

    let mut normalized = String::with_capacity(path.len() + 2);
    if !path.starts_with('/') {
        normalized.push('/');
    }
    normalized.push_str(path);
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}
