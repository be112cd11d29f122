//! Response headers added to every ordinary response.
//!
//! # Responsibilities
//! - Cross-origin isolation (`COOP: same-origin`, `COEP: require-corp`),
//!   required by the rewriting engine's shared memory use
//! - `no-store` helper for the configuration endpoints

use axum::http::{header, HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

pub fn opener_policy_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    )
}

pub fn embedder_policy_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static("cross-origin-embedder-policy"),
        HeaderValue::from_static("require-corp"),
    )
}

/// Headers for a non-cacheable response of the given content type.
pub fn no_store(content_type: &'static str) -> [(HeaderName, HeaderValue); 2] {
    [
        (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
        (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
    ]
}
