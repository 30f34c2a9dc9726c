//! Cross-origin policy for both endpoints.
//!
//! The provider posts from its own infrastructure and the dev test tooling
//! calls from arbitrary origins, so the policy is deliberately permissive:
//! any origin, the two supported verbs plus preflight, and the headers the
//! bridge actually reads. Preflight `OPTIONS` gets a 200 from the layer
//! without touching the handlers.

use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

pub const SIGNATURE_HEADER: &str = "x-signature";
pub const API_KEY_HEADER: &str = "x-api-key";

/// Build the permissive CORS layer.
pub fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static(SIGNATURE_HEADER),
            header::HeaderName::from_static(API_KEY_HEADER),
        ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_cors_layer() {
        // Construction must not panic on the static header names.
        let _layer = build_cors_layer();
    }
}
