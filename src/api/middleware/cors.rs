//! CORS middleware configuration.

use tower_http::cors::CorsLayer;

/// Create a CORS layer with permissive settings.
///
/// This allows all origins, methods, and headers. The API is token
/// authenticated, so cookies are never involved.
pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}
