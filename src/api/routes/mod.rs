//! API routes module - organizes all route handlers.
//!
//! Each module carries its full `/api`-relative paths, so the routers merge
//! flat and the application nests the result under `/api` once.

pub mod app_state;
pub mod auth;
pub mod auth_context;
pub mod error;
pub mod extractors;
pub mod ingredients;
pub mod openapi;
pub mod recipes;
pub mod short_links;
pub mod tags;
pub mod users;

use axum::{Router, response::Json, routing::get};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

// Re-export AppState from app_state module
pub use app_state::AppState;

use crate::middleware::create_cors_layer;

/// Create the main API router combining all route modules
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::auth_router())
        .merge(users::users_router())
        .merge(tags::tags_router())
        .merge(ingredients::ingredients_router())
        .merge(recipes::recipes_router())
}

/// Create the full application router: the API under `/api`, public
/// short-link redirects, uploaded media and the OpenAPI endpoints.
pub fn create_app_router(state: AppState) -> Router {
    let media = ServeDir::new(&state.config.media_root);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", create_api_router())
        .merge(short_links::short_link_router())
        .merge(openapi::openapi_router())
        .nest_service("/media", media)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer()),
        )
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "recipe-sharing-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
