/// Application routes configuration
use crate::handlers::{
    all_flights, examples, flight_history, health, not_found, search_flight, AppState,
};
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    // Browser frontends are served from a different origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/api/health", get(health))
        .route("/api/examples", get(examples))
        // Flight endpoints
        .route("/api/flights/all", get(all_flights))
        .route("/api/flight/search", get(search_flight))
        .route("/api/flight/history/:icao24", get(flight_history))
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}
