use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Call control
        .route("/call/start", post(handlers::start_call))
        .route("/call/end", post(handlers::end_call))
        .route("/call/status", get(handlers::call_status))
        .route("/call/error/dismiss", post(handlers::dismiss_error))
        // Browser bridge
        .route("/call/audio", post(handlers::push_audio))
        .route(
            "/call/recognition",
            get(handlers::recognizer_directive).post(handlers::push_recognition),
        )
        .route("/call/speech", get(handlers::drain_speech))
        .route(
            "/call/speech/:utterance_id/ended",
            post(handlers::speech_ended),
        )
        // Journal data
        .route(
            "/history",
            get(handlers::get_history).delete(handlers::clear_history),
        )
        .route("/context", get(handlers::get_context))
        .route("/onboarding", post(handlers::complete_onboarding))
        // Request logging, and CORS for the browser client
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
