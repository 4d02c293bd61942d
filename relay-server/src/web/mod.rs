//! HTTP surface.
//!
//! ```text
//! POST /api/quote | /api/contact | /api/submit  → SubmissionPipeline::handle
//! POST /api/test-email                          → SubmissionPipeline::send_test_email
//! GET  /api/health                              → mailer verify + store probe
//! GET  /api/admin/{quotes,contacts,stats}       → RecordStore::list_all
//! OPTIONS *                                     → 200, empty
//! ```
//!
//! CORS is fully open; the forms are posted from the marketing site's origin.

pub mod admin;
pub mod error;
pub mod handlers;

use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use admin::{compute_stats, list_contacts, list_quotes, stats, Stats};
pub use error::ApiError;
pub use handlers::{
    health, submit_auto, submit_contact, submit_quote, test_email, AppState, HealthResponse,
};

/// Answer every OPTIONS request with an empty 200, whatever the path.
async fn answer_options(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Route introuvable" })))
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/quote", post(submit_quote))
        .route("/api/contact", post(submit_contact))
        .route("/api/submit", post(submit_auto))
        .route("/api/test-email", post(test_email))
        .route("/api/health", get(health))
        .route("/api/admin/quotes", get(list_quotes))
        .route("/api/admin/contacts", get(list_contacts))
        .route("/api/admin/stats", get(stats))
        .fallback(not_found)
        .layer(middleware::from_fn(answer_options))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
