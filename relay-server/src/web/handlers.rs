//! Submission, test-email and health handlers.
//!
//! Submission handlers only parse the body and hand it to the pipeline; the
//! response body is taken from the pipeline outcome.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::pipeline::{PipelineError, SubmissionPipeline, SubmissionResponse};
use crate::submission::SubmissionKind;
use crate::web::error::ApiError;
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<SubmissionPipeline>,
}

impl AppState {
    pub fn new(config: Config, pipeline: SubmissionPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }
}

// =============================================================================
// Submissions
// =============================================================================

/// Decode a request body as JSON. An empty body is an empty object, so it is
/// reported as missing fields rather than as a malformed request.
fn parse_payload(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::MalformedBody(e.to_string()))
}

async fn submit(
    state: &AppState,
    kind: Option<SubmissionKind>,
    body: &Bytes,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let payload = parse_payload(body)?;
    let kind = kind.unwrap_or_else(|| SubmissionKind::infer(&payload));

    match state.pipeline.handle(kind, &payload).await {
        Ok(outcome) => Ok(Json(outcome.response())),
        Err(PipelineError::Validation(e)) => Err(ApiError::Validation(e)),
        Err(PipelineError::Internal(e)) => {
            Err(ApiError::internal(kind, &e, state.config.development))
        }
    }
}

/// POST /api/quote
pub async fn submit_quote(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SubmissionResponse>, ApiError> {
    submit(&state, Some(SubmissionKind::Quote), &body).await
}

/// POST /api/contact
pub async fn submit_contact(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SubmissionResponse>, ApiError> {
    submit(&state, Some(SubmissionKind::Contact), &body).await
}

/// POST /api/submit - kind inferred from the payload.
pub async fn submit_auto(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SubmissionResponse>, ApiError> {
    submit(&state, None, &body).await
}

// =============================================================================
// Test email
// =============================================================================

#[derive(Debug, Serialize)]
pub struct TestEmailResponse {
    pub message: String,
}

/// POST /api/test-email
pub async fn test_email(State(state): State<AppState>) -> Result<Json<TestEmailResponse>, ApiError> {
    let delivery = state.pipeline.send_test_email().await?;

    info!(
        provider = delivery.receipt.provider,
        attempts = delivery.attempts,
        "test_email_sent"
    );

    Ok(Json(TestEmailResponse {
        message: format!("Test email sent successfully via {}", delivery.receipt.provider),
    }))
}

// =============================================================================
// Health Check
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ProviderHealth {
    pub name: &'static str,
    pub configured: bool,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StorageHealth {
    pub directory: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub provider: ProviderHealth,
    pub storage: StorageHealth,
}

/// GET /api/health
///
/// Always 200; provider and storage problems are reported in the body.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let mailer = state.pipeline.dispatcher().mailer();
    let store = state.pipeline.store();

    let (verified, probed) = tokio::join!(mailer.verify(), store.probe());

    let provider = match verified {
        Ok(()) => ProviderHealth {
            name: mailer.name(),
            configured: mailer.configured(),
            status: "connected",
            error: None,
        },
        Err(e) => ProviderHealth {
            name: mailer.name(),
            configured: mailer.configured(),
            status: "error",
            error: Some(e.to_string()),
        },
    };

    let storage = match probed {
        Ok(()) => StorageHealth {
            directory: store.location(),
            status: "accessible",
            error: None,
        },
        Err(e) => StorageHealth {
            directory: store.location(),
            status: "error",
            error: Some(e.to_string()),
        },
    };

    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        provider,
        storage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload_empty_body_is_empty_object() {
        let payload = parse_payload(&Bytes::from_static(b"  \n")).unwrap();
        assert_eq!(payload, Value::Object(Default::default()));
    }

    #[test]
    fn test_parse_payload_rejects_garbage() {
        let result = parse_payload(&Bytes::from_static(b"{name: alice"));
        assert!(matches!(result, Err(ApiError::MalformedBody(_))));
    }

    #[test]
    fn test_parse_payload_accepts_json() {
        let payload = parse_payload(&Bytes::from_static(br#"{"name":"Alice"}"#)).unwrap();
        assert_eq!(payload["name"], "Alice");
    }
}
