//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::mail::DispatchError;
use crate::store::StoreError;
use crate::submission::{SubmissionKind, ValidationError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// Unexpected failure while handling a submission. `detail` is only
    /// filled in development mode.
    #[error("internal error handling {kind} submission")]
    Internal {
        kind: SubmissionKind,
        detail: Option<String>,
    },

    #[error("failed to load {what}: {source}")]
    Load {
        what: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("test email failed: {0}")]
    TestEmail(#[from] DispatchError),
}

impl ApiError {
    pub fn internal(kind: SubmissionKind, error: &anyhow::Error, development: bool) -> Self {
        ApiError::Internal {
            kind,
            detail: development.then(|| format!("{error:#}")),
        }
    }

    pub fn load(what: &'static str, source: StoreError) -> Self {
        ApiError::Load { what, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(ValidationError::MissingFields(fields)) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "message": "Champs requis manquants",
                    "missingFields": fields,
                }),
            ),
            ApiError::Validation(ValidationError::InvalidEmail(email)) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "message": "Adresse email invalide",
                    "invalidEmail": email,
                }),
            ),
            ApiError::MalformedBody(reason) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "message": "Requête invalide",
                    "error": reason,
                }),
            ),
            ApiError::Internal { kind, detail } => {
                tracing::error!(kind = %kind, detail = ?detail, "submission_internal_error");
                let message = match kind {
                    SubmissionKind::Quote => "Erreur lors du traitement de la demande",
                    SubmissionKind::Contact => "Erreur lors du traitement du message",
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "message": message,
                        "error": detail.as_deref().unwrap_or("Erreur interne"),
                    }),
                )
            }
            ApiError::Load { what, source } => {
                tracing::error!(what = what, error = %source, "admin_load_failed");
                let message = match *what {
                    "quotes" => "Erreur lors du chargement des devis",
                    "contacts" => "Erreur lors du chargement des contacts",
                    _ => "Erreur lors du calcul des statistiques",
                };
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": message }))
            }
            ApiError::TestEmail(e) => {
                tracing::error!(attempts = e.attempts, error = %e.cause, "test_email_failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "message": "Test email failed",
                        "error": e.cause.to_string(),
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::Value;

    use super::*;

    async fn parts(error: ApiError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_fields_body() {
        let error = ApiError::from(ValidationError::MissingFields(vec![
            "company".to_string(),
            "gdprConsent".to_string(),
        ]));

        let (status, body) = parts(error).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Champs requis manquants");
        assert_eq!(body["missingFields"], json!(["company", "gdprConsent"]));
    }

    #[tokio::test]
    async fn test_invalid_email_body() {
        let error = ApiError::from(ValidationError::InvalidEmail("alice@".to_string()));

        let (status, body) = parts(error).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["invalidEmail"], "alice@");
    }

    #[tokio::test]
    async fn test_internal_hides_detail_outside_development() {
        let cause = anyhow::anyhow!("clock before epoch");

        let (status, body) = parts(ApiError::internal(SubmissionKind::Quote, &cause, false)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Erreur lors du traitement de la demande");
        assert_eq!(body["error"], "Erreur interne");

        let (_, body) = parts(ApiError::internal(SubmissionKind::Contact, &cause, true)).await;
        assert_eq!(body["message"], "Erreur lors du traitement du message");
        assert_eq!(body["error"], "clock before epoch");
    }

    #[tokio::test]
    async fn test_load_failure_message_per_listing() {
        let store_error = || StoreError::Io {
            path: "data/quotes.json".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };

        let (status, body) = parts(ApiError::load("contacts", store_error())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"message": "Erreur lors du chargement des contacts"}));

        let (_, body) = parts(ApiError::load("stats", store_error())).await;
        assert_eq!(body["message"], "Erreur lors du calcul des statistiques");
    }
}
