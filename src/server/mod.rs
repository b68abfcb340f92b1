//! HTTP surface: a single `POST /transcribe` endpoint in front of the
//! pipeline, plus a liveness probe.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::analyze::{ContentAnalysis, ReelScript};
use crate::error::PipelineError;
use crate::pipeline::{Pipeline, PipelineResult, StageOutcome};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::EmptyUrl => ApiError::BadRequest(e.to_string()),
            PipelineError::Fetch(_) | PipelineError::Segmentation(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Response body, keyed the way the original service keys it.
///
/// The analysis and script slots may carry embedded `{"error": ...}` objects
/// while the response itself is still a 200: only failures before a
/// transcript exists are transport-level errors.
#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub transcripcion: String,
    pub analisis: StageOutcome<ContentAnalysis>,
    pub guion_reel: StageOutcome<ReelScript>,
}

impl From<PipelineResult> for TranscribeResponse {
    fn from(result: PipelineResult) -> Self {
        Self {
            transcripcion: result.transcript,
            analisis: result.analysis,
            guion_reel: result.script,
        }
    }
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/transcribe", post(transcribe))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(16 * 1024))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn transcribe(
    State(state): State<AppState>,
    Json(request): Json<TranscribeRequest>,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let url = request.url.ok_or_else(|| {
        ApiError::BadRequest("missing \"url\" field in request body".to_string())
    })?;

    tracing::info!("Transcription requested for: {}", url);

    let result = state.pipeline.run(&url).await?;

    Ok(Json(result.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{ContentAnalyzer, ScriptGenerator, StageSettings};
    use crate::fetch::MockMediaFetcher;
    use crate::transcribe::MockChunkTranscriber;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn settings() -> StageSettings {
        StageSettings {
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.5,
            max_output_tokens: 1024,
        }
    }

    fn test_state() -> AppState {
        let mut fetcher = MockMediaFetcher::new();
        fetcher.expect_fetch().times(0);

        let pipeline = Pipeline::new(
            Arc::new(fetcher),
            Arc::new(MockChunkTranscriber::new()),
            ContentAnalyzer::new(None, settings()),
            ScriptGenerator::new(None, settings()),
            60_000,
        );

        AppState {
            pipeline: Arc::new(pipeline),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_url_returns_400_with_error_object() {
        let app = create_router(test_state());

        let response = app
            .oneshot(
                Request::post("/transcribe")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("url"));
    }

    #[tokio::test]
    async fn test_empty_url_returns_400_without_touching_collaborators() {
        let app = create_router(test_state());

        let response = app
            .oneshot(
                Request::post("/transcribe")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"url": "  "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(test_state());

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_response_uses_spanish_keys() {
        let response = TranscribeResponse {
            transcripcion: "hola".to_string(),
            analisis: StageOutcome::Failed {
                error: "language model collaborator is not configured".to_string(),
            },
            guion_reel: StageOutcome::Failed {
                error: "language model collaborator is not configured".to_string(),
            },
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["transcripcion"], "hola");
        assert!(value["analisis"]["error"].is_string());
        assert!(value["guion_reel"]["error"].is_string());
    }
}
