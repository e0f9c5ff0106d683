use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::core::error::GenerationFailure;
use crate::core::types::{GenerationParameters, GenerationRequest, GenerationResult, ProviderId};
use crate::gateway::MediaGateway;

pub const GENERATION_TIME_HEADER: &str = "x-generation-time";
pub const MEDIA_SIZE_HEADER: &str = "x-media-size";

#[derive(Clone)]
struct AppState {
    gateway: Arc<MediaGateway>,
    default_provider: ProviderId,
}

#[derive(Debug, Deserialize)]
struct GenerateBody {
    prompt: String,
    provider: Option<ProviderId>,
    parameters: Option<GenerationParameters>,
}

/// Router exposing the gateway over HTTP: `POST /generate` with a JSON
/// body, binary media back on success, a JSON error envelope otherwise.
/// Requests that omit `provider` fall back to `default_provider`.
pub fn router(gateway: Arc<MediaGateway>, default_provider: ProviderId) -> Router {
    let state = AppState {
        gateway,
        default_provider,
    };

    Router::new()
        .route("/generate", post(generate))
        .with_state(state)
}

async fn generate(State(state): State<AppState>, body: Bytes) -> Response {
    let body: GenerateBody = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(error) => {
            let failure =
                GenerationFailure::validation(format!("malformed request body: {error}"));
            return failure_response(&failure);
        }
    };

    let provider = body.provider.unwrap_or(state.default_provider);
    debug!(provider = provider.as_str(), "received generation request");

    let mut request = GenerationRequest::new(body.prompt, provider);
    if let Some(parameters) = body.parameters {
        request = request.with_parameters(parameters);
    }

    match state.gateway.generate(request).await {
        GenerationResult::Success(media) => {
            let mut headers = HeaderMap::new();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(media.media_kind.content_type()),
            );
            headers.insert(
                HeaderName::from_static(GENERATION_TIME_HEADER),
                HeaderValue::from(media.elapsed_ms),
            );
            headers.insert(
                HeaderName::from_static(MEDIA_SIZE_HEADER),
                HeaderValue::from(media.size_bytes),
            );
            (StatusCode::OK, headers, media.media).into_response()
        }
        GenerationResult::Failure(failure) => failure_response(&failure),
    }
}

fn failure_response(failure: &GenerationFailure) -> Response {
    let status = StatusCode::from_u16(failure.kind.response_status())
        .unwrap_or(StatusCode::BAD_GATEWAY);

    let mut envelope = json!({
        "success": false,
        "error": failure.kind.as_str(),
        "details": failure.message,
    });
    if let Some(suggestion) = &failure.suggestion {
        envelope["suggestion"] = json!(suggestion);
    }

    (status, axum::Json(envelope)).into_response()
}
