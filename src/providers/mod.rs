use crate::classify::{StatusProfile, body_snippet, classify_status, classify_transport};
use crate::core::error::{ConfigError, ErrorKind, GenerationFailure};
use crate::core::types::{AdapterContext, MediaKind, MediaOutput, ProviderId};
use crate::transport::{RawResponse, Transport, TransportRequest};

pub mod job_poll;
pub mod multipart_upload;
pub mod sync_binary;

pub(crate) const AUTH_BEARER_TOKEN_METADATA: &str = "auth.bearer_token";

pub(crate) fn validated_base_url(
    provider: ProviderId,
    base_url: &str,
) -> Result<String, ConfigError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidProviderConfig {
            provider,
            reason: "base_url must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

pub(crate) fn sanitize_api_key(api_key: Option<String>) -> Option<String> {
    api_key.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Configured key wins; the per-call metadata slot is the fallback for
/// callers that inject credentials at request time.
pub(crate) fn resolve_api_key(configured: Option<&str>, ctx: &AdapterContext) -> Option<String> {
    if let Some(key) = configured {
        return Some(key.to_string());
    }

    if let Some(key) = ctx.metadata.get(AUTH_BEARER_TOKEN_METADATA)
        && !key.trim().is_empty()
    {
        return Some(key.trim().to_string());
    }

    None
}

pub(crate) fn authorize(request: TransportRequest, api_key: Option<&str>) -> TransportRequest {
    match api_key {
        Some(key) => request.with_bearer(key),
        None => request,
    }
}

/// Turns a successful provider response into media output. Zero-length
/// bodies are the half-initialized-model signature and never count as
/// success; unrecognized payloads surface with a diagnostic snippet.
pub(crate) fn media_from_response(response: RawResponse) -> Result<MediaOutput, GenerationFailure> {
    if response.body.is_empty() {
        return Err(GenerationFailure::new(
            ErrorKind::EmptyResponse,
            "provider returned a zero-length body",
        )
        .with_http_status(response.status));
    }

    let media_kind = response
        .content_type()
        .and_then(MediaKind::from_mime)
        .ok_or_else(|| {
            let detail = match response.content_type() {
                Some(content_type) => format!("unrecognized content type {content_type}"),
                None => "missing content type".to_string(),
            };
            let message = match body_snippet(&response.body) {
                Some(snippet) => format!("{detail}: {snippet}"),
                None => detail,
            };
            GenerationFailure::new(ErrorKind::UnknownProviderError, message)
                .with_http_status(response.status)
        })?;

    Ok(MediaOutput {
        bytes: response.body,
        media_kind,
    })
}

/// Resolves an output reference with a single binary GET.
pub(crate) async fn fetch_output(
    transport: &dyn Transport,
    url: &str,
    api_key: Option<&str>,
) -> Result<MediaOutput, GenerationFailure> {
    let request = authorize(TransportRequest::get(url), api_key);
    let response = transport
        .execute(request)
        .await
        .map_err(|error| classify_transport(&error))?;

    if !response.is_success() {
        return Err(classify_status(
            StatusProfile::Standard,
            response.status,
            &response.body,
        ));
    }

    media_from_response(response)
}
