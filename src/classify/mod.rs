use crate::core::error::{ErrorKind, GenerationFailure, TransportError};

const BODY_SNIPPET_MAX_CHARS: usize = 256;

/// Status-code semantics differ per backend family. Self-hosted binary
/// backends answer 404/503 while the model is still loading; hosted APIs
/// use those codes conventionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusProfile {
    ColdStartBinary,
    Standard,
}

/// Classifies a non-success provider status into a failure with the
/// upstream status attached.
pub fn classify_status(profile: StatusProfile, status: u16, body: &[u8]) -> GenerationFailure {
    let kind = match (profile, status) {
        (StatusProfile::ColdStartBinary, 404 | 503) => ErrorKind::ModelWarmingUp,
        (StatusProfile::Standard, 404) => ErrorKind::NotFound,
        (StatusProfile::Standard, 503) => ErrorKind::ModelWarmingUp,
        (_, 401) => ErrorKind::AuthError,
        (_, 429) => ErrorKind::RateLimited,
        _ => ErrorKind::UnknownProviderError,
    };

    GenerationFailure::new(kind, status_message(kind, status, body)).with_http_status(status)
}

/// Maps a raw transport outcome onto the closed taxonomy. `InvalidRequest`
/// means the request was malformed before it ever left the process.
pub fn classify_transport(error: &TransportError) -> GenerationFailure {
    match error {
        TransportError::Timeout { .. } => {
            GenerationFailure::new(ErrorKind::TransportTimeout, error.to_string())
        }
        TransportError::Failed { .. } => {
            GenerationFailure::new(ErrorKind::TransportFailure, error.to_string())
        }
        TransportError::InvalidRequest { .. } => {
            GenerationFailure::new(ErrorKind::ValidationError, error.to_string())
        }
    }
}

/// Response-body text rendered for diagnostics: lossy UTF-8, trimmed,
/// truncated to a bounded length. `None` when there is nothing printable.
pub fn body_snippet(body: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut snippet: String = trimmed.chars().take(BODY_SNIPPET_MAX_CHARS).collect();
    if trimmed.chars().count() > BODY_SNIPPET_MAX_CHARS {
        snippet.push_str("...");
    }
    Some(snippet)
}

fn status_message(kind: ErrorKind, status: u16, body: &[u8]) -> String {
    match kind {
        ErrorKind::ModelWarmingUp => {
            format!("provider returned status {status}; the model is not ready yet")
        }
        ErrorKind::AuthError => format!("provider rejected the credential (status {status})"),
        ErrorKind::RateLimited => format!("provider throttled the request (status {status})"),
        ErrorKind::NotFound => format!("provider endpoint or model not found (status {status})"),
        _ => match body_snippet(body) {
            Some(snippet) => format!("unexpected provider status {status}: {snippet}"),
            None => format!("unexpected provider status {status}"),
        },
    }
}

#[cfg(test)]
mod tests;
