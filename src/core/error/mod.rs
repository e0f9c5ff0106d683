use std::fmt;

use thiserror::Error;

use crate::core::types::ProviderId;

/// Closed set of user-facing failure kinds. Every provider or transport
/// failure the gateway can observe is normalized into exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ValidationError,
    AuthError,
    NotFound,
    ModelWarmingUp,
    RateLimited,
    EmptyResponse,
    TransportTimeout,
    TransportFailure,
    UnknownProviderError,
}

impl ErrorKind {
    /// Stable label used in the inbound JSON error envelope.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::AuthError => "auth_error",
            Self::NotFound => "not_found",
            Self::ModelWarmingUp => "model_warming_up",
            Self::RateLimited => "rate_limited",
            Self::EmptyResponse => "empty_response",
            Self::TransportTimeout => "transport_timeout",
            Self::TransportFailure => "transport_failure",
            Self::UnknownProviderError => "unknown_provider_error",
        }
    }

    /// Fixed remediation template attached to failures of this kind.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::ValidationError => Some("Check the prompt and parameters, then resubmit."),
            Self::AuthError => Some(
                "Verify the configured API key; retrying with the same credential will not succeed.",
            ),
            Self::NotFound => Some("Confirm the provider endpoint and model are still available."),
            Self::ModelWarmingUp => Some("The model is loading; wait 1-2 minutes and try again."),
            Self::RateLimited => Some("Too many requests; wait a moment before retrying."),
            Self::EmptyResponse => Some(
                "The model produced no output, which usually means it is still initializing; try again shortly.",
            ),
            Self::TransportTimeout => Some(
                "The provider did not respond in time; try again or raise the overall timeout.",
            ),
            Self::TransportFailure => Some(
                "Could not reach the provider; check network connectivity and the configured base URL.",
            ),
            Self::UnknownProviderError => None,
        }
    }

    /// HTTP status the inbound wrapper reports for this kind.
    pub fn response_status(&self) -> u16 {
        match self {
            Self::ValidationError => 400,
            Self::AuthError => 401,
            Self::NotFound => 404,
            Self::RateLimited => 429,
            Self::ModelWarmingUp => 503,
            Self::TransportTimeout => 504,
            Self::EmptyResponse | Self::TransportFailure | Self::UnknownProviderError => 502,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phrase = match self {
            Self::ValidationError => "validation error",
            Self::AuthError => "authentication failed",
            Self::NotFound => "not found",
            Self::ModelWarmingUp => "model warming up",
            Self::RateLimited => "rate limited",
            Self::EmptyResponse => "empty response",
            Self::TransportTimeout => "transport timeout",
            Self::TransportFailure => "transport failure",
            Self::UnknownProviderError => "unknown provider error",
        };
        f.write_str(phrase)
    }
}

/// Classified failure carried inside `GenerationResult::Failure`.
///
/// `suggestion` is filled from the kind's fixed template at construction;
/// `http_status` is the upstream provider status when one was observed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct GenerationFailure {
    pub kind: ErrorKind,
    pub message: String,
    pub suggestion: Option<String>,
    pub http_status: Option<u16>,
}

impl GenerationFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            suggestion: kind.suggestion().map(str::to_string),
            http_status: None,
        }
    }

    pub fn with_http_status(mut self, http_status: u16) -> Self {
        self.http_status = Some(http_status);
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid provider config for {provider:?}: {reason}")]
    InvalidProviderConfig {
        provider: ProviderId,
        reason: String,
    },
    #[error("invalid timeout: {timeout_ms} ms")]
    InvalidTimeout { timeout_ms: u64 },
    #[error("invalid poll policy: {reason}")]
    InvalidPollPolicy { reason: String },
}

/// Raw transport outcome, prior to classification. `Timeout` and `Failed`
/// stay distinct so the classifier can tell "no response in time" apart
/// from "connection broken".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport timeout after {timeout_ms} ms: {message}")]
    Timeout { timeout_ms: u64, message: String },
    #[error("transport failure: {message}")]
    Failed { message: String },
    #[error("invalid transport request: {message}")]
    InvalidRequest { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("deadline exceeded after {polls} status checks")]
    DeadlineExceeded { polls: u32 },
    #[error("{consecutive_failures} consecutive transport failures while polling: {last_error}")]
    TransportExhausted {
        consecutive_failures: u32,
        last_error: String,
    },
}
