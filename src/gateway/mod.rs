use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::core::error::{ConfigError, ErrorKind, GenerationFailure};
use crate::core::traits::ProviderAdapter;
use crate::core::types::{
    AdapterContext, GeneratedMedia, GenerationRequest, GenerationResult, MediaKind, ProviderId,
};

pub const DEFAULT_OVERALL_TIMEOUT_MS: u64 = 120_000;

/// Facade over the registered provider adapters. `generate` validates the
/// request, dispatches to the adapter the request names, and folds every
/// outcome into a `GenerationResult`. Holds no per-request state; share it
/// behind `Arc` for concurrent callers.
pub struct MediaGateway {
    adapters: Vec<(ProviderId, Arc<dyn ProviderAdapter>)>,
    metadata: BTreeMap<String, String>,
    overall_timeout_ms: u64,
}

pub struct MediaGatewayBuilder {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    metadata: BTreeMap<String, String>,
    overall_timeout_ms: u64,
}

// Metadata may carry credentials; Debug shows keys only.
impl fmt::Debug for MediaGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaGateway")
            .field(
                "adapters",
                &self
                    .adapters
                    .iter()
                    .map(|(provider, _)| *provider)
                    .collect::<Vec<_>>(),
            )
            .field(
                "metadata",
                &self.metadata.keys().collect::<Vec<_>>(),
            )
            .field("overall_timeout_ms", &self.overall_timeout_ms)
            .finish()
    }
}

impl MediaGateway {
    pub fn builder() -> MediaGatewayBuilder {
        MediaGatewayBuilder {
            adapters: Vec::new(),
            metadata: BTreeMap::new(),
            overall_timeout_ms: DEFAULT_OVERALL_TIMEOUT_MS,
        }
    }

    /// Runs one generation end to end. Expected failures come back as
    /// `GenerationResult::Failure`; the only panics are bugs.
    pub async fn generate(&self, request: GenerationRequest) -> GenerationResult {
        if let Err(failure) = validate_request(&request) {
            warn!(
                provider = request.provider.as_str(),
                kind = failure.kind.as_str(),
                message = %failure.message,
                "rejected generation request"
            );
            return GenerationResult::Failure(failure);
        }

        let adapter = match self.resolve_adapter(request.provider) {
            Ok(adapter) => adapter,
            Err(failure) => {
                warn!(
                    provider = request.provider.as_str(),
                    kind = failure.kind.as_str(),
                    message = %failure.message,
                    "rejected generation request"
                );
                return GenerationResult::Failure(failure);
            }
        };

        let overall_timeout = Duration::from_millis(self.overall_timeout_ms);
        let started = Instant::now();
        let mut ctx = AdapterContext::new(started + overall_timeout);
        ctx.metadata = self.metadata.clone();

        debug!(
            provider = request.provider.as_str(),
            timeout_ms = self.overall_timeout_ms,
            "dispatching generation request"
        );

        let outcome = tokio::time::timeout(overall_timeout, adapter.generate(&request, &ctx)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(output)) => {
                info!(
                    provider = request.provider.as_str(),
                    media_kind = ?output.media_kind,
                    size_bytes = output.bytes.len(),
                    elapsed_ms,
                    "generation succeeded"
                );
                GenerationResult::Success(GeneratedMedia::new(
                    output.bytes,
                    output.media_kind,
                    elapsed_ms,
                ))
            }
            Ok(Err(failure)) => {
                warn!(
                    provider = request.provider.as_str(),
                    kind = failure.kind.as_str(),
                    message = %failure.message,
                    elapsed_ms,
                    "generation failed"
                );
                GenerationResult::Failure(failure)
            }
            Err(_) => {
                let failure = GenerationFailure::new(
                    ErrorKind::TransportTimeout,
                    format!(
                        "no result within the overall timeout of {} ms",
                        self.overall_timeout_ms
                    ),
                );
                warn!(
                    provider = request.provider.as_str(),
                    kind = failure.kind.as_str(),
                    elapsed_ms,
                    "generation failed"
                );
                GenerationResult::Failure(failure)
            }
        }
    }

    fn resolve_adapter(
        &self,
        provider: ProviderId,
    ) -> Result<&Arc<dyn ProviderAdapter>, GenerationFailure> {
        self.adapters
            .iter()
            .find(|(registered, _)| *registered == provider)
            .map(|(_, adapter)| adapter)
            .ok_or_else(|| {
                GenerationFailure::validation(format!(
                    "provider {} is not configured",
                    provider.as_str()
                ))
            })
    }
}

impl MediaGatewayBuilder {
    /// Registers an adapter under the provider it reports. Registering the
    /// same provider twice keeps the later adapter.
    pub fn with_adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Metadata copied into every adapter context, e.g. a shared
    /// `auth.bearer_token` fallback credential.
    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_overall_timeout_ms(mut self, overall_timeout_ms: u64) -> Self {
        self.overall_timeout_ms = overall_timeout_ms;
        self
    }

    pub fn build(self) -> Result<MediaGateway, ConfigError> {
        if self.overall_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout {
                timeout_ms: self.overall_timeout_ms,
            });
        }

        let mut adapters: Vec<(ProviderId, Arc<dyn ProviderAdapter>)> = Vec::new();
        for adapter in self.adapters {
            let provider = adapter.id();
            if let Some((_, existing)) = adapters
                .iter_mut()
                .find(|(registered, _)| *registered == provider)
            {
                *existing = adapter;
                continue;
            }
            adapters.push((provider, adapter));
        }

        Ok(MediaGateway {
            adapters,
            metadata: self.metadata,
            overall_timeout_ms: self.overall_timeout_ms,
        })
    }
}

fn validate_request(request: &GenerationRequest) -> Result<(), GenerationFailure> {
    if request.prompt.trim().is_empty() {
        return Err(GenerationFailure::validation("prompt must not be empty"));
    }

    if let Some(source) = &request.source_media
        && MediaKind::from_mime(&source.mime_type).is_none()
    {
        return Err(GenerationFailure::validation(format!(
            "source media has unsupported mime type: {}",
            source.mime_type
        )));
    }

    Ok(())
}
