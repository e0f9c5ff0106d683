use async_trait::async_trait;

use crate::core::error::GenerationFailure;
use crate::core::types::{AdapterContext, GenerationRequest, MediaOutput, ProviderId};

/// Provider adapter contract for translating a canonical generation request
/// into one provider's wire protocol and returning raw media bytes.
///
/// Adapters own the full provider exchange, including any output fetches or
/// job polling their protocol requires. They never retry and never return
/// provider-shaped errors; every failure arrives classified.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable provider identifier for routing and diagnostics.
    fn id(&self) -> ProviderId;

    /// Executes a single generation request end to end.
    async fn generate(
        &self,
        req: &GenerationRequest,
        ctx: &AdapterContext,
    ) -> Result<MediaOutput, GenerationFailure>;
}
