use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::classify::{StatusProfile, classify_status, classify_transport};
use crate::core::error::{ConfigError, GenerationFailure};
use crate::core::traits::ProviderAdapter;
use crate::core::types::{
    AdapterContext, GenerationRequest, MediaOutput, ProviderConfig, ProviderId,
};
use crate::providers::{
    authorize, media_from_response, resolve_api_key, sanitize_api_key, validated_base_url,
};
use crate::transport::http::{DEFAULT_REQUEST_TIMEOUT_MS, HttpTransport};
use crate::transport::{Transport, TransportRequest};

/// Adapter for backends that return generated media directly in the response
/// body. These backends may be asleep; 404/503 mean the model is still
/// loading, and retrying after a warm-up wait is the caller's decision.
pub struct SyncBinaryAdapter {
    transport: Arc<dyn Transport>,
    base_url: String,
    api_key: Option<String>,
}

// Credentials never reach logs; Debug shows presence only.
impl fmt::Debug for SyncBinaryAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncBinaryAdapter")
            .field("transport", &format_args!("<dyn Transport>"))
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl SyncBinaryAdapter {
    pub fn new(config: ProviderConfig) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(DEFAULT_REQUEST_TIMEOUT_MS)?;
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(
        config: ProviderConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            transport,
            base_url: validated_base_url(ProviderId::SyncBinary, &config.base_url)?,
            api_key: sanitize_api_key(config.api_key),
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/generate", self.base_url)
    }
}

#[async_trait]
impl ProviderAdapter for SyncBinaryAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::SyncBinary
    }

    async fn generate(
        &self,
        req: &GenerationRequest,
        ctx: &AdapterContext,
    ) -> Result<MediaOutput, GenerationFailure> {
        let url = self.generate_url();
        let request = authorize(
            TransportRequest::post_json(&url, encode_generate_body(req)),
            resolve_api_key(self.api_key.as_deref(), ctx).as_deref(),
        );

        debug!(provider = %self.id().as_str(), url = %url, "dispatching generation request");
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|error| classify_transport(&error))?;

        if !response.is_success() {
            return Err(classify_status(
                StatusProfile::ColdStartBinary,
                response.status,
                &response.body,
            ));
        }

        media_from_response(response)
    }
}

fn encode_generate_body(req: &GenerationRequest) -> Value {
    json!({
        "prompt": req.prompt,
        "parameters": req.parameters,
    })
}

#[cfg(test)]
mod tests;
