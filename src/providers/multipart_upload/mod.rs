use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::classify::{StatusProfile, classify_status, classify_transport};
use crate::core::error::{ConfigError, ErrorKind, GenerationFailure};
use crate::core::traits::ProviderAdapter;
use crate::core::types::{
    AdapterContext, GenerationRequest, MediaOutput, ProviderConfig, ProviderId,
};
use crate::providers::{
    authorize, fetch_output, resolve_api_key, sanitize_api_key, validated_base_url,
};
use crate::transport::http::{DEFAULT_REQUEST_TIMEOUT_MS, HttpTransport};
use crate::transport::{MultipartField, Transport, TransportRequest};

const DEFAULT_MOTION_STRENGTH: f32 = 0.5;
const DEFAULT_NOISE_STRENGTH: f32 = 0.1;

/// Adapter for backends that take an uploaded source file plus control
/// fields and synchronously answer with a JSON envelope referencing the
/// output. The referenced output is fetched with one binary GET.
pub struct MultipartUploadAdapter {
    transport: Arc<dyn Transport>,
    base_url: String,
    api_key: Option<String>,
}

impl MultipartUploadAdapter {
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
            base_url: validated_base_url(ProviderId::MultipartUpload, &config.base_url)?,
            api_key: sanitize_api_key(config.api_key),
        })
    }

    fn transform_url(&self) -> String {
        format!("{}/transform", self.base_url)
    }
}

#[async_trait]
impl ProviderAdapter for MultipartUploadAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::MultipartUpload
    }

    async fn generate(
        &self,
        req: &GenerationRequest,
        ctx: &AdapterContext,
    ) -> Result<MediaOutput, GenerationFailure> {
        let api_key = resolve_api_key(self.api_key.as_deref(), ctx);
        let url = self.transform_url();
        let request = authorize(
            TransportRequest::post_multipart(&url, encode_transform_fields(req)),
            api_key.as_deref(),
        );

        debug!(provider = %self.id().as_str(), url = %url, "dispatching transform request");
        let response = self
            .transport
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

        let envelope = decode_transform_envelope(&response.body)?;
        if let Some(request_id) = &envelope.request_id {
            debug!(provider = %self.id().as_str(), request_id = %request_id, "provider acknowledged transform");
        }

        fetch_output(
            self.transport.as_ref(),
            &envelope.output_url,
            api_key.as_deref(),
        )
        .await
    }
}

struct TransformEnvelope {
    output_url: String,
    request_id: Option<String>,
}

fn encode_transform_fields(req: &GenerationRequest) -> Vec<MultipartField> {
    let motion_strength = req
        .parameters
        .motion_strength
        .unwrap_or(DEFAULT_MOTION_STRENGTH);
    let noise_strength = req
        .parameters
        .noise_strength
        .unwrap_or(DEFAULT_NOISE_STRENGTH);

    let mut fields = vec![
        MultipartField::text("prompt", req.prompt.clone()),
        MultipartField::text("motion_strength", motion_strength.to_string()),
        MultipartField::text("noise_strength", noise_strength.to_string()),
    ];

    if let Some(source) = &req.source_media {
        fields.push(MultipartField::file(
            "source",
            source.file_name.clone(),
            source.mime_type.clone(),
            source.bytes.clone(),
        ));
    }

    fields
}

fn decode_transform_envelope(body: &[u8]) -> Result<TransformEnvelope, GenerationFailure> {
    let value: Value = serde_json::from_slice(body).map_err(|error| {
        GenerationFailure::new(
            ErrorKind::UnknownProviderError,
            format!("provider returned malformed transform envelope: {error}"),
        )
    })?;

    let output_url = value
        .get("output_url")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| {
            GenerationFailure::new(
                ErrorKind::UnknownProviderError,
                "transform envelope is missing output_url",
            )
        })?
        .to_string();

    let request_id = value
        .get("request_id")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(TransformEnvelope {
        output_url,
        request_id,
    })
}
