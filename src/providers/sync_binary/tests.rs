use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::json;

use crate::core::error::{ConfigError, ErrorKind, TransportError};
use crate::core::traits::ProviderAdapter;
use crate::core::types::{
    AdapterContext, GenerationParameters, GenerationRequest, MediaKind, ProviderConfig, ProviderId,
};
use crate::providers::sync_binary::SyncBinaryAdapter;
use crate::transport::{HttpMethod, RawResponse, Transport, TransportBody, TransportRequest};

struct StubTransport {
    responses: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl StubTransport {
    fn new(responses: Vec<Result<RawResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::from(responses)),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn execute(&self, req: TransportRequest) -> Result<RawResponse, TransportError> {
        self.requests.lock().expect("requests lock").push(req);
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::Failed {
                    message: "no scripted response".to_string(),
                })
            })
    }
}

fn media_response(
    status: u16,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<RawResponse, TransportError> {
    let mut headers = BTreeMap::new();
    if let Some(content_type) = content_type {
        headers.insert("content-type".to_string(), content_type.to_string());
    }
    Ok(RawResponse {
        status,
        headers,
        body: body.to_vec(),
    })
}

fn adapter_with(
    responses: Vec<Result<RawResponse, TransportError>>,
) -> (SyncBinaryAdapter, Arc<StubTransport>) {
    let transport = StubTransport::new(responses);
    let adapter = SyncBinaryAdapter::with_transport(
        ProviderConfig::new("http://localhost:7860").with_api_key("sk-test"),
        Arc::clone(&transport) as Arc<dyn Transport>,
    )
    .expect("create adapter");
    (adapter, transport)
}

fn ctx() -> AdapterContext {
    AdapterContext::new(Instant::now() + Duration::from_secs(30))
}

#[test]
fn test_adapter_rejects_empty_base_url() {
    let error = SyncBinaryAdapter::new(ProviderConfig::new("  "))
        .expect_err("blank base url should be rejected");
    assert!(matches!(
        error,
        ConfigError::InvalidProviderConfig {
            provider: ProviderId::SyncBinary,
            ..
        }
    ));
}

#[tokio::test]
async fn test_generate_posts_prompt_and_parameters() {
    let (adapter, transport) = adapter_with(vec![media_response(
        200,
        Some("video/mp4"),
        b"mp4-bytes",
    )]);
    let request = GenerationRequest::new("A sunset over the ocean", ProviderId::SyncBinary)
        .with_parameters(GenerationParameters {
            num_frames: Some(24),
            fps: Some(8),
            ..GenerationParameters::default()
        });

    let output = adapter
        .generate(&request, &ctx())
        .await
        .expect("generation should succeed");
    assert_eq!(output.media_kind, MediaKind::Video);
    assert_eq!(output.bytes, b"mp4-bytes".to_vec());

    let sent = transport.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, HttpMethod::Post);
    assert_eq!(sent[0].url, "http://localhost:7860/generate");
    assert_eq!(
        sent[0].headers.get("authorization"),
        Some(&"Bearer sk-test".to_string())
    );
    assert_eq!(
        sent[0].body,
        TransportBody::Json(json!({
            "prompt": "A sunset over the ocean",
            "parameters": {"num_frames": 24, "fps": 8},
        }))
    );
}

#[tokio::test]
async fn test_generate_treats_zero_length_body_as_empty_response() {
    let (adapter, _) = adapter_with(vec![media_response(200, Some("video/mp4"), b"")]);
    let request = GenerationRequest::new("a fox", ProviderId::SyncBinary);

    let failure = adapter
        .generate(&request, &ctx())
        .await
        .expect_err("zero-length body should fail");
    assert_eq!(failure.kind, ErrorKind::EmptyResponse);
    assert_eq!(failure.http_status, Some(200));
}

#[tokio::test]
async fn test_generate_maps_cold_start_statuses_to_model_warming_up() {
    for status in [404, 503] {
        let (adapter, _) = adapter_with(vec![media_response(status, None, b"not ready")]);
        let request = GenerationRequest::new("a fox", ProviderId::SyncBinary);

        let failure = adapter
            .generate(&request, &ctx())
            .await
            .expect_err("cold-start status should fail");
        assert_eq!(failure.kind, ErrorKind::ModelWarmingUp);
        assert_eq!(failure.http_status, Some(status));
        assert!(failure.suggestion.is_some());
    }
}

#[tokio::test]
async fn test_generate_maps_remaining_statuses() {
    let (adapter, _) = adapter_with(vec![media_response(401, None, b"bad key")]);
    let request = GenerationRequest::new("a fox", ProviderId::SyncBinary);
    let failure = adapter.generate(&request, &ctx()).await.expect_err("401");
    assert_eq!(failure.kind, ErrorKind::AuthError);

    let (adapter, _) = adapter_with(vec![media_response(429, None, b"slow down")]);
    let failure = adapter.generate(&request, &ctx()).await.expect_err("429");
    assert_eq!(failure.kind, ErrorKind::RateLimited);

    let (adapter, _) = adapter_with(vec![media_response(500, None, b"cuda error")]);
    let failure = adapter.generate(&request, &ctx()).await.expect_err("500");
    assert_eq!(failure.kind, ErrorKind::UnknownProviderError);
    assert!(failure.message.contains("cuda error"));
}

#[tokio::test]
async fn test_generate_classifies_transport_errors() {
    let (adapter, _) = adapter_with(vec![Err(TransportError::Timeout {
        timeout_ms: 30_000,
        message: "request timed out".to_string(),
    })]);
    let request = GenerationRequest::new("a fox", ProviderId::SyncBinary);

    let failure = adapter
        .generate(&request, &ctx())
        .await
        .expect_err("timeout should fail");
    assert_eq!(failure.kind, ErrorKind::TransportTimeout);
}

#[tokio::test]
async fn test_generate_uses_metadata_credential_when_unconfigured() {
    let transport = StubTransport::new(vec![media_response(200, Some("image/png"), b"png")]);
    let adapter = SyncBinaryAdapter::with_transport(
        ProviderConfig::new("http://localhost:7860"),
        Arc::clone(&transport) as Arc<dyn Transport>,
    )
    .expect("create adapter");

    let mut context = ctx();
    context
        .metadata
        .insert("auth.bearer_token".to_string(), "ctx-key".to_string());
    let request = GenerationRequest::new("a fox", ProviderId::SyncBinary);

    adapter
        .generate(&request, &context)
        .await
        .expect("generation should succeed");

    let sent = transport.requests();
    assert_eq!(
        sent[0].headers.get("authorization"),
        Some(&"Bearer ctx-key".to_string())
    );
}
