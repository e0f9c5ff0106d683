use std::sync::Arc;

use media_gateway::core::types::{ProviderConfig, ProviderId};
use media_gateway::gateway::MediaGateway;
use media_gateway::poll::PollPolicy;
use media_gateway::providers::job_poll::JobPollAdapter;
use media_gateway::providers::multipart_upload::MultipartUploadAdapter;
use media_gateway::providers::sync_binary::SyncBinaryAdapter;
use media_gateway::server;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

struct ServerConfig {
    bind_addr: String,
    default_provider: Option<ProviderId>,
    overall_timeout_ms: Option<u64>,
    poll_interval_ms: Option<u64>,
    sync_binary: Option<ProviderConfig>,
    multipart_upload: Option<ProviderConfig>,
    job_poll: Option<ProviderConfig>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = parse_config()?;
    let (gateway, default_provider) = build_gateway(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(
        addr = %config.bind_addr,
        default_provider = default_provider.as_str(),
        "gateway listening"
    );

    axum::serve(listener, server::router(Arc::new(gateway), default_provider)).await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("media_gateway=info,gateway_server=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn parse_config() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let bind_addr = env_string("MEDIA_GATEWAY_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

    let default_provider = match env_string("MEDIA_GATEWAY_DEFAULT_PROVIDER") {
        Some(value) => Some(provider_from_str(&value).ok_or_else(|| {
            format!(
                "invalid MEDIA_GATEWAY_DEFAULT_PROVIDER '{value}' (expected sync_binary|multipart_upload|job_poll)"
            )
        })?),
        None => None,
    };

    let overall_timeout_ms = parse_env_u64("MEDIA_GATEWAY_TIMEOUT_MS")?;
    let poll_interval_ms = parse_env_u64("JOB_POLL_INTERVAL_MS")?;

    Ok(ServerConfig {
        bind_addr,
        default_provider,
        overall_timeout_ms,
        poll_interval_ms,
        sync_binary: provider_config_from_env("SYNC_BINARY_BASE_URL", "SYNC_BINARY_API_KEY"),
        multipart_upload: provider_config_from_env(
            "MULTIPART_UPLOAD_BASE_URL",
            "MULTIPART_UPLOAD_API_KEY",
        ),
        job_poll: provider_config_from_env("JOB_POLL_BASE_URL", "JOB_POLL_API_KEY"),
    })
}

fn build_gateway(
    config: &ServerConfig,
) -> Result<(MediaGateway, ProviderId), Box<dyn std::error::Error>> {
    let mut builder = MediaGateway::builder();
    let mut registered = Vec::new();

    if let Some(provider_config) = &config.sync_binary {
        let adapter = SyncBinaryAdapter::new(provider_config.clone())
            .map_err(|e| format!("failed to build sync_binary adapter: {e}"))?;
        builder = builder.with_adapter(Arc::new(adapter));
        registered.push(ProviderId::SyncBinary);
    }

    if let Some(provider_config) = &config.multipart_upload {
        let adapter = MultipartUploadAdapter::new(provider_config.clone())
            .map_err(|e| format!("failed to build multipart_upload adapter: {e}"))?;
        builder = builder.with_adapter(Arc::new(adapter));
        registered.push(ProviderId::MultipartUpload);
    }

    if let Some(provider_config) = &config.job_poll {
        let policy = match config.poll_interval_ms {
            Some(interval_ms) => PollPolicy {
                interval_ms,
                ..PollPolicy::default()
            },
            None => PollPolicy::default(),
        };
        let adapter = JobPollAdapter::with_poll_policy(provider_config.clone(), policy)
            .map_err(|e| format!("failed to build job_poll adapter: {e}"))?;
        builder = builder.with_adapter(Arc::new(adapter));
        registered.push(ProviderId::JobPoll);
    }

    if registered.is_empty() {
        return Err("no providers configured; set SYNC_BINARY_BASE_URL, \
             MULTIPART_UPLOAD_BASE_URL, or JOB_POLL_BASE_URL"
            .into());
    }

    let default_provider = config.default_provider.unwrap_or(registered[0]);
    if !registered.contains(&default_provider) {
        return Err(format!(
            "default provider {} has no configured base URL",
            default_provider.as_str()
        )
        .into());
    }

    if let Some(timeout_ms) = config.overall_timeout_ms {
        builder = builder.with_overall_timeout_ms(timeout_ms);
    }

    Ok((builder.build()?, default_provider))
}

fn provider_from_str(value: &str) -> Option<ProviderId> {
    match value.trim().to_ascii_lowercase().as_str() {
        "sync_binary" => Some(ProviderId::SyncBinary),
        "multipart_upload" => Some(ProviderId::MultipartUpload),
        "job_poll" => Some(ProviderId::JobPoll),
        _ => None,
    }
}

fn provider_config_from_env(base_var: &str, key_var: &str) -> Option<ProviderConfig> {
    let base_url = env_string(base_var)?;
    let mut config = ProviderConfig::new(base_url);
    if let Some(api_key) = env_string(key_var) {
        config = config.with_api_key(api_key);
    }
    Some(config)
}

fn env_string(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env_u64(var: &str) -> Result<Option<u64>, Box<dyn std::error::Error>> {
    match env_string(var) {
        Some(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| format!("{var} must be a positive integer").into()),
        None => Ok(None),
    }
}
