use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::core::error::GenerationFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    SyncBinary,
    MultipartUpload,
    JobPoll,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SyncBinary => "sync_binary",
            Self::MultipartUpload => "multipart_upload",
            Self::JobPoll => "job_poll",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Recognizes a media MIME type, ignoring parameters after `;`.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or(mime_type)
            .trim()
            .to_ascii_lowercase();

        if essence.starts_with("image/") {
            Some(Self::Image)
        } else if essence.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Image => "image/png",
            Self::Video => "video/mp4",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct GenerationParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_frames: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion_strength: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_strength: Option<f32>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct SourceMedia {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl SourceMedia {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }
}

impl fmt::Debug for SourceMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceMedia")
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .field("mime_type", &self.mime_type)
            .field("file_name", &self.file_name)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub provider: ProviderId,
    pub parameters: GenerationParameters,
    pub source_media: Option<SourceMedia>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, provider: ProviderId) -> Self {
        Self {
            prompt: prompt.into(),
            provider,
            parameters: GenerationParameters::default(),
            source_media: None,
        }
    }

    pub fn with_parameters(mut self, parameters: GenerationParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_source_media(mut self, source_media: SourceMedia) -> Self {
        self.source_media = Some(source_media);
        self
    }
}

#[derive(Clone, PartialEq)]
pub struct GeneratedMedia {
    pub media: Vec<u8>,
    pub media_kind: MediaKind,
    pub size_bytes: u64,
    pub elapsed_ms: u64,
}

impl GeneratedMedia {
    pub fn new(media: Vec<u8>, media_kind: MediaKind, elapsed_ms: u64) -> Self {
        let size_bytes = media.len() as u64;
        Self {
            media,
            media_kind,
            size_bytes,
            elapsed_ms,
        }
    }
}

impl fmt::Debug for GeneratedMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedMedia")
            .field("media", &format_args!("{} bytes", self.media.len()))
            .field("media_kind", &self.media_kind)
            .field("size_bytes", &self.size_bytes)
            .field("elapsed_ms", &self.elapsed_ms)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Success(GeneratedMedia),
    Failure(GenerationFailure),
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn success(&self) -> Option<&GeneratedMedia> {
        match self {
            Self::Success(media) => Some(media),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&GenerationFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaOutput {
    pub bytes: Vec<u8>,
    pub media_kind: MediaKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "starting" => Some(Self::Starting),
            "processing" => Some(Self::Processing),
            "succeeded" => Some(Self::Succeeded),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderJob {
    pub id: String,
    pub status: JobStatus,
    pub output: Option<String>,
    pub error: Option<String>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

// Credentials never reach logs; Debug shows presence only.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AdapterContext {
    pub deadline: Instant,
    pub metadata: BTreeMap<String, String>,
}

impl AdapterContext {
    pub fn new(deadline: Instant) -> Self {
        Self {
            deadline,
            metadata: BTreeMap::new(),
        }
    }
}
