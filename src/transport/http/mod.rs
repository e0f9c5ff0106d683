use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};

use crate::core::error::{ConfigError, TransportError};
use crate::transport::{
    HttpMethod, MultipartField, RawResponse, Transport, TransportBody, TransportRequest,
};

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// reqwest-backed transport. Each `execute` call is exactly one wire
/// attempt; recovery decisions belong to the layers above.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout_ms: u64,
}

impl HttpTransport {
    pub fn new(timeout_ms: u64) -> Result<Self, ConfigError> {
        Self::validate_timeout(timeout_ms)?;

        Ok(Self {
            client: reqwest::Client::new(),
            timeout_ms,
        })
    }

    pub fn with_client(client: reqwest::Client, timeout_ms: u64) -> Result<Self, ConfigError> {
        Self::validate_timeout(timeout_ms)?;

        Ok(Self { client, timeout_ms })
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    fn validate_timeout(timeout_ms: u64) -> Result<(), ConfigError> {
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout { timeout_ms });
        }
        Ok(())
    }

    fn build_headers(headers: &BTreeMap<String, String>) -> Result<HeaderMap, TransportError> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|error| {
                TransportError::InvalidRequest {
                    message: format!("invalid header name: {name}: {error}"),
                }
            })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|error| TransportError::InvalidRequest {
                    message: format!("invalid header value for {name}: {error}"),
                })?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }

    fn map_request_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout {
                timeout_ms: self.timeout_ms,
                message: error.to_string(),
            }
        } else {
            TransportError::Failed {
                message: error.to_string(),
            }
        }
    }
}

fn build_multipart_form(fields: Vec<MultipartField>) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for field in fields {
        form = match field {
            MultipartField::Text { name, value } => form.text(name, value),
            MultipartField::File {
                name,
                file_name,
                mime_type,
                bytes,
            } => {
                let part = Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(&mime_type)
                    .map_err(|error| TransportError::InvalidRequest {
                        message: format!("invalid mime type {mime_type}: {error}"),
                    })?;
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, req: TransportRequest) -> Result<RawResponse, TransportError> {
        let method = match req.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };
        let headers = Self::build_headers(&req.headers)?;

        let mut request_builder = self
            .client
            .request(method, &req.url)
            .timeout(Duration::from_millis(self.timeout_ms))
            .headers(headers);

        request_builder = match req.body {
            TransportBody::Empty => request_builder,
            TransportBody::Json(value) => {
                let payload =
                    serde_json::to_vec(&value).map_err(|error| TransportError::InvalidRequest {
                        message: format!("failed to encode json body: {error}"),
                    })?;
                request_builder
                    .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                    .body(payload)
            }
            TransportBody::Multipart(fields) => {
                request_builder.multipart(build_multipart_form(fields)?)
            }
        };

        let response = request_builder
            .send()
            .await
            .map_err(|error| self.map_request_error(error))?;

        let status = response.status().as_u16();
        let mut headers = BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(text) = value.to_str() {
                headers.insert(name.as_str().to_ascii_lowercase(), text.to_string());
            }
        }
        let body = response
            .bytes()
            .await
            .map_err(|error| self.map_request_error(error))?
            .to_vec();

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
