use std::collections::BTreeMap;

use serde_json::json;

use crate::transport::{
    HttpMethod, MultipartField, RawResponse, TransportBody, TransportRequest,
};

#[test]
fn test_transport_request_builders() {
    let get = TransportRequest::get("http://localhost/jobs/abc");
    assert_eq!(get.method, HttpMethod::Get);
    assert_eq!(get.url, "http://localhost/jobs/abc");
    assert_eq!(get.body, TransportBody::Empty);
    assert!(get.headers.is_empty());

    let post = TransportRequest::post_json("http://localhost/generate", json!({"prompt": "hi"}))
        .with_bearer("token-abc")
        .with_header("x-trace", "t-1");
    assert_eq!(post.method, HttpMethod::Post);
    assert_eq!(
        post.headers.get("authorization"),
        Some(&"Bearer token-abc".to_string())
    );
    assert_eq!(post.headers.get("x-trace"), Some(&"t-1".to_string()));
    assert_eq!(post.body, TransportBody::Json(json!({"prompt": "hi"})));
}

#[test]
fn test_multipart_request_carries_fields() {
    let fields = vec![
        MultipartField::text("prompt", "a red fox"),
        MultipartField::file("source", "frame.png", "image/png", vec![1, 2, 3]),
    ];
    let request = TransportRequest::post_multipart("http://localhost/transform", fields.clone());
    assert_eq!(request.body, TransportBody::Multipart(fields));
}

#[test]
fn test_multipart_file_debug_hides_bytes() {
    let field = MultipartField::file("source", "frame.png", "image/png", vec![0u8; 2048]);
    let rendered = format!("{field:?}");
    assert!(rendered.contains("2048 bytes"));
    assert!(!rendered.contains("[0, 0"));
}

#[test]
fn test_raw_response_helpers() {
    let mut headers = BTreeMap::new();
    headers.insert("content-type".to_string(), "image/png".to_string());
    let response = RawResponse {
        status: 200,
        headers,
        body: b"payload".to_vec(),
    };

    assert!(response.is_success());
    assert_eq!(response.content_type(), Some("image/png"));
    assert_eq!(response.header("Content-Type"), Some("image/png"));
    assert_eq!(response.header("x-missing"), None);
    assert_eq!(response.body_text(), "payload");

    let failure = RawResponse {
        status: 503,
        headers: BTreeMap::new(),
        body: Vec::new(),
    };
    assert!(!failure.is_success());
}
