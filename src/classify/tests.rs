use super::*;
use crate::core::error::{ErrorKind, TransportError};

#[test]
fn test_cold_start_profile_maps_not_ready_statuses() {
    let not_found = classify_status(StatusProfile::ColdStartBinary, 404, b"");
    assert_eq!(not_found.kind, ErrorKind::ModelWarmingUp);
    assert_eq!(not_found.http_status, Some(404));
    assert!(not_found.suggestion.is_some());

    let unavailable = classify_status(StatusProfile::ColdStartBinary, 503, b"loading");
    assert_eq!(unavailable.kind, ErrorKind::ModelWarmingUp);
    assert_eq!(unavailable.http_status, Some(503));
}

#[test]
fn test_standard_profile_keeps_conventional_statuses() {
    let not_found = classify_status(StatusProfile::Standard, 404, b"");
    assert_eq!(not_found.kind, ErrorKind::NotFound);

    let unavailable = classify_status(StatusProfile::Standard, 503, b"");
    assert_eq!(unavailable.kind, ErrorKind::ModelWarmingUp);
}

#[test]
fn test_shared_status_mappings() {
    for profile in [StatusProfile::ColdStartBinary, StatusProfile::Standard] {
        let auth = classify_status(profile, 401, b"");
        assert_eq!(auth.kind, ErrorKind::AuthError);

        let throttled = classify_status(profile, 429, b"");
        assert_eq!(throttled.kind, ErrorKind::RateLimited);
    }
}

#[test]
fn test_unmapped_statuses_carry_body_detail() {
    let failure = classify_status(
        StatusProfile::Standard,
        500,
        br#"{"error":"cuda out of memory"}"#,
    );
    assert_eq!(failure.kind, ErrorKind::UnknownProviderError);
    assert_eq!(failure.http_status, Some(500));
    assert!(failure.message.contains("500"));
    assert!(failure.message.contains("cuda out of memory"));

    let bodyless = classify_status(StatusProfile::Standard, 500, b"  ");
    assert_eq!(bodyless.message, "unexpected provider status 500");
}

#[test]
fn test_transport_errors_map_onto_taxonomy() {
    let timeout = classify_transport(&TransportError::Timeout {
        timeout_ms: 30_000,
        message: "deadline elapsed".to_string(),
    });
    assert_eq!(timeout.kind, ErrorKind::TransportTimeout);
    assert_eq!(timeout.http_status, None);

    let failed = classify_transport(&TransportError::Failed {
        message: "connection reset".to_string(),
    });
    assert_eq!(failed.kind, ErrorKind::TransportFailure);

    let invalid = classify_transport(&TransportError::InvalidRequest {
        message: "invalid header name".to_string(),
    });
    assert_eq!(invalid.kind, ErrorKind::ValidationError);
}

#[test]
fn test_body_snippet_truncates_and_trims() {
    assert_eq!(body_snippet(b""), None);
    assert_eq!(body_snippet(b"   \n "), None);
    assert_eq!(body_snippet(b" detail "), Some("detail".to_string()));

    let long = "x".repeat(400);
    let snippet = body_snippet(long.as_bytes()).expect("snippet for long body");
    assert_eq!(snippet.chars().count(), 256 + 3);
    assert!(snippet.ends_with("..."));

    let invalid_utf8 = vec![0xff, 0xfe, b'o', b'k'];
    let snippet = body_snippet(&invalid_utf8).expect("snippet for binary body");
    assert!(snippet.contains("ok"));
}
