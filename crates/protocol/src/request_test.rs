//! Tests for the request contract and per-request view

use super::*;
use http::Method;

#[test]
fn test_header_lookup_case_insensitive() {
    let request = LogRequest::new(Method::GET, "https://example.com/")
        .with_header("X-AB-Test-Group", "B");

    assert_eq!(request.header("x-ab-test-group"), Some("B"));
    assert_eq!(request.header("X-Ab-Test-Group"), Some("B"));
    assert_eq!(request.header("missing"), None);
}

#[test]
fn test_view_parses_url_parts() {
    let request = LogRequest::new(Method::GET, "https://example.com/a/b?q=1");
    let view = RequestView::new(&request);

    let url = view.url().unwrap();
    assert_eq!(url.host_str(), Some("example.com"));
    assert_eq!(url.path(), "/a/b");
    assert_eq!(url.query(), Some("q=1"));
}

#[test]
fn test_view_tolerates_malformed_url() {
    let request = LogRequest::new(Method::GET, "not a url");
    let view = RequestView::new(&request);
    assert!(view.url().is_none());
}

#[test]
fn test_cookie_parsing() {
    let request = LogRequest::new(Method::GET, "https://example.com/")
        .with_header("Cookie", "cId=abc; sId=def; flag");
    let view = RequestView::new(&request);

    assert_eq!(view.cookie("cId"), Some("abc"));
    assert_eq!(view.cookie("sId"), Some("def"));
    assert_eq!(view.cookie("flag"), None);
    assert_eq!(view.cookie("missing"), None);
}

#[test]
fn test_cookie_first_occurrence_wins() {
    let request = LogRequest::new(Method::GET, "https://example.com/")
        .with_header("Cookie", "cId=first; cId=second");
    let view = RequestView::new(&request);

    assert_eq!(view.cookie("cId"), Some("first"));
}

#[test]
fn test_cookies_merged_across_headers() {
    let request = LogRequest::new(Method::GET, "https://example.com/")
        .with_header("Cookie", "a=1")
        .with_header("Cookie", "b=2");
    let view = RequestView::new(&request);

    assert_eq!(view.cookie("a"), Some("1"));
    assert_eq!(view.cookie("b"), Some("2"));
}

#[test]
fn test_body_is_cheaply_clonable() {
    let request = LogRequest::new(Method::POST, "https://example.com/")
        .with_body("payload");

    // Cloning the handle does not disturb the original
    let copy = request.body.clone().unwrap();
    assert_eq!(&copy[..], b"payload");
    assert_eq!(request.body.as_deref(), Some(&b"payload"[..]));
}

#[test]
fn test_cf_properties_deserialize_camel_case() {
    let cf: CfProperties = serde_json::from_str(
        r#"{
            "asn": 13335,
            "colo": "SJC",
            "regionCode": "CA",
            "clientTcpRtt": 12,
            "botManagement": {"score": 98, "verifiedBot": false, "ja3Hash": "abc"}
        }"#,
    )
    .unwrap();

    assert_eq!(cf.asn, Some(13335));
    assert_eq!(cf.region_code.as_deref(), Some("CA"));
    assert_eq!(cf.client_tcp_rtt, Some(12));
    let bm = cf.bot_management.unwrap();
    assert_eq!(bm.score, Some(98));
    assert_eq!(bm.verified_bot, Some(false));
    assert_eq!(bm.ja3_hash.as_deref(), Some("abc"));
}
