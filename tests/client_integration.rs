//! End-to-end client behavior against a mock HTTP server
//!
//! Exercises the warmup flow, session-invalidation recovery, retry bounds,
//! and the domain search endpoints over wiremock fixtures.

mod common;

use common::helpers::{mount_warmup_fixtures, test_client, test_settings};
use instant_domains::{
    Error, InstantDomainsClient, PayloadFormat, RequestSpec, SessionStatus, Shape,
    normalize::{FieldSource, FieldSpec},
    types::RawResponse,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_warmup_establishes_session() {
    let server = MockServer::start().await;
    mount_warmup_fixtures(&server).await;

    let client = test_client(&server.uri());
    client.warmup().await.unwrap();

    let state = client.session().await;
    assert_eq!(state.status, SessionStatus::Ready);
    assert_eq!(state.cookies.get("sid").map(String::as_str), Some("abc"));
    assert_eq!(state.tokens.get("csrf").map(String::as_str), Some("xyz"));
}

#[tokio::test]
async fn test_warmup_is_idempotent() {
    let server = MockServer::start().await;
    mount_warmup_fixtures(&server).await;

    let client = test_client(&server.uri());
    client.warmup().await.unwrap();
    client.warmup().await.unwrap();

    assert_eq!(client.warmup_runs(), 1);
}

#[tokio::test]
async fn test_execute_sends_cookies_and_token() {
    let server = MockServer::start().await;
    mount_warmup_fixtures(&server).await;

    Mock::given(method("GET"))
        .and(path("/services/data"))
        .and(header("cookie", "sid=abc"))
        .and(header("x-csrf-token", "xyz"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"ok":true}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let spec = RequestSpec::get("/services/data").with_required_token(true);
    let raw = client.execute(&spec).await.unwrap();

    assert_eq!(raw.status, 200);
    assert_eq!(raw.body, r#"{"ok":true}"#);
}

#[tokio::test]
async fn test_concurrent_executes_share_one_warmup() {
    let server = MockServer::start().await;
    mount_warmup_fixtures(&server).await;

    Mock::given(method("GET"))
        .and(path("/services/data"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"ok":true}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let client = Arc::new(test_client(&server.uri()));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(async move {
            let spec = RequestSpec::get("/services/data").with_required_token(true);
            client.execute(&spec).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(client.warmup_runs(), 1);

    // The landing page was fetched exactly once
    let requests = server.received_requests().await.unwrap();
    let landing_hits = requests.iter().filter(|r| r.url.path() == "/").count();
    assert_eq!(landing_hits, 1);
}

#[tokio::test]
async fn test_session_invalidation_recovers_once() {
    let server = MockServer::start().await;
    mount_warmup_fixtures(&server).await;

    // First call is rejected as unauthenticated, the retry after re-warmup
    // succeeds
    Mock::given(method("GET"))
        .and(path("/services/data"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/services/data"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"ok":true}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let spec = RequestSpec::get("/services/data").with_required_token(true);
    let raw = client.execute(&spec).await.unwrap();

    assert_eq!(raw.status, 200);
    assert_eq!(client.warmup_runs(), 2);
    assert_eq!(client.session().await.status, SessionStatus::Ready);
}

#[tokio::test]
async fn test_repeated_invalidation_is_authentication_error() {
    let server = MockServer::start().await;
    mount_warmup_fixtures(&server).await;

    Mock::given(method("GET"))
        .and(path("/services/data"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let spec = RequestSpec::get("/services/data").with_required_token(true);
    let err = client.execute(&spec).await.unwrap_err();

    assert!(matches!(err, Error::Authentication { .. }));
    // Session is left expired so the next call starts fresh
    assert_eq!(client.session().await.status, SessionStatus::Expired);
}

#[tokio::test]
async fn test_warmup_redirect_depth_bound() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.warmup().await.unwrap_err();

    assert!(matches!(err, Error::SessionInitialization { .. }));
    assert!(err.to_string().contains("redirect depth"));
}

#[tokio::test]
async fn test_warmup_missing_token_names_it() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/services/geography"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/services/auth/session"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"user":null}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.warmup().await.unwrap_err();

    assert!(matches!(err, Error::SessionInitialization { .. }));
    assert!(err.to_string().contains("csrf"));
}

#[tokio::test]
async fn test_transport_failure_exhausts_retries() {
    // Nothing is listening on this port
    let mut settings = test_settings("http://127.0.0.1:9");
    settings.http.timeout_secs = 1;
    let client = InstantDomainsClient::with_settings(settings).unwrap();

    let spec = RequestSpec::get("/services/data");
    let err = client.execute(&spec).await.unwrap_err();

    match err {
        Error::Transport { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_domain_search_end_to_end() {
    let server = MockServer::start().await;
    mount_warmup_fixtures(&server).await;

    Mock::given(method("GET"))
        .and(path("/services/zone-names/dealerflow"))
        .and(query_param("limit", "64"))
        .and(query_param("tlds", "com,io"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"results":[
                {"label":"dealerflow","tld":"com","isRegistered":true},
                {"label":"dealerflow","tld":"io","isRegistered":false}
            ],"took":12}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/services/fix/dealerflow"))
        .and(query_param("limit", "32"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"results":[{"label":"dealerhub","tld":"com"}]}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/services/verisign/check"))
        .and(body_string_contains("search=dealerflow"))
        .and(body_string_contains("names=dealerhub.com"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"data":{"results":[{"name":"dealerhub.com","availability":"available"}]}}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    client.warmup().await.unwrap();

    let tlds = vec!["com".to_string(), "io".to_string()];
    let results = client
        .domain_search()
        .search("dealerflow", &tlds, true)
        .await
        .unwrap();

    assert_eq!(results.query, "dealerflow");
    assert_eq!(results.main_results.len(), 2);
    assert_eq!(results.main_results[0].domain, "dealerflow.com");
    assert!(!results.main_results[0].is_available);
    assert_eq!(results.main_results[1].domain, "dealerflow.io");
    assert!(results.main_results[1].is_available);

    assert_eq!(results.suggested_results.len(), 1);
    assert_eq!(results.suggested_results[0].domain, "dealerhub.com");
    assert!(results.suggested_results[0].is_available);
}

#[tokio::test]
async fn test_domain_search_without_suggestions_skips_endpoints() {
    let server = MockServer::start().await;
    mount_warmup_fixtures(&server).await;

    Mock::given(method("GET"))
        .and(path("/services/zone-names/example"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"results":[{"label":"example","tld":"com","isRegistered":true}]}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    client.warmup().await.unwrap();

    let tlds = vec!["com".to_string()];
    let results = client
        .domain_search()
        .search("example", &tlds, false)
        .await
        .unwrap();

    assert_eq!(results.main_results.len(), 1);
    assert!(results.suggested_results.is_empty());

    let requests = server.received_requests().await.unwrap();
    assert!(
        requests
            .iter()
            .all(|r| !r.url.path().starts_with("/services/fix"))
    );
}

#[tokio::test]
async fn test_normalize_round_trip_preserves_undeclared_fields() {
    let client = InstantDomainsClient::new().unwrap();

    let raw = RawResponse::new(
        200,
        Some("application/json".to_string()),
        r#"{"a": 1, "b": "two", "c": [3]}"#,
    );
    let shape = Shape::new("round-trip")
        .with_field(FieldSpec::new("a", FieldSource::JsonPointer("/a".to_string())).required())
        .with_field(FieldSpec::new("b", FieldSource::JsonPointer("/b".to_string())).required());

    let result = client.normalize(&raw, PayloadFormat::Json, &shape).unwrap();

    assert_eq!(result.get("a"), Some(&serde_json::json!(1)));
    assert_eq!(result.get("b"), Some(&serde_json::json!("two")));
    assert_eq!(result.extra.len(), 1);
    assert_eq!(result.get_extra("c"), Some(&serde_json::json!([3])));
}

#[tokio::test]
async fn test_rotated_token_is_picked_up_from_any_response() {
    let server = MockServer::start().await;
    mount_warmup_fixtures(&server).await;

    // A business endpoint rotating the csrf token in its body
    Mock::given(method("GET"))
        .and(path("/services/data"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"ok":true,"csrfToken":"rotated"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    client.warmup().await.unwrap();
    assert_eq!(
        client.session().await.tokens.get("csrf").map(String::as_str),
        Some("xyz")
    );

    let spec = RequestSpec::get("/services/data").with_required_token(true);
    client.execute(&spec).await.unwrap();

    assert_eq!(
        client.session().await.tokens.get("csrf").map(String::as_str),
        Some("rotated")
    );
}
