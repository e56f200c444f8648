//! `GithubSearch` response classification against a mock server

use serde_json::json;
use sig_census::config::SearchConfig;
use sig_census::search::{GithubSearch, SearchBackend, SearchOutcome};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn search_config(server: &MockServer) -> SearchConfig {
    SearchConfig {
        api_url: format!("{}/search/code", server.uri()),
        request_timeout_secs: 5,
        ..SearchConfig::default()
    }
}

#[tokio::test]
async fn test_page_request_and_parsing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/code"))
        .and(query_param("q", "\"cudaMalloc\" size:0..4"))
        .and(query_param("per_page", "100"))
        .and(query_param("page", "2"))
        .and(header("accept", "application/vnd.github.v3+json"))
        .and(header("authorization", "token secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 2,
            "incomplete_results": false,
            "items": [
                {"name": "main.cu", "repository": {"full_name": "octo/gpu"}},
                {"name": "alloc.cu", "repository": {"full_name": "octo/sim"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let search = GithubSearch::new(&search_config(&server), Some("secret-token"))
        .expect("Failed to build search client");
    let outcome = search.search("\"cudaMalloc\" size:0..4", 2, 100).await;

    assert_eq!(
        outcome,
        SearchOutcome::page(2, vec!["octo/gpu".to_string(), "octo/sim".to_string()])
    );
}

#[tokio::test]
async fn test_too_many_requests_is_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let search = GithubSearch::new(&search_config(&server), None).unwrap();
    assert_eq!(search.search("q", 1, 100).await, SearchOutcome::RateLimited);
}

#[tokio::test]
async fn test_forbidden_with_exhausted_quota_is_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .set_body_string(r#"{"message": "API rate limit exceeded"}"#),
        )
        .mount(&server)
        .await;

    let search = GithubSearch::new(&search_config(&server), None).unwrap();
    assert_eq!(search.search("q", 1, 100).await, SearchOutcome::RateLimited);
}

#[tokio::test]
async fn test_plain_forbidden_is_query_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let search = GithubSearch::new(&search_config(&server), None).unwrap();
    assert_eq!(
        search.search("q", 1, 100).await,
        SearchOutcome::QueryError {
            status: 403,
            message: "Forbidden".to_string(),
        }
    );
}

#[tokio::test]
async fn test_validation_failure_is_query_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_string(r#"{"message": "Validation Failed"}"#),
        )
        .mount(&server)
        .await;

    let search = GithubSearch::new(&search_config(&server), None).unwrap();
    let outcome = search.search("q", 11, 100).await;

    match outcome {
        SearchOutcome::QueryError { status, message } => {
            assert_eq!(status, 422);
            assert!(message.contains("Validation Failed"));
        }
        other => panic!("expected query error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    // Nothing listens on port 1
    let config = SearchConfig {
        api_url: "http://127.0.0.1:1/search/code".to_string(),
        request_timeout_secs: 5,
        ..SearchConfig::default()
    };

    let search = GithubSearch::new(&config, None).unwrap();
    let outcome = search.search("q", 1, 100).await;

    assert!(
        matches!(outcome, SearchOutcome::NetworkError { .. }),
        "expected network error, got {:?}",
        outcome
    );
}
