//! Full two-phase census runs against a mock search API

use serde_json::{json, Value};
use sig_census::checkpoint::CheckpointStore;
use sig_census::config::{BinSegment, Config};
use sig_census::crawler::{CrawlOutcome, Orchestrator, ResumePolicy};
use sig_census::search::GithubSearch;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Creates a test configuration with two bins (0..4, 5..9) plus the tail
fn create_test_config(server: &MockServer, dir: &Path, per_page: u32) -> Config {
    let mut config = Config::default();
    config.search.api_url = format!("{}/search/code", server.uri());
    config.search.per_page = per_page;
    config.search.request_timeout_secs = 5;
    config.signatures.set_a = "cudaMalloc".to_string();
    config.signatures.set_b = "hip_runtime.h".to_string();
    config.throttle.page_delay_ms = 0;
    config.throttle.rate_limit_cooldown_ms = 10;
    config.throttle.network_retry_delay_ms = 10;
    config.throttle.network_retry_max_delay_ms = 10;
    config.throttle.network_max_retries = 1;
    config.output.checkpoint_path = dir.join("checkpoint.json");
    config.output.result_path = dir.join("pure.txt");
    config.bins = vec![BinSegment::new(0, 10, 5)];
    config
}

fn results(total: u64, repos: &[&str]) -> Value {
    let items: Vec<Value> = repos
        .iter()
        .map(|repo| {
            json!({
                "name": "kernel.cu",
                "path": "src/kernel.cu",
                "repository": {"full_name": repo}
            })
        })
        .collect();
    json!({"total_count": total, "incomplete_results": false, "items": items})
}

/// Mounts a 200 response for one query and page
async fn mount_page(server: &MockServer, query: &str, page: u32, total: u64, repos: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .and(query_param("q", query))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(results(total, repos)))
        .mount(server)
        .await;
}

/// Anything not scripted is an empty result
async fn mount_empty_fallback(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(results(0, &[])))
        .mount(server)
        .await;
}

fn query_of(request: &Request) -> String {
    request
        .url
        .query_pairs()
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}

async fn requested_queries(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .iter()
        .map(query_of)
        .collect()
}

#[tokio::test]
async fn test_full_census_with_rate_limit() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");

    mount_page(&server, "\"cudaMalloc\" size:0..4", 1, 2, &["octo/r1", "octo/r2"]).await;
    mount_page(&server, "\"cudaMalloc\" size:5..9", 1, 1, &["octo/r3"]).await;

    // Two rate-limit responses before phase B's first bin is served
    Mock::given(method("GET"))
        .and(query_param("q", "\"hip_runtime.h\" size:0..4"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, "\"hip_runtime.h\" size:0..4", 1, 1, &["octo/r2"]).await;
    mount_empty_fallback(&server).await;

    let config = create_test_config(&server, dir.path(), 100);
    let result_path = config.output.result_path.clone();
    let checkpoint_path = config.output.checkpoint_path.clone();
    let search = GithubSearch::new(&config.search, Some("test-token")).expect("client");

    let orchestrator = Orchestrator::new(config, search, ResumePolicy::Ask);
    let outcome = orchestrator
        .run(std::future::pending())
        .await
        .expect("Census failed");

    let CrawlOutcome::Completed(report) = outcome else {
        panic!("expected completion, got {:?}", outcome);
    };
    assert_eq!(report.set_a, 3);
    assert_eq!(report.set_b, 1);
    assert_eq!(report.hybrid, 1);
    assert_eq!(report.pure_a, 2);

    let written = std::fs::read_to_string(&result_path).expect("result file");
    assert_eq!(written, "octo/r1\nocto/r3\n");
    assert!(!checkpoint_path.exists(), "checkpoint should be cleared");

    let queries = requested_queries(&server).await;
    let phase_b_first_bin = queries
        .iter()
        .filter(|q| q.as_str() == "\"hip_runtime.h\" size:0..4")
        .count();
    assert_eq!(phase_b_first_bin, 3);
    // 3 bins per phase, plus the two rate-limited retries
    assert_eq!(queries.len(), 8);
}

#[tokio::test]
async fn test_query_error_keeps_partial_bin_and_continues() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");

    // Full first page (per_page = 2), then the API refuses page 2
    mount_page(&server, "\"cudaMalloc\" size:0..4", 1, 40, &["octo/a", "octo/b"]).await;
    Mock::given(method("GET"))
        .and(query_param("q", "\"cudaMalloc\" size:0..4"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(422).set_body_string("Validation Failed"))
        .mount(&server)
        .await;
    mount_page(&server, "\"cudaMalloc\" size:>9", 1, 1, &["octo/big"]).await;
    mount_empty_fallback(&server).await;

    let config = create_test_config(&server, dir.path(), 2);
    let result_path = config.output.result_path.clone();
    let search = GithubSearch::new(&config.search, None).expect("client");

    let orchestrator = Orchestrator::new(config, search, ResumePolicy::Never);
    let outcome = orchestrator.run(std::future::pending()).await.expect("Census failed");

    assert!(matches!(outcome, CrawlOutcome::Completed(ref r) if r.set_a == 3 && r.set_b == 0));
    let written = std::fs::read_to_string(&result_path).expect("result file");
    assert_eq!(written, "octo/a\nocto/b\nocto/big\n");
}

#[tokio::test]
async fn test_resume_from_plain_checkpoint_skips_finished_phase() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");

    mount_page(&server, "\"hip_runtime.h\" size:>9", 1, 1, &["octo/r1"]).await;
    mount_empty_fallback(&server).await;

    let config = create_test_config(&server, dir.path(), 100);
    let result_path = config.output.result_path.clone();

    // A bare checkpoint: no fingerprint, no timestamp
    std::fs::write(
        &config.output.checkpoint_path,
        r#"{"phase": "B", "last_bin_idx": 1, "set_a": ["octo/r1", "octo/r2"], "set_b": []}"#,
    )
    .expect("seed checkpoint");

    let search = GithubSearch::new(&config.search, None).expect("client");
    let orchestrator = Orchestrator::new(config, search, ResumePolicy::Always);
    let outcome = orchestrator.run(std::future::pending()).await.expect("Census failed");

    let CrawlOutcome::Completed(report) = outcome else {
        panic!("expected completion, got {:?}", outcome);
    };
    assert_eq!((report.set_a, report.set_b, report.pure_a, report.hybrid), (2, 1, 1, 1));
    assert_eq!(requested_queries(&server).await, vec!["\"hip_runtime.h\" size:>9"]);
    assert_eq!(std::fs::read_to_string(&result_path).unwrap(), "octo/r2\n");
}

#[tokio::test]
async fn test_checkpoint_survives_failed_output() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");

    mount_page(&server, "\"cudaMalloc\" size:0..4", 1, 1, &["octo/r1"]).await;
    mount_empty_fallback(&server).await;

    let mut config = create_test_config(&server, dir.path(), 100);
    config.output.result_path = dir.path().join("missing").join("pure.txt");
    let store = CheckpointStore::new(config.output.checkpoint_path.clone());
    let search = GithubSearch::new(&config.search, None).expect("client");

    let orchestrator = Orchestrator::new(config, search, ResumePolicy::Never);
    let result = orchestrator.run(std::future::pending()).await;

    assert!(result.is_err());
    // Both phases are checkpointed, so a rerun only has to finalize
    let saved = store.load().expect("checkpoint kept");
    assert_eq!(saved.last_bin_idx, 2);
    assert!(saved.sets.set_a.contains("octo/r1"));
}
