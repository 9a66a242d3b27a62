//! HTTP provider integration tests against a mock upstream.

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tollbooth_core::OperationKind;
use tollbooth_provider::{
    invoke_with_retry, HttpProvider, Provider, ProviderRequest, RetryPolicy,
};

fn request() -> ProviderRequest {
    ProviderRequest {
        kind: OperationKind::Translate,
        units: 1000.0,
        options: None,
        payload: serde_json::json!({ "text": "hello", "target": "de" }),
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(5),
        attempt_timeout: Duration::from_secs(5),
    }
}

async fn provider_for(server: &MockServer) -> HttpProvider {
    HttpProvider::new(server.uri(), Some("test-key".into()), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn success_returns_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/translate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output": { "text": "hallo" }
            })),
        )
        .mount(&server)
        .await;

    let provider = provider_for(&server).await;
    let response = provider.invoke(&request()).await.unwrap();
    assert_eq!(response.output["text"], "hallo");
}

#[tokio::test]
async fn server_errors_are_transient_and_retried_to_success() {
    let server = MockServer::start().await;

    // Two failures, then success.
    Mock::given(method("POST"))
        .and(path("/v1/translate"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/translate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "output": { "text": "hallo" }
            })),
        )
        .mount(&server)
        .await;

    let provider = provider_for(&server).await;
    let response = invoke_with_retry(&provider, &request(), &fast_policy())
        .await
        .unwrap();
    assert_eq!(response.output["text"], "hallo");
}

#[tokio::test]
async fn upstream_rate_limit_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let provider = provider_for(&server).await;
    let err = provider.invoke(&request()).await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn auth_failure_is_permanent_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server).await;
    let err = invoke_with_retry(&provider, &request(), &fast_policy())
        .await
        .unwrap_err();
    assert!(!err.is_transient());
}

#[tokio::test]
async fn transient_errors_exhaust_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let provider = provider_for(&server).await;
    let err = invoke_with_retry(&provider, &request(), &fast_policy())
        .await
        .unwrap_err();
    assert!(err.is_transient());
}
