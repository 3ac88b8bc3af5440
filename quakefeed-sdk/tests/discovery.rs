//! HTTP server-list discovery against a mock endpoint.

use std::time::Duration;

use serde_json::json;
use tokio::net::TcpListener;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quakefeed_sdk::discovery::{HttpDiscovery, ServerDiscovery};
use quakefeed_sdk::error::DiscoveryError;

const LIST_PATH: &str = "/api/server/list/";

async fn mock_list(token: &str, response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(response)
        .expect(1)
        .mount(&server)
        .await;
    server
}

fn discovery(server: &MockServer) -> HttpDiscovery {
    HttpDiscovery::new(format!("{}{LIST_PATH}", server.uri()), Duration::from_secs(5))
}

#[tokio::test]
async fn server_list_sends_bearer_and_parses_body() {
    let server = mock_list(
        "tok-123",
        ResponseTemplate::new(200)
            .set_body_json(json!({"servers": ["wss://a.example", "wss://b.example"]})),
    )
    .await;

    let servers = discovery(&server).server_list("tok-123").await.unwrap();
    assert_eq!(servers, vec!["wss://a.example", "wss://b.example"]);
}

#[tokio::test]
async fn non_200_is_a_status_error() {
    let server = mock_list(
        "tok",
        ResponseTemplate::new(401).set_body_json(json!({"error": "bad token"})),
    )
    .await;

    match discovery(&server).server_list("tok").await {
        Err(DiscoveryError::Status { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("bad token"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_list_is_an_error() {
    let server = mock_list(
        "tok",
        ResponseTemplate::new(200).set_body_json(json!({"servers": []})),
    )
    .await;

    assert!(matches!(
        discovery(&server).server_list("tok").await,
        Err(DiscoveryError::Empty)
    ));
}

#[tokio::test]
async fn undecodable_body_is_an_error() {
    let server = mock_list(
        "tok",
        ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"),
    )
    .await;

    assert!(matches!(
        discovery(&server).server_list("tok").await,
        Err(DiscoveryError::Body(_))
    ));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_request_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let http = HttpDiscovery::new(format!("http://{addr}/"), Duration::from_secs(5));
    let result = http.server_list("tok").await;
    assert!(matches!(result, Err(DiscoveryError::Request(_))), "{result:?}");
}
