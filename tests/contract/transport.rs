//! Contract tests for the authenticated transport

use annomarket::job::JobManager;
use annomarket::{ClientConfig, ClientError, RestClient};
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{client, job_body};

#[tokio::test]
async fn test_every_request_carries_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/1"))
        .and(header("Authorization", "Basic a2V5OnNlY3JldA=="))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_body(&server, 1, "j", "READY")))
        .expect(1)
        .mount(&server)
        .await;

    JobManager::new(client(&server)).get_job(1).await.unwrap();
}

#[tokio::test]
async fn test_non_json_error_is_unstructured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/1"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad gateway</html>"))
        .mount(&server)
        .await;

    let err = JobManager::new(client(&server)).get_job(1).await.unwrap_err();
    assert!(matches!(err, ClientError::HttpError { status: 502 }));
    assert!(!err.is_structured());
    assert!(err.response().is_none());
}

#[tokio::test]
async fn test_malformed_success_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;

    let err = JobManager::new(client(&server)).get_job(1).await.unwrap_err();
    assert!(matches!(err, ClientError::ParseError(_)));
}

#[tokio::test]
async fn test_redirect_without_location_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/1/results/a.zip"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let url = format!("{}/job/1/results/a.zip", server.uri());
    let err = client(&server).get_redirect(&url).await.unwrap_err();
    assert!(matches!(err, ClientError::MissingRedirect(_)));
}

#[tokio::test]
async fn test_redirect_failure_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job/1/results/a.zip"))
        .respond_with(ResponseTemplate::new(410).set_body_json(json!({"message": "Results expired"})))
        .mount(&server)
        .await;

    let url = format!("{}/job/1/results/a.zip", server.uri());
    let err = client(&server).get_redirect(&url).await.unwrap_err();
    assert_eq!(err.status(), Some(410));
    assert!(err.is_structured());
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let config = ClientConfig::new("key", "secret")
        .with_base_url("http://127.0.0.1:1/")
        .with_timeout(Duration::from_secs(5));
    let client = RestClient::shared(&config).unwrap();

    let err = JobManager::new(client).get_job(1).await.unwrap_err();
    assert!(matches!(err, ClientError::NetworkError(_)));
    assert!(err.response().is_none());
    assert_eq!(err.status(), None);
}

#[test]
fn test_missing_credentials_rejected_before_any_request() {
    let result = RestClient::new(&ClientConfig::new("", "secret"));
    assert!(matches!(result, Err(ClientError::InvalidArgument(_))));

    let result = RestClient::new(&ClientConfig::new("key", ""));
    assert!(matches!(result, Err(ClientError::InvalidArgument(_))));
}

/// Serve one response whose body arrives in single bytes, `pause` apart
async fn trickle_server(head: &'static str, body: &'static [u8], pause: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await.unwrap();
        socket.write_all(head.as_bytes()).await.unwrap();
        for byte in body {
            tokio::time::sleep(pause).await;
            socket.write_all(&[*byte]).await.unwrap();
            socket.flush().await.unwrap();
        }
    });
    addr
}

fn short_timeout_client(addr: SocketAddr) -> RestClient {
    let config = ClientConfig::new("key", "secret")
        .with_base_url(format!("http://{addr}/"))
        .with_timeout(Duration::from_secs(1));
    RestClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_slow_download_outlives_request_timeout() {
    let addr = trickle_server(
        "HTTP/1.1 200 OK\r\nContent-Length: 6\r\nConnection: close\r\n\r\n",
        b"abcdef",
        Duration::from_millis(300),
    )
    .await;
    let client = short_timeout_client(addr);

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("results.zip");
    let url = Url::parse(&format!("http://{addr}/signed/results.zip")).unwrap();
    let written = client.download_to_file(&url, &dest, None).await.unwrap();

    assert_eq!(written, 6);
    assert_eq!(std::fs::read(&dest).unwrap(), b"abcdef");
}

#[tokio::test]
async fn test_truncated_download_leaves_no_files() {
    let addr = trickle_server(
        "HTTP/1.1 200 OK\r\nContent-Length: 10\r\nConnection: close\r\n\r\n",
        b"abc",
        Duration::from_millis(10),
    )
    .await;
    let client = short_timeout_client(addr);

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("results.zip");
    let url = Url::parse(&format!("http://{addr}/signed/results.zip")).unwrap();
    let err = client.download_to_file(&url, &dest, None).await.unwrap_err();

    assert!(matches!(err, ClientError::NetworkError(_)));
    assert!(!dest.exists());
    assert!(!dir.path().join("results.zip.part").exists());
}
