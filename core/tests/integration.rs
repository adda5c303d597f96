//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port and drives it through
//! `NetworkService` over the default `reqwest` transport, so request
//! building, dispatch, status classification, codecs and cancellation are
//! exercised over real HTTP.

use std::net::SocketAddr;
use std::time::Duration;

use mock_server::{Echo, ErrorBody, Flock};
use network_service::cancel::with_cancellation;
use network_service::transport::ReqwestTransport;
use network_service::{
    CancellationToken, ContentType, Header, JsonDecoder, JsonEncoder, NetworkClient,
    NetworkError, NetworkService, Request, StatusClass, TopLevelDecodable, TopLevelEncodable,
    TransportErrorKind,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct NewFlock<'a> {
    name: &'a str,
    songs: Vec<&'a str>,
}

impl TopLevelEncodable for NewFlock<'_> {
    type Encoder = JsonEncoder;

    fn encoder() -> Self::Encoder {
        JsonEncoder::new()
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct FlockView {
    id: String,
    name: String,
    songs: Vec<String>,
}

impl TopLevelDecodable for FlockView {
    type Decoder = JsonDecoder;

    fn decoder() -> Self::Decoder {
        JsonDecoder
    }
}

async fn start_server() -> SocketAddr {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    addr
}

fn json_headers() -> Vec<Header> {
    vec![ContentType::ApplicationJson.into()]
}

#[tokio::test(flavor = "multi_thread")]
async fn crud_lifecycle() {
    let base = format!("http://{}", start_server().await);
    let service = NetworkService::with_default_transport().unwrap();
    let headers = json_headers();

    // create
    let created: FlockView = service
        .post_codable(
            &format!("{base}/flocks"),
            &headers,
            &NewFlock {
                name: "Starlings",
                songs: vec!["murmur"],
            },
        )
        .await
        .unwrap();
    assert_eq!(created.name, "Starlings");
    assert_eq!(created.songs, vec!["murmur".to_string()]);
    let url = format!("{base}/flocks/{}", created.id);

    // list, decoded with the server's own DTO
    let flocks: Vec<Flock> = service
        .get_with(&format!("{base}/flocks"), &[], JsonDecoder)
        .await
        .unwrap();
    assert_eq!(flocks.len(), 1);
    assert_eq!(flocks[0].id.to_string(), created.id);

    // update with an explicit encoder and default decoder
    let updated: FlockView = service
        .put_encoding_with(
            &url,
            &headers,
            &serde_json::json!({ "songs": ["murmur", "click"] }),
            JsonEncoder::new(),
            JsonDecoder,
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Starlings");
    assert_eq!(updated.songs, vec!["murmur".to_string(), "click".to_string()]);

    // get
    let fetched: FlockView = service.get_decoded(&url, &[]).await.unwrap();
    assert_eq!(fetched, updated);

    // delete yields an empty body
    let body = service.delete(&url, &[]).await.unwrap();
    assert!(body.is_empty());

    // get after delete
    let err = service.get(&url, &[]).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.status_class(), Some(StatusClass::ClientError));
}

#[tokio::test(flavor = "multi_thread")]
async fn client_error_keeps_status_headers_and_body() {
    let base = format!("http://{}", start_server().await);
    let service = NetworkService::with_default_transport().unwrap();

    let err = service
        .post_codable::<_, FlockView>(
            &format!("{base}/flocks"),
            &json_headers(),
            &NewFlock {
                name: " ",
                songs: vec![],
            },
        )
        .await
        .unwrap_err();

    match err {
        NetworkError::Http {
            status,
            headers,
            body,
        } => {
            assert_eq!(status, 400);
            assert!(headers
                .iter()
                .any(|(k, v)| k.eq_ignore_ascii_case("content-type") && v == "application/json"));
            let body: ErrorBody = serde_json::from_slice(&body).unwrap();
            assert_eq!(body.error, "name must not be empty");
        }
        other => panic!("expected an HTTP error, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn server_error_is_not_decoded() {
    let base = format!("http://{}", start_server().await);
    let service = NetworkService::with_default_transport().unwrap();

    let err = service
        .get_decoded::<FlockView>(&format!("{base}/status/503"), &[])
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(err.to_string(), "HTTP 503 Service Unavailable");
}

#[tokio::test(flavor = "multi_thread")]
async fn headers_are_sent_in_order_with_duplicates() {
    let base = format!("http://{}", start_server().await);
    let service = NetworkService::with_default_transport().unwrap();

    let request = Request::post(format!("{base}/echo"))
        .header(("X-Bird", "wren"))
        .header(("X-Bird", "robin"))
        .header(ContentType::TextPlain)
        .body("chirp");
    let echo: Echo = service.start_with(&request, JsonDecoder).await.unwrap();

    assert_eq!(echo.method, "POST");
    assert_eq!(echo.body, "chirp");
    let birds: Vec<&str> = echo
        .headers
        .iter()
        .filter(|(name, _)| name == "x-bird")
        .map(|(_, value)| value.as_str())
        .collect();
    assert_eq!(birds, vec!["wren", "robin"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn cancel_mid_flight_returns_cancelled_promptly() {
    let base = format!("http://{}", start_server().await);
    let service = NetworkService::with_default_transport().unwrap();
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let result = with_cancellation(token, service.get(&format!("{base}/delay/5000"), &[])).await;
    assert_eq!(result, Err(NetworkError::cancelled()));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test(flavor = "multi_thread")]
async fn pre_cancelled_scope_returns_cancelled() {
    let base = format!("http://{}", start_server().await);
    let service = NetworkService::with_default_transport().unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let result = with_cancellation(token, service.get(&format!("{base}/flocks"), &[])).await;
    assert!(result.unwrap_err().is_cancelled());
}

#[tokio::test(flavor = "multi_thread")]
async fn transport_timeout_is_timed_out() {
    let base = format!("http://{}", start_server().await);
    let transport = ReqwestTransport::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let service = NetworkService::new(transport);

    let err = service.get(&format!("{base}/delay/2000"), &[]).await.unwrap_err();
    assert_eq!(err, NetworkError::Transport(TransportErrorKind::TimedOut));
}

#[tokio::test(flavor = "multi_thread")]
async fn connection_refused_is_connection_failed() {
    // Bind then drop to get a port nothing listens on.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let service = NetworkService::with_default_transport().unwrap();

    let err = service.get(&format!("http://{addr}/flocks"), &[]).await.unwrap_err();
    assert_eq!(err, NetworkError::Transport(TransportErrorKind::ConnectionFailed));
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_calls_are_independent() {
    let base = format!("http://{}", start_server().await);
    let service = NetworkService::with_default_transport().unwrap();

    let ok_url = format!("{base}/delay/50");
    let missing_url = format!("{base}/status/404");
    let ok = service.get(&ok_url, &[]);
    let missing = service.get(&missing_url, &[]);
    let (ok, missing) = tokio::join!(ok, missing);

    assert_eq!(ok.unwrap(), "done");
    assert_eq!(missing.unwrap_err().status(), Some(404));
}
