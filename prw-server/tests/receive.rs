use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use http::{HeaderValue, StatusCode};
use prw_client::{BackoffConfig, ClientConfig, WriteClient, WriteError};
use prw_protocol::{DecodedRequest, WriteResponseStats, v1, v2};
use prw_server::{
    DecodedStorage, DecodingStorage, ReceiverConfig, StorageError, WriteReceiver, WriteResponse,
};
use similar_asserts::assert_eq;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Records decoded requests. Fails every request if `failure` is set.
#[derive(Clone, Default)]
struct Recorder {
    requests: Arc<Mutex<Vec<DecodedRequest>>>,
    failure: Option<(StatusCode, WriteResponseStats)>,
}

impl Recorder {
    fn record(
        &self,
        request: DecodedRequest,
        response: &mut WriteResponse,
    ) -> Result<(), StorageError> {
        self.requests.lock().unwrap().push(request);
        response
            .headers_mut()
            .insert("x-storage", HeaderValue::from_static("recorder"));

        match self.failure {
            Some((status, stats)) => {
                response.set_status(status);
                response.set_stats(stats);
                Err(StorageError::new("storage unavailable"))
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DecodedStorage for Recorder {
    async fn store_v1(
        &self,
        request: v1::WriteRequest,
        response: &mut WriteResponse,
    ) -> Result<(), StorageError> {
        self.record(DecodedRequest::V1(request), response)
    }

    async fn store_v2(
        &self,
        request: v2::Request,
        response: &mut WriteResponse,
    ) -> Result<(), StorageError> {
        self.record(DecodedRequest::V2(request), response)
    }
}

struct Server {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl Server {
    async fn start(storage: Recorder) -> Self {
        let receiver = WriteReceiver::new(DecodingStorage::new(storage), ReceiverConfig::default());
        let router = receiver.into_router("/api/v1/write");

        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, handle }
    }

    fn client(&self) -> WriteClient {
        let config = ClientConfig {
            backoff: BackoffConfig {
                min_delay_ms: 1,
                max_delay_ms: 10,
                max_retries: 2,
            },
            ..Default::default()
        };
        WriteClient::new(&format!("http://{}/", self.addr), config).unwrap()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn test_v1_round_trip() {
    prw_test::setup();
    let storage = Recorder::default();
    let server = Server::start(storage.clone()).await;
    let request = prw_test::v1_request(6);

    let stats = server
        .client()
        .write(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        stats,
        WriteResponseStats {
            confirmed: true,
            ..WriteResponseStats::from(&request)
        }
    );
    assert_eq!(
        *storage.requests.lock().unwrap(),
        [DecodedRequest::V1(request)]
    );
}

#[tokio::test]
async fn test_v2_round_trip() {
    prw_test::setup();
    let storage = Recorder::default();
    let server = Server::start(storage.clone()).await;
    let request = prw_test::v2_request(10);

    let stats = server
        .client()
        .write(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats.samples, 10);
    assert_eq!(stats.histograms, 2);
    assert!(stats.confirmed);
    assert_eq!(
        *storage.requests.lock().unwrap(),
        [DecodedRequest::V2(request)]
    );
}

#[tokio::test]
async fn test_server_error_retried_with_stats() {
    prw_test::setup();
    let storage = Recorder {
        failure: Some((
            StatusCode::SERVICE_UNAVAILABLE,
            WriteResponseStats {
                samples: 1,
                ..Default::default()
            },
        )),
        ..Default::default()
    };
    let server = Server::start(storage.clone()).await;

    let failure = server
        .client()
        .write(&prw_test::v2_request(3), &CancellationToken::new())
        .await
        .unwrap_err();

    let WriteError::ServerError { status, body } = &failure.error else {
        panic!("unexpected error: {}", failure.error);
    };
    assert_eq!(*status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, "storage unavailable");

    // One sample reported by each of the three attempts.
    assert_eq!(failure.stats.samples, 3);
    assert!(failure.stats.confirmed);
    assert_eq!(storage.requests.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_client_error_not_retried() {
    prw_test::setup();
    let storage = Recorder {
        failure: Some((StatusCode::BAD_REQUEST, WriteResponseStats::default())),
        ..Default::default()
    };
    let server = Server::start(storage.clone()).await;

    let failure = server
        .client()
        .write(&prw_test::v1_request(1), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        failure.error,
        WriteError::Status { status, .. } if status == StatusCode::BAD_REQUEST
    ));
    assert_eq!(storage.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_response_headers() {
    prw_test::setup();
    let storage = Recorder {
        failure: Some((StatusCode::BAD_REQUEST, WriteResponseStats::default())),
        ..Default::default()
    };
    let receiver = WriteReceiver::new(DecodingStorage::new(storage), ReceiverConfig::default());

    let request = http::Request::post("/api/v1/write")
        .header("content-type", prw_protocol::WriteProto::V2.content_type())
        .body(axum::body::Body::from(prw_test::snappy_body(
            &prw_test::v2_request(1),
        )))
        .unwrap();

    let response = receiver.handle(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["x-storage"], "recorder");

    // Zero counts are reported on the error path as well.
    for name in [
        prw_protocol::SAMPLES_WRITTEN_HEADER,
        prw_protocol::HISTOGRAMS_WRITTEN_HEADER,
        prw_protocol::EXEMPLARS_WRITTEN_HEADER,
    ] {
        assert_eq!(response.headers()[name], "0");
    }
}
