use std::collections::VecDeque;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode, Uri};
use prw_protocol::{
    Compression, DecodedRequest, PROTOBUF_MEDIA_TYPE, RETRY_ATTEMPT_HEADER, VERSION_HEADER,
    WriteProto, WriteResponseStats,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A request captured by [`MiniReceiver`].
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    /// Returns a header value as string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Returns the `Retry-Attempt` header as number.
    pub fn retry_attempt(&self) -> Option<u32> {
        self.header(RETRY_ATTEMPT_HEADER)?.parse().ok()
    }

    /// Returns the `X-Prometheus-Remote-Write-Version` header.
    pub fn version(&self) -> Option<&str> {
        self.header(VERSION_HEADER)
    }

    /// Decompresses and decodes the body according to the request's content type.
    ///
    /// # Panics
    ///
    /// Panics if the body is not a valid snappy compressed remote-write payload.
    pub fn decode(&self) -> DecodedRequest {
        self.try_decode().expect("invalid remote-write request body")
    }

    fn try_decode(&self) -> Option<DecodedRequest> {
        let content_type = self
            .header(http::header::CONTENT_TYPE.as_str())
            .unwrap_or(PROTOBUF_MEDIA_TYPE);
        let proto = WriteProto::parse_content_type(content_type).ok()?;
        let payload = Compression::Snappy.decompress(&self.body).ok()?;
        DecodedRequest::decode(proto, &payload).ok()
    }
}

/// A response replayed by [`MiniReceiver`].
#[derive(Clone, Debug)]
pub struct ScriptedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl ScriptedResponse {
    /// Creates a response with the given status and no headers.
    pub fn new(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }

    /// A `204 No Content` without stats headers, as sent by 1.0 receivers.
    pub fn no_content() -> Self {
        Self::new(204)
    }

    /// Adds a response header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
        self
    }

    /// Adds the stats headers.
    pub fn stats(mut self, stats: WriteResponseStats) -> Self {
        stats.to_headers(&mut self.headers);
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

impl IntoResponse for ScriptedResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

#[derive(Debug)]
struct Script {
    queue: VecDeque<ScriptedResponse>,
    fallback: Option<ScriptedResponse>,
    requests: Vec<RecordedRequest>,
}

type SharedScript = Arc<Mutex<Script>>;

/// A scripted remote-write endpoint on a random local port.
///
/// Every request is recorded and answered with the next queued response. Once the queue is empty,
/// the fallback response set with [`set_fallback`](Self::set_fallback) is used. Without a fallback,
/// the receiver behaves like a 2.0 receiver and responds `204 No Content` with stats headers
/// counting the decoded request.
pub struct MiniReceiver {
    addr: SocketAddr,
    script: SharedScript,
    handle: JoinHandle<()>,
}

impl MiniReceiver {
    /// Binds to a random port on the loopback interface and starts serving.
    pub async fn start() -> Self {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let script = Arc::new(Mutex::new(Script {
            queue: VecDeque::new(),
            fallback: None,
            requests: Vec::new(),
        }));

        let router = Router::new()
            .fallback(handle_request)
            .with_state(script.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            addr,
            script,
            handle,
        }
    }

    /// Returns the base URL of the receiver, ending in a slash.
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Returns the socket address of the receiver.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Queues a response for the next unanswered request.
    pub fn push_response(&self, response: ScriptedResponse) -> &Self {
        self.script.lock().unwrap().queue.push_back(response);
        self
    }

    /// Sets the response used once the queue is exhausted.
    pub fn set_fallback(&self, response: ScriptedResponse) -> &Self {
        self.script.lock().unwrap().fallback = Some(response);
        self
    }

    /// Returns all requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    /// Asserts the number of requests received so far.
    pub fn assert_request_qty(&self, qty: usize) -> &Self {
        assert_eq!(self.script.lock().unwrap().requests.len(), qty);
        self
    }
}

impl Drop for MiniReceiver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_request(
    State(script): State<SharedScript>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> ScriptedResponse {
    prw_log::debug!(%uri, "mini receiver got request");

    let request = RecordedRequest {
        method,
        uri,
        headers,
        body,
    };

    let mut script = script.lock().unwrap();
    let response = match script.queue.pop_front() {
        Some(response) => response,
        None => match &script.fallback {
            Some(fallback) => fallback.clone(),
            None => accept(&request),
        },
    };

    script.requests.push(request);
    response
}

fn accept(request: &RecordedRequest) -> ScriptedResponse {
    let response = ScriptedResponse::no_content();
    match request.try_decode() {
        Some(decoded) => response.stats(WriteResponseStats::from_request(&decoded)),
        None => response,
    }
}
