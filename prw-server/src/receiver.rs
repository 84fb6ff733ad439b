use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use prw_log::LogError;
use prw_protocol::{PROTOBUF_MEDIA_TYPE, WriteProto, WriteResponseStats};

use crate::{
    ReceiverConfig, RequestStep, SnappyDecompression, StepRejection, WriteResponse, WriteStorage,
};

/// HTTP handler for remote-write requests.
///
/// For every request, the receiver:
///  1. Identifies the protocol from the `Content-Type` header. Requests without the header are
///     treated as 1.0 requests. Unknown or disabled protocols are rejected with `415`.
///  2. Reads the body up to [`ReceiverConfig::max_body_size`] and runs it through the
///     [`RequestStep`] chain, which decompresses snappy bodies by default.
///  3. Passes the decompressed body to the [`WriteStorage`].
///
/// The stats reported by the storage are sent in response headers, also when the storage fails.
/// Successful writes are acknowledged with `204 No Content`.
pub struct WriteReceiver<S> {
    storage: S,
    steps: Vec<Box<dyn RequestStep>>,
    config: ReceiverConfig,
}

impl<S: WriteStorage> WriteReceiver<S> {
    /// Creates a receiver with the default step chain.
    pub fn new(storage: S, config: ReceiverConfig) -> Self {
        Self {
            storage,
            steps: vec![Box::new(SnappyDecompression::new(
                config.max_decompressed_size,
            ))],
            config,
        }
    }

    /// Replaces the step chain.
    ///
    /// The steps run in the given order. An empty chain passes bodies to the storage as received.
    pub fn with_steps(mut self, steps: Vec<Box<dyn RequestStep>>) -> Self {
        self.steps = steps;
        self
    }

    /// Returns the storage of this receiver.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns the configuration of this receiver.
    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    /// Returns a router serving this receiver on `path` for `POST` requests.
    pub fn into_router(self, path: &str) -> Router {
        Router::new()
            .route(path, post(handle_write::<S>))
            .with_state(Arc::new(self))
    }

    /// Handles a single write request.
    pub async fn handle(&self, request: Request) -> Response {
        let (parts, body) = request.into_parts();
        let mut headers = parts.headers;

        let proto = match self.negotiate(&headers) {
            Ok(proto) => proto,
            Err(rejection) => return reject(rejection),
        };

        let body = match read_body(&headers, body, self.config.max_body_size).await {
            Ok(body) => body,
            Err(rejection) => return reject(rejection),
        };

        let body = match self.run_steps(&mut headers, body) {
            Ok(body) => body,
            Err(rejection) => return reject(rejection),
        };

        let mut response = WriteResponse::new();
        let result = self.storage.store(proto, body, &mut response).await;
        let (stats, status, extra_headers) = response.into_parts();

        let mut http_response = match result {
            Ok(()) => status
                .filter(StatusCode::is_success)
                .unwrap_or(StatusCode::NO_CONTENT)
                .into_response(),
            Err(error) => {
                let status = status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                if status.as_u16() / 5 == 100 {
                    prw_log::error!(
                        error = &error as &dyn std::error::Error,
                        %proto,
                        "failed to store write request"
                    );
                } else {
                    prw_log::debug!(
                        error = &error as &dyn std::error::Error,
                        %proto,
                        %status,
                        "rejected write request"
                    );
                }
                (status, LogError(&error).to_string()).into_response()
            }
        };

        let response_headers = http_response.headers_mut();
        response_headers.extend(extra_headers);
        stats.to_headers(response_headers);
        http_response
    }

    fn negotiate(&self, headers: &HeaderMap) -> Result<WriteProto, StepRejection> {
        let content_type = match headers.get(CONTENT_TYPE) {
            Some(value) if !value.is_empty() => value.to_str().map_err(|_| {
                StepRejection::new(
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    "content-type is not valid ascii",
                )
            })?,
            _ => PROTOBUF_MEDIA_TYPE,
        };

        let proto = WriteProto::parse_content_type(content_type).map_err(|error| {
            StepRejection::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, error.to_string())
        })?;

        if !self.config.accepts(proto) {
            return Err(StepRejection::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!("{proto} is not accepted by this server"),
            ));
        }

        Ok(proto)
    }

    fn run_steps(&self, headers: &mut HeaderMap, body: Bytes) -> Result<Bytes, StepRejection> {
        self.steps
            .iter()
            .try_fold(body, |body, step| step.apply(headers, body))
    }
}

async fn handle_write<S: WriteStorage>(
    State(receiver): State<Arc<WriteReceiver<S>>>,
    request: Request,
) -> Response {
    receiver.handle(request).await
}

fn reject(rejection: StepRejection) -> Response {
    prw_log::debug!(
        status = %rejection.status(),
        error = rejection.message(),
        "rejected write request"
    );

    // Nothing was written, which is reported like any other outcome.
    let mut response = rejection.into_response();
    WriteResponseStats::default().to_headers(response.headers_mut());
    response
}

/// Reads the full body, failing once it grows past `limit`.
async fn read_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes, StepRejection> {
    let too_large = || {
        StepRejection::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("request body exceeds the limit of {limit} bytes"),
        )
    };

    let content_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());

    if content_length.is_some_and(|length| length > limit) {
        return Err(too_large());
    }

    let mut buf = BytesMut::with_capacity(content_length.unwrap_or_default());
    let mut stream = body.into_data_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|error| {
            StepRejection::new(
                StatusCode::BAD_REQUEST,
                format!("failed to read request body: {error}"),
            )
        })?;

        if buf.len() + chunk.len() > limit {
            return Err(too_large());
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf.freeze())
}
