use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use prw_protocol::{DecodedRequest, WriteProto, WriteResponseStats, v1, v2};

/// An error returned by a [`WriteStorage`].
///
/// The status code sent to the client is taken from [`WriteResponse::set_status`], or `500` if
/// the storage did not set one.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct StorageError(#[from] Box<dyn std::error::Error + Send + Sync>);

impl StorageError {
    /// Wraps an error or message.
    pub fn new<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self(error.into())
    }
}

/// Response metadata filled in by a [`WriteStorage`].
#[derive(Clone, Debug, Default)]
pub struct WriteResponse {
    stats: Option<WriteResponseStats>,
    status: Option<StatusCode>,
    headers: HeaderMap,
}

impl WriteResponse {
    /// Creates an empty response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of written samples, histograms and exemplars.
    pub fn set_stats(&mut self, stats: WriteResponseStats) {
        self.stats = Some(stats);
    }

    /// Adds to the number of written samples, histograms and exemplars.
    pub fn add_stats(&mut self, stats: WriteResponseStats) {
        *self.stats.get_or_insert_default() += stats;
    }

    /// Returns the stats set by the storage, if any.
    pub fn stats(&self) -> Option<WriteResponseStats> {
        self.stats
    }

    /// Overrides the response status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Returns the status code set by the storage, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Additional headers sent with the response.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub(crate) fn into_parts(self) -> (WriteResponseStats, Option<StatusCode>, HeaderMap) {
        (self.stats.unwrap_or_default(), self.status, self.headers)
    }
}

/// Storage of decompressed write requests.
///
/// The body is the uncompressed protobuf payload of the given protocol. Implementations report
/// what they wrote through `response`, also when they fail: the stats are sent back to the client
/// in any case.
#[async_trait]
pub trait WriteStorage: Send + Sync + 'static {
    /// Stores a single write request.
    async fn store(
        &self,
        proto: WriteProto,
        body: Bytes,
        response: &mut WriteResponse,
    ) -> Result<(), StorageError>;
}

/// Storage of decoded write requests, see [`DecodingStorage`].
#[async_trait]
pub trait DecodedStorage: Send + Sync + 'static {
    /// Stores a 1.0 request.
    async fn store_v1(
        &self,
        request: v1::WriteRequest,
        response: &mut WriteResponse,
    ) -> Result<(), StorageError>;

    /// Stores a 2.0 request.
    async fn store_v2(
        &self,
        request: v2::Request,
        response: &mut WriteResponse,
    ) -> Result<(), StorageError>;
}

/// Adapts a [`DecodedStorage`] to [`WriteStorage`] by decoding the payload.
///
/// Payloads that fail to decode are rejected with `400 Bad Request`. If the decoded storage
/// succeeds without setting stats, everything in the request is reported as written.
#[derive(Debug)]
pub struct DecodingStorage<D> {
    inner: D,
}

impl<D> DecodingStorage<D> {
    /// Wraps a decoded storage.
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    /// Returns the wrapped storage.
    pub fn inner(&self) -> &D {
        &self.inner
    }
}

#[async_trait]
impl<D: DecodedStorage> WriteStorage for DecodingStorage<D> {
    async fn store(
        &self,
        proto: WriteProto,
        body: Bytes,
        response: &mut WriteResponse,
    ) -> Result<(), StorageError> {
        let request = match DecodedRequest::decode(proto, &body) {
            Ok(request) => request,
            Err(error) => {
                response.set_status(StatusCode::BAD_REQUEST);
                return Err(StorageError::new(error));
            }
        };

        let sent = WriteResponseStats::from_request(&request);
        match request {
            DecodedRequest::V1(request) => self.inner.store_v1(request, response).await?,
            DecodedRequest::V2(request) => self.inner.store_v2(request, response).await?,
        }

        if response.stats().is_none() {
            response.set_stats(sent);
        }

        Ok(())
    }
}
