//! Serialization of write requests into protobuf bytes.
//!
//! Messages advertise how they can be serialized through [`WriteMessage`]. The [`Encoder`] checks
//! the capabilities in order of efficiency and uses the first one available:
//!
//!  1. [`SizedMarshal`]: the message knows its exact size and marshals into a presized buffer.
//!  2. [`AltSizedMarshal`]: an alternative size-and-marshal implementation of the same contract.
//!  3. [`StructuralEncode`]: generic structural encoding, available for every [`prost::Message`].
//!
//! Messages without any capability are rejected with [`EncodeError::UnsupportedMessageType`].

use crate::{WriteProto, WriteResponseStats};

/// An error returned by [`Encoder::encode`].
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The message exposes none of the encoding capabilities.
    #[error("unsupported message type {0}")]
    UnsupportedMessageType(&'static str),
    /// The message wrote fewer bytes than it announced.
    #[error("marshal wrote {written} bytes, expected {expected}")]
    SizeMismatch {
        /// The announced size.
        expected: usize,
        /// The number of bytes actually written.
        written: usize,
    },
    /// The protobuf encoder failed.
    #[error("failed to encode protobuf message")]
    Protobuf(#[from] prost::EncodeError),
}

/// Serialization into a buffer of known size.
pub trait SizedMarshal {
    /// Returns the exact number of bytes [`marshal_to_sized_buffer`](Self::marshal_to_sized_buffer)
    /// writes.
    fn encoded_size(&self) -> usize;

    /// Writes the message into `buf`, which is exactly [`encoded_size`](Self::encoded_size) long.
    ///
    /// Returns the number of bytes written.
    fn marshal_to_sized_buffer(&self, buf: &mut [u8]) -> Result<usize, EncodeError>;
}

/// An alternative implementation of the [`SizedMarshal`] contract.
///
/// Generated code from different protobuf toolchains names these methods differently. Both are
/// accepted, but [`SizedMarshal`] takes precedence when a message implements both.
pub trait AltSizedMarshal {
    /// Returns the exact number of bytes [`marshal_into`](Self::marshal_into) writes.
    fn size(&self) -> usize;

    /// Writes the message into `buf`, which is exactly [`size`](Self::size) long.
    fn marshal_into(&self, buf: &mut [u8]) -> Result<usize, EncodeError>;
}

/// Generic structural encoding that appends to a growable buffer.
pub trait StructuralEncode {
    /// Appends the encoded message to `buf`.
    fn encode_structural(&self, buf: &mut Vec<u8>) -> Result<(), EncodeError>;
}

impl<M: prost::Message> SizedMarshal for M {
    fn encoded_size(&self) -> usize {
        self.encoded_len()
    }

    fn marshal_to_sized_buffer(&self, mut buf: &mut [u8]) -> Result<usize, EncodeError> {
        let capacity = buf.len();
        self.encode(&mut buf)?;
        Ok(capacity - buf.len())
    }
}

impl<M: prost::Message> StructuralEncode for M {
    fn encode_structural(&self, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
        self.encode(buf)?;
        Ok(())
    }
}

/// A message that can be sent with a remote-write client.
///
/// All methods have defaults, so an implementation only overrides the capabilities it has.
pub trait WriteMessage {
    /// Name of the implementing type, used in error messages.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the message as [`SizedMarshal`], if supported.
    fn as_sized(&self) -> Option<&dyn SizedMarshal> {
        None
    }

    /// Returns the message as [`AltSizedMarshal`], if supported.
    fn as_alt_sized(&self) -> Option<&dyn AltSizedMarshal> {
        None
    }

    /// Returns the message as [`StructuralEncode`], if supported.
    fn as_structural(&self) -> Option<&dyn StructuralEncode> {
        None
    }

    /// Returns the symbol table of 2.0 messages.
    ///
    /// Messages returning `Some` are sent with the 2.0 protocol.
    fn symbols(&self) -> Option<&[String]> {
        None
    }

    /// Returns the number of samples, histograms and exemplars in this message, if known.
    fn written_baseline(&self) -> Option<WriteResponseStats> {
        None
    }

    /// Returns the protocol this message is sent with.
    fn write_proto(&self) -> WriteProto {
        match self.symbols() {
            Some(_) => WriteProto::V2,
            None => WriteProto::V1,
        }
    }
}

/// Encodes [`WriteMessage`]s into a reusable buffer.
///
/// The buffer grows to fit the largest message encoded so far and is never shrunk.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    /// Creates an encoder with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the capacity of the internal buffer.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Encodes the message and returns the encoded bytes.
    ///
    /// The returned slice borrows the internal buffer and is overwritten by the next call.
    pub fn encode(&mut self, msg: &dyn WriteMessage) -> Result<&[u8], EncodeError> {
        if let Some(sized) = msg.as_sized() {
            let size = sized.encoded_size();
            let buf = self.sized_buffer(size);
            let written = sized.marshal_to_sized_buffer(buf)?;
            return check_size(size, written).map(|()| &self.buf[..size]);
        }

        if let Some(sized) = msg.as_alt_sized() {
            let size = sized.size();
            let buf = self.sized_buffer(size);
            let written = sized.marshal_into(buf)?;
            return check_size(size, written).map(|()| &self.buf[..size]);
        }

        if let Some(structural) = msg.as_structural() {
            self.buf.clear();
            structural.encode_structural(&mut self.buf)?;
            return Ok(&self.buf);
        }

        Err(EncodeError::UnsupportedMessageType(msg.type_name()))
    }

    fn sized_buffer(&mut self, size: usize) -> &mut [u8] {
        if self.buf.len() < size {
            self.buf.resize(size, 0);
        }
        &mut self.buf[..size]
    }
}

fn check_size(expected: usize, written: usize) -> Result<(), EncodeError> {
    if expected == written {
        Ok(())
    } else {
        Err(EncodeError::SizeMismatch { expected, written })
    }
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::*;
    use crate::v1::{Label, Sample, TimeSeries, WriteRequest};

    fn request(series: usize) -> WriteRequest {
        WriteRequest {
            timeseries: (0..series)
                .map(|i| TimeSeries {
                    labels: vec![Label::new("__name__", format!("metric_{i}"))],
                    samples: vec![Sample {
                        value: i as f64,
                        timestamp: 1_700_000_000_000,
                    }],
                    ..Default::default()
                })
                .collect(),
            metadata: vec![],
        }
    }

    struct AltOnly(WriteRequest);

    impl AltSizedMarshal for AltOnly {
        fn size(&self) -> usize {
            self.0.encoded_len()
        }

        fn marshal_into(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
            self.0.marshal_to_sized_buffer(buf)
        }
    }

    impl WriteMessage for AltOnly {
        fn as_alt_sized(&self) -> Option<&dyn AltSizedMarshal> {
            Some(self)
        }
    }

    struct StructuralOnly(WriteRequest);

    impl WriteMessage for StructuralOnly {
        fn as_structural(&self) -> Option<&dyn StructuralEncode> {
            Some(&self.0)
        }
    }

    struct ShortWrite;

    impl SizedMarshal for ShortWrite {
        fn encoded_size(&self) -> usize {
            8
        }

        fn marshal_to_sized_buffer(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
            buf[..4].copy_from_slice(b"abcd");
            Ok(4)
        }
    }

    impl WriteMessage for ShortWrite {
        fn as_sized(&self) -> Option<&dyn SizedMarshal> {
            Some(self)
        }
    }

    struct Opaque;

    impl WriteMessage for Opaque {}

    #[test]
    fn test_sized_matches_prost() {
        let req = request(3);
        let mut encoder = Encoder::new();
        let bytes = encoder.encode(&req).unwrap();
        assert_eq!(bytes, req.encode_to_vec().as_slice());
    }

    #[test]
    fn test_capabilities_are_equivalent() {
        let req = request(5);
        let expected = req.encode_to_vec();

        let mut encoder = Encoder::new();
        assert_eq!(encoder.encode(&AltOnly(req.clone())).unwrap(), expected);
        assert_eq!(encoder.encode(&StructuralOnly(req)).unwrap(), expected);
    }

    #[test]
    fn test_buffer_grows_and_is_retained() {
        let mut encoder = Encoder::new();
        let large = request(100);
        let small = request(1);

        let large_len = encoder.encode(&large).unwrap().len();
        let capacity = encoder.capacity();
        assert!(capacity >= large_len);

        let small_bytes = encoder.encode(&small).unwrap();
        assert_eq!(small_bytes, small.encode_to_vec().as_slice());
        assert_eq!(encoder.capacity(), capacity);
    }

    #[test]
    fn test_structural_after_sized_has_no_stale_bytes() {
        let mut encoder = Encoder::new();
        encoder.encode(&request(10)).unwrap();

        let small = request(1);
        let expected = small.encode_to_vec();
        assert_eq!(encoder.encode(&StructuralOnly(small)).unwrap(), expected);
    }

    #[test]
    fn test_size_mismatch() {
        let error = Encoder::new().encode(&ShortWrite).unwrap_err();
        assert!(matches!(
            error,
            EncodeError::SizeMismatch {
                expected: 8,
                written: 4
            }
        ));
    }

    #[test]
    fn test_unsupported_message() {
        let error = Encoder::new().encode(&Opaque).unwrap_err();
        let EncodeError::UnsupportedMessageType(name) = error else {
            panic!("unexpected error: {error}");
        };
        assert!(name.ends_with("Opaque"), "{name}");
    }

    #[test]
    fn test_write_proto_follows_symbols() {
        assert_eq!(request(1).write_proto(), WriteProto::V1);
        assert_eq!(crate::v2::Request::default().write_proto(), WriteProto::V2);
    }
}
