use std::fmt;
use std::str::FromStr;

/// An error returned by [`Compression`] operations.
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    /// The scheme name is not known.
    #[error("unknown compression: {0}")]
    UnknownCompression(String),
    /// The snappy codec failed, for example on corrupt input.
    #[error("snappy codec failed")]
    Snappy(#[from] snap::Error),
}

/// A compression scheme for request payloads, named by its `Content-Encoding` value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Snappy block format, without the framing format.
    #[default]
    Snappy,
}

impl Compression {
    /// Returns the `Content-Encoding` header value of this scheme.
    pub const fn name(self) -> &'static str {
        match self {
            Compression::Snappy => "snappy",
        }
    }

    /// Compresses `input` into `buf` and returns the compressed bytes.
    ///
    /// The buffer is grown to the worst case compressed size if needed and never shrunk, so it can
    /// be reused across calls.
    pub fn compress<'a>(
        self,
        input: &[u8],
        buf: &'a mut Vec<u8>,
    ) -> Result<&'a [u8], CompressionError> {
        match self {
            Compression::Snappy => {
                // Zero for inputs that are too large, which the encoder rejects below.
                let max_len = snap::raw::max_compress_len(input.len());
                if buf.len() < max_len {
                    buf.resize(max_len, 0);
                }
                let len = snap::raw::Encoder::new().compress(input, buf)?;
                Ok(&buf[..len])
            }
        }
    }

    /// Returns the decompressed size of `input` as announced in its header.
    ///
    /// Use this to reject oversized payloads before allocating the output buffer.
    pub fn decompressed_len(self, input: &[u8]) -> Result<usize, CompressionError> {
        match self {
            Compression::Snappy => Ok(snap::raw::decompress_len(input)?),
        }
    }

    /// Decompresses `input` into a new buffer.
    pub fn decompress(self, input: &[u8]) -> Result<Vec<u8>, CompressionError> {
        match self {
            Compression::Snappy => Ok(snap::raw::Decoder::new().decompress_vec(input)?),
        }
    }
}

/// Decompresses `input` with the scheme of the given name.
pub fn decompress_named(name: &str, input: &[u8]) -> Result<Vec<u8>, CompressionError> {
    name.parse::<Compression>()?.decompress(input)
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Compression {
    type Err = CompressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "snappy" => Ok(Compression::Snappy),
            other => Err(CompressionError::UnknownCompression(other.to_owned())),
        }
    }
}

crate::impl_str_serde!(Compression, "a compression scheme name");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let input = b"foo_bar_total{job=\"a\"} foo_bar_total{job=\"b\"}".repeat(20);
        let mut buf = Vec::new();

        let compressed = Compression::Snappy.compress(&input, &mut buf).unwrap();
        assert!(compressed.len() < input.len());

        let decompressed = Compression::Snappy.decompress(compressed).unwrap();
        assert_eq!(decompressed, input);
    }

    #[test]
    fn test_buffer_is_retained() {
        let mut buf = Vec::new();
        Compression::Snappy
            .compress(&[7; 4096], &mut buf)
            .unwrap();
        let len = buf.len();

        let compressed = Compression::Snappy.compress(b"small", &mut buf).unwrap().to_vec();
        assert_eq!(buf.len(), len);
        assert_eq!(Compression::Snappy.decompress(&compressed).unwrap(), b"small");
    }

    #[test]
    fn test_compress_empty() {
        let mut buf = Vec::new();
        let compressed = Compression::Snappy.compress(&[], &mut buf).unwrap().to_vec();
        assert!(Compression::Snappy.decompress(&compressed).unwrap().is_empty());
    }

    #[test]
    fn test_decompress_corrupt() {
        let error = Compression::Snappy.decompress(b"\xff\xff\xff\xff").unwrap_err();
        assert!(matches!(error, CompressionError::Snappy(_)));
    }

    #[test]
    fn test_decompressed_len() {
        let mut buf = Vec::new();
        let compressed = Compression::Snappy.compress(&[0; 1000], &mut buf).unwrap();
        assert_eq!(Compression::Snappy.decompressed_len(compressed).unwrap(), 1000);
    }

    #[test]
    fn test_decompress_named() {
        let mut buf = Vec::new();
        let compressed = Compression::Snappy.compress(b"hello", &mut buf).unwrap();
        assert_eq!(decompress_named("snappy", compressed).unwrap(), b"hello");

        let error = decompress_named("zstd", compressed).unwrap_err();
        assert_eq!(error.to_string(), "unknown compression: zstd");
    }

    #[test]
    fn test_serde() {
        let compression: Compression = serde_json::from_str(r#""snappy""#).unwrap();
        assert_eq!(compression, Compression::Snappy);
        assert!(serde_json::from_str::<Compression>(r#""gzip""#).is_err());
    }
}
