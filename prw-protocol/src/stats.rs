//! Accounting of written samples, reported by receivers in response headers.
//!
//! Receivers of the 2.0 protocol report how many samples, histograms and exemplars they wrote.
//! A missing header means zero, but 1.0 receivers and abrupt failures send no headers at all, so
//! the absence of all headers does not prove that nothing was written. [`WriteResponseStats`]
//! tracks this in its [`confirmed`](WriteResponseStats::confirmed) flag.

use std::fmt;
use std::ops::{Add, AddAssign};

use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};

use crate::{DecodedRequest, v1, v2};

/// Header with the number of float samples written.
pub const SAMPLES_WRITTEN_HEADER: &str = "x-prometheus-remote-write-samples-written";

/// Header with the number of histogram samples written.
pub const HISTOGRAMS_WRITTEN_HEADER: &str = "x-prometheus-remote-write-histograms-written";

/// Header with the number of exemplars written.
pub const EXEMPLARS_WRITTEN_HEADER: &str = "x-prometheus-remote-write-exemplars-written";

/// A stats header that could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidHeader {
    /// The header name.
    pub name: &'static str,
    /// The header value, lossily converted to a string.
    pub value: String,
}

/// An error returned by [`WriteResponseStats::from_headers`].
///
/// The remaining headers are still parsed. Their values are available in [`stats`](Self::stats).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatsHeaderError {
    /// The stats parsed from all valid headers. Invalid headers count as zero.
    pub stats: WriteResponseStats,
    /// All headers that failed to parse.
    pub invalid: Vec<InvalidHeader>,
}

impl fmt::Display for StatsHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid write stats headers: ")?;
        for (index, header) in self.invalid.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={:?}", header.name, header.value)?;
        }
        Ok(())
    }
}

impl std::error::Error for StatsHeaderError {}

/// Number of samples, histograms and exemplars written by a receiver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WriteResponseStats {
    /// Float samples written.
    pub samples: u64,
    /// Histogram samples written.
    pub histograms: u64,
    /// Exemplars written.
    pub exemplars: u64,
    /// Whether the counts were reported by the receiver.
    ///
    /// Parsing sets this when at least one stats header is present. Stats computed from a request
    /// are unconfirmed.
    pub confirmed: bool,
}

impl WriteResponseStats {
    /// Parses stats from response headers.
    ///
    /// Headers that are absent or empty count as zero. If any header is present, even with a
    /// value of `0`, the stats are confirmed.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, StatsHeaderError> {
        let mut invalid = Vec::new();
        let samples = read_counter(headers, SAMPLES_WRITTEN_HEADER, &mut invalid);
        let histograms = read_counter(headers, HISTOGRAMS_WRITTEN_HEADER, &mut invalid);
        let exemplars = read_counter(headers, EXEMPLARS_WRITTEN_HEADER, &mut invalid);

        let stats = Self {
            samples: samples.unwrap_or_default(),
            histograms: histograms.unwrap_or_default(),
            exemplars: exemplars.unwrap_or_default(),
            confirmed: samples.is_some() || histograms.is_some() || exemplars.is_some(),
        };

        if invalid.is_empty() {
            Ok(stats)
        } else {
            Err(StatsHeaderError { stats, invalid })
        }
    }

    /// Writes all three stats headers, including zero counts.
    pub fn to_headers(&self, headers: &mut HeaderMap) {
        for (name, value) in [
            (SAMPLES_WRITTEN_HEADER, self.samples),
            (HISTOGRAMS_WRITTEN_HEADER, self.histograms),
            (EXEMPLARS_WRITTEN_HEADER, self.exemplars),
        ] {
            headers.insert(HeaderName::from_static(name), HeaderValue::from(value));
        }
    }

    /// Counts the contents of a decoded request.
    ///
    /// The result is unconfirmed, as it describes what was sent rather than what was written.
    pub fn from_request(request: &DecodedRequest) -> Self {
        match request {
            DecodedRequest::V1(request) => Self::from(request),
            DecodedRequest::V2(request) => Self::from(request),
        }
    }

    /// Returns `true` if all counters are zero.
    pub fn no_data_written(&self) -> bool {
        self.samples == 0 && self.histograms == 0 && self.exemplars == 0
    }

    /// Returns the number of float and histogram samples, saturating at `u64::MAX`.
    pub fn all_samples(&self) -> u64 {
        self.samples.saturating_add(self.histograms)
    }
}

/// Sums the counters, saturating at `u64::MAX`. The result is confirmed if the right hand side
/// is.
impl Add for WriteResponseStats {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl AddAssign for WriteResponseStats {
    fn add_assign(&mut self, other: Self) {
        // Counters come from response headers and may be arbitrarily large.
        self.samples = self.samples.saturating_add(other.samples);
        self.histograms = self.histograms.saturating_add(other.histograms);
        self.exemplars = self.exemplars.saturating_add(other.exemplars);
        self.confirmed = other.confirmed;
    }
}

impl From<&v1::WriteRequest> for WriteResponseStats {
    fn from(request: &v1::WriteRequest) -> Self {
        let mut stats = Self::default();
        for series in &request.timeseries {
            stats.samples += series.samples.len() as u64;
            stats.histograms += series.histograms.len() as u64;
            stats.exemplars += series.exemplars.len() as u64;
        }
        stats
    }
}

impl From<&v2::Request> for WriteResponseStats {
    fn from(request: &v2::Request) -> Self {
        let mut stats = Self::default();
        for series in &request.timeseries {
            stats.samples += series.samples.len() as u64;
            stats.histograms += series.histograms.len() as u64;
            stats.exemplars += series.exemplars.len() as u64;
        }
        stats
    }
}

fn read_counter(
    headers: &HeaderMap,
    name: &'static str,
    invalid: &mut Vec<InvalidHeader>,
) -> Option<u64> {
    let value = headers.get(name).filter(|value| !value.is_empty())?;

    let parsed = value
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse().ok());

    if parsed.is_none() {
        invalid.push(InvalidHeader {
            name,
            value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
        });
    }

    Some(parsed.unwrap_or_default())
}
