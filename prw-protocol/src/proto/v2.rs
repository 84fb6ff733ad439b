//! Messages of the 2.0 remote-write protocol (`io.prometheus.write.v2.Request`).
//!
//! Strings are not repeated in every series. Instead, the request carries a table of
//! [`symbols`](Request::symbols), and series refer to it by index. The first symbol is always the
//! empty string. See [`SymbolTable`](crate::SymbolTable) for building the table.

use crate::{Histogram, SizedMarshal, StructuralEncode, WriteMessage, WriteResponseStats};

/// A batch of time series sent by a 2.0 sender.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Request {
    /// All strings referenced by the series of this request.
    #[prost(string, repeated, tag = "4")]
    pub symbols: Vec<String>,
    /// The time series in this batch.
    #[prost(message, repeated, tag = "5")]
    pub timeseries: Vec<TimeSeries>,
}

/// A single series identified by its label references.
#[derive(Clone, PartialEq, prost::Message)]
pub struct TimeSeries {
    /// Alternating name and value references into [`Request::symbols`].
    #[prost(uint32, repeated, tag = "1")]
    pub labels_refs: Vec<u32>,
    /// Float samples.
    #[prost(message, repeated, tag = "2")]
    pub samples: Vec<Sample>,
    /// Native histogram samples.
    #[prost(message, repeated, tag = "3")]
    pub histograms: Vec<Histogram>,
    /// Exemplars attached to this series.
    #[prost(message, repeated, tag = "4")]
    pub exemplars: Vec<Exemplar>,
    /// Metadata of the series.
    #[prost(message, optional, tag = "5")]
    pub metadata: Option<Metadata>,
    /// Creation time of a counter or histogram series, in milliseconds since the unix epoch.
    #[prost(int64, tag = "6")]
    pub created_timestamp: i64,
}

/// A float sample.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct Sample {
    /// Sample value.
    #[prost(double, tag = "1")]
    pub value: f64,
    /// Timestamp in milliseconds since the unix epoch.
    #[prost(int64, tag = "2")]
    pub timestamp: i64,
}

/// An exemplar with label references.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Exemplar {
    /// Alternating name and value references into [`Request::symbols`].
    #[prost(uint32, repeated, tag = "1")]
    pub labels_refs: Vec<u32>,
    /// Exemplar value.
    #[prost(double, tag = "2")]
    pub value: f64,
    /// Timestamp in milliseconds since the unix epoch.
    #[prost(int64, tag = "3")]
    pub timestamp: i64,
}

/// Metadata of a series.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct Metadata {
    /// The type of the series.
    #[prost(enumeration = "MetricType", tag = "1")]
    pub r#type: i32,
    /// Reference to the help text in [`Request::symbols`].
    #[prost(uint32, tag = "3")]
    pub help_ref: u32,
    /// Reference to the unit in [`Request::symbols`].
    #[prost(uint32, tag = "4")]
    pub unit_ref: u32,
}

/// The type of a series in [`Metadata`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum MetricType {
    /// The type is not specified.
    Unspecified = 0,
    /// A monotonic counter.
    Counter = 1,
    /// A gauge.
    Gauge = 2,
    /// A classic or native histogram.
    Histogram = 3,
    /// A histogram that can decrease.
    GaugeHistogram = 4,
    /// A summary with quantiles.
    Summary = 5,
    /// An info metric.
    Info = 6,
    /// A state set.
    Stateset = 7,
}

impl WriteMessage for Request {
    fn as_sized(&self) -> Option<&dyn SizedMarshal> {
        Some(self)
    }

    fn as_structural(&self) -> Option<&dyn StructuralEncode> {
        Some(self)
    }

    fn symbols(&self) -> Option<&[String]> {
        Some(&self.symbols)
    }

    fn written_baseline(&self) -> Option<WriteResponseStats> {
        Some(WriteResponseStats::from(self))
    }
}
