//! Messages of the 1.0 remote-write protocol (`prometheus.WriteRequest`).

use crate::{Histogram, SizedMarshal, StructuralEncode, WriteMessage, WriteResponseStats};

/// A batch of time series sent by a 1.0 sender.
#[derive(Clone, PartialEq, prost::Message)]
pub struct WriteRequest {
    /// The time series in this batch.
    #[prost(message, repeated, tag = "1")]
    pub timeseries: Vec<TimeSeries>,
    /// Metric metadata, sent separately from the series.
    #[prost(message, repeated, tag = "3")]
    pub metadata: Vec<MetricMetadata>,
}

/// A single series identified by its labels.
///
/// Samples and histograms must be ordered by timestamp.
#[derive(Clone, PartialEq, prost::Message)]
pub struct TimeSeries {
    /// Sorted label pairs, including `__name__`.
    #[prost(message, repeated, tag = "1")]
    pub labels: Vec<Label>,
    /// Float samples.
    #[prost(message, repeated, tag = "2")]
    pub samples: Vec<Sample>,
    /// Exemplars attached to this series.
    #[prost(message, repeated, tag = "3")]
    pub exemplars: Vec<Exemplar>,
    /// Native histogram samples.
    #[prost(message, repeated, tag = "4")]
    pub histograms: Vec<Histogram>,
}

/// A name and value pair.
#[derive(Clone, PartialEq, Eq, Hash, prost::Message)]
pub struct Label {
    /// Label name.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Label value.
    #[prost(string, tag = "2")]
    pub value: String,
}

impl Label {
    /// Creates a new label.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
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

/// An exemplar with its own labels.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Exemplar {
    /// Exemplar labels, for example the trace id.
    #[prost(message, repeated, tag = "1")]
    pub labels: Vec<Label>,
    /// Exemplar value.
    #[prost(double, tag = "2")]
    pub value: f64,
    /// Timestamp in milliseconds since the unix epoch.
    #[prost(int64, tag = "3")]
    pub timestamp: i64,
}

/// Metadata of a metric family.
#[derive(Clone, PartialEq, prost::Message)]
pub struct MetricMetadata {
    /// The type of the metric family.
    #[prost(enumeration = "MetricType", tag = "1")]
    pub r#type: i32,
    /// Name of the metric family.
    #[prost(string, tag = "2")]
    pub metric_family_name: String,
    /// Help text.
    #[prost(string, tag = "4")]
    pub help: String,
    /// Unit of the metric.
    #[prost(string, tag = "5")]
    pub unit: String,
}

/// The type of a metric family in [`MetricMetadata`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum MetricType {
    /// The type is not known.
    Unknown = 0,
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

impl WriteMessage for WriteRequest {
    fn as_sized(&self) -> Option<&dyn SizedMarshal> {
        Some(self)
    }

    fn as_structural(&self) -> Option<&dyn StructuralEncode> {
        Some(self)
    }

    fn written_baseline(&self) -> Option<WriteResponseStats> {
        Some(WriteResponseStats::from(self))
    }
}
