/// A native histogram sample, shared by both protocol versions.
///
/// Counts are either integers or floats, depending on whether the histogram tracks float buckets.
/// The 1.0 protocol never sets [`custom_values`](Self::custom_values).
#[derive(Clone, PartialEq, prost::Message)]
pub struct Histogram {
    /// The total count of observations.
    #[prost(oneof = "histogram::Count", tags = "1, 2")]
    pub count: Option<histogram::Count>,
    /// Sum of observations.
    #[prost(double, tag = "3")]
    pub sum: f64,
    /// The bucket schema, from -4 to 8 for exponential buckets, -53 for custom buckets.
    #[prost(sint32, tag = "4")]
    pub schema: i32,
    /// Breadth of the zero bucket.
    #[prost(double, tag = "5")]
    pub zero_threshold: f64,
    /// Count in the zero bucket.
    #[prost(oneof = "histogram::ZeroCount", tags = "6, 7")]
    pub zero_count: Option<histogram::ZeroCount>,
    /// Negative buckets.
    #[prost(message, repeated, tag = "8")]
    pub negative_spans: Vec<BucketSpan>,
    /// Delta encoded absolute counts of negative integer buckets.
    #[prost(sint64, repeated, tag = "9")]
    pub negative_deltas: Vec<i64>,
    /// Absolute counts of negative float buckets.
    #[prost(double, repeated, tag = "10")]
    pub negative_counts: Vec<f64>,
    /// Positive buckets.
    #[prost(message, repeated, tag = "11")]
    pub positive_spans: Vec<BucketSpan>,
    /// Delta encoded absolute counts of positive integer buckets.
    #[prost(sint64, repeated, tag = "12")]
    pub positive_deltas: Vec<i64>,
    /// Absolute counts of positive float buckets.
    #[prost(double, repeated, tag = "13")]
    pub positive_counts: Vec<f64>,
    /// Hint whether the histogram was reset since the previous sample.
    #[prost(enumeration = "histogram::ResetHint", tag = "14")]
    pub reset_hint: i32,
    /// Timestamp in milliseconds since the unix epoch.
    #[prost(int64, tag = "15")]
    pub timestamp: i64,
    /// Upper bounds of custom buckets (schema -53).
    #[prost(double, repeated, tag = "16")]
    pub custom_values: Vec<f64>,
}

/// Nested types of [`Histogram`].
pub mod histogram {
    /// The total count of a [`Histogram`](super::Histogram).
    #[derive(Clone, Copy, PartialEq, prost::Oneof)]
    pub enum Count {
        /// Count of an integer histogram.
        #[prost(uint64, tag = "1")]
        CountInt(u64),
        /// Count of a float histogram.
        #[prost(double, tag = "2")]
        CountFloat(f64),
    }

    /// The zero bucket count of a [`Histogram`](super::Histogram).
    #[derive(Clone, Copy, PartialEq, prost::Oneof)]
    pub enum ZeroCount {
        /// Zero bucket count of an integer histogram.
        #[prost(uint64, tag = "6")]
        ZeroCountInt(u64),
        /// Zero bucket count of a float histogram.
        #[prost(double, tag = "7")]
        ZeroCountFloat(f64),
    }

    /// Counter reset information of a [`Histogram`](super::Histogram).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum ResetHint {
        /// Unknown whether a reset happened.
        Unknown = 0,
        /// A counter reset happened.
        Yes = 1,
        /// No counter reset happened.
        No = 2,
        /// The histogram is a gauge histogram.
        Gauge = 3,
    }
}

/// A span of consecutive buckets in a [`Histogram`].
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct BucketSpan {
    /// Gap to the previous span, or the starting point for the first span.
    #[prost(sint32, tag = "1")]
    pub offset: i32,
    /// Length of consecutive buckets.
    #[prost(uint32, tag = "2")]
    pub length: u32,
}
