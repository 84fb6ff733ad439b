use prw_protocol::{
    BucketSpan, Compression, Encoder, Histogram, SymbolTable, WriteMessage, histogram, v1, v2,
};

const TIMESTAMP: i64 = 1_700_000_000_000;

/// Builds a 1.0 request with one sample per series.
///
/// Every third series also carries an exemplar, every fifth a native histogram.
pub fn v1_request(series: usize) -> v1::WriteRequest {
    let timeseries = (0..series)
        .map(|index| v1::TimeSeries {
            labels: vec![
                v1::Label::new("__name__", "test_requests_total"),
                v1::Label::new("instance", format!("host-{index}")),
            ],
            samples: vec![sample_v1(index)],
            exemplars: (index % 3 == 0)
                .then(|| v1::Exemplar {
                    labels: vec![v1::Label::new("trace_id", format!("{index:032x}"))],
                    value: index as f64,
                    timestamp: TIMESTAMP,
                })
                .into_iter()
                .collect(),
            histograms: (index % 5 == 0).then(histogram_sample).into_iter().collect(),
        })
        .collect();

    v1::WriteRequest {
        timeseries,
        metadata: vec![v1::MetricMetadata {
            r#type: v1::MetricType::Counter.into(),
            metric_family_name: "test_requests_total".to_owned(),
            help: "Number of test requests.".to_owned(),
            unit: String::new(),
        }],
    }
}

/// Builds a 2.0 request with the same content as [`v1_request`].
pub fn v2_request(series: usize) -> v2::Request {
    let mut symbols = SymbolTable::new();
    let help_ref = symbols.symbolize("Number of test requests.");

    let timeseries = (0..series)
        .map(|index| {
            let instance = format!("host-{index}");
            let trace_id = format!("{index:032x}");

            v2::TimeSeries {
                labels_refs: symbols.symbolize_labels(
                    &["__name__", "test_requests_total", "instance", instance.as_str()],
                    Vec::new(),
                ),
                samples: vec![v2::Sample {
                    value: index as f64,
                    timestamp: TIMESTAMP,
                }],
                histograms: (index % 5 == 0).then(histogram_sample).into_iter().collect(),
                exemplars: (index % 3 == 0)
                    .then(|| v2::Exemplar {
                        labels_refs: symbols
                            .symbolize_labels(&["trace_id", trace_id.as_str()], Vec::new()),
                        value: index as f64,
                        timestamp: TIMESTAMP,
                    })
                    .into_iter()
                    .collect(),
                metadata: Some(v2::Metadata {
                    r#type: v2::MetricType::Counter.into(),
                    help_ref,
                    unit_ref: 0,
                }),
                created_timestamp: TIMESTAMP - 60_000,
            }
        })
        .collect();

    v2::Request {
        symbols: symbols.symbols().to_vec(),
        timeseries,
    }
}

/// Encodes and snappy-compresses a message into a request body.
pub fn snappy_body(message: &dyn WriteMessage) -> Vec<u8> {
    let mut encoder = Encoder::new();
    let payload = encoder.encode(message).unwrap();

    let mut buf = Vec::new();
    Compression::Snappy.compress(payload, &mut buf).unwrap().to_vec()
}

fn sample_v1(index: usize) -> v1::Sample {
    v1::Sample {
        value: index as f64,
        timestamp: TIMESTAMP,
    }
}

fn histogram_sample() -> Histogram {
    Histogram {
        count: Some(histogram::Count::CountInt(4)),
        sum: 10.5,
        schema: 3,
        zero_threshold: 1e-128,
        zero_count: Some(histogram::ZeroCount::ZeroCountInt(1)),
        positive_spans: vec![BucketSpan {
            offset: 0,
            length: 2,
        }],
        positive_deltas: vec![2, -1],
        timestamp: TIMESTAMP,
        ..Default::default()
    }
}
