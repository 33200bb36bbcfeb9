use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, CounterVec, Encoder, TextEncoder};

pub static REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dorfetcher_requests_total",
        "Fetch requests by route and outcome",
        &["route", "outcome"]
    )
    .unwrap()
});

pub fn record(route: &str, outcome: &str) {
    REQUESTS_TOTAL.with_label_values(&[route, outcome]).inc();
}

/// Text exposition of the default registry.
pub fn render() -> String {
    let mut buf = Vec::new();
    let encoder = TextEncoder::new();
    if encoder.encode(&prometheus::gather(), &mut buf).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
