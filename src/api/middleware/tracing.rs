//! HTTP request/response tracing middleware.

use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Creates the per-request tracing layer.
///
/// Every request gets an `INFO` span with method, URI and HTTP version; the
/// response is logged inside it with status and latency in milliseconds.
/// Pipeline events (rate limiting, auth failures, forwarding) nest under the
/// same span.
///
/// # Example Logs
///
/// ```text
/// INFO request{method=GET uri=/api/incidents/7 version=HTTP/1.1}: finished processing request latency=14 ms status=200
/// WARN request{method=GET uri=/api/incidents/7 version=HTTP/1.1}: Upstream unavailable service=incidents reason=...
/// ```
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
        .on_failure(DefaultOnFailure::new().level(Level::WARN))
}
