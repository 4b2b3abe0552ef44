//! Request spans.

use edge_core::TimingContext;
use tracing::field::Empty;
use tracing::{info_span, Span};

/// Span wrapping one request.
///
/// `request_id`, `status`, `commit_us` and `elapsed_us` start empty and are
/// recorded as the request progresses.
pub fn request_span(method: &str, pathname: &str) -> Span {
    info_span!(
        "request",
        request_id = Empty,
        method,
        pathname,
        status = Empty,
        commit_us = Empty,
        elapsed_us = Empty,
    )
}

/// Record the final status and latency of a request on `span`.
pub fn record_timing(span: &Span, status: u16, timing: &TimingContext) {
    span.record("status", status);
    if let Some(commit) = timing.time_to_commit() {
        span.record("commit_us", commit.as_micros() as u64);
    }
    span.record("elapsed_us", timing.elapsed().as_micros() as u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_without_subscriber() {
        let span = request_span("GET", "/actions/");
        let mut timing = TimingContext::new();
        timing.mark("commit");

        record_timing(&span, 200, &timing);

        // Disabled spans accept records without effect.
        assert!(timing.time_to_commit().is_some());
    }
}
