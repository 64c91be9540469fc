//! Error taxonomy for the aggregation pipeline.
//!
//! Each stage has its own error type; `SourceError` is the sum the
//! aggregator catches at the task boundary when it degrades a source to an
//! empty group.

use thiserror::Error;

/// Transport-level failure of a single upstream GET.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("upstream returned HTTP {0}")]
    Status(u16),
}

impl FetchError {
    /// Map a reqwest error onto the taxonomy. Timeouts are reported
    /// distinctly; everything else is a connection-level failure.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Connection(err.to_string())
        }
    }
}

/// Hard JSON decode failure. Malformed XML is *not* an error: the feed
/// parser degrades to zero entries instead (see `feed::parse_feed`).
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed json: {0}")]
    Malformed(String),
}

/// Payload decoded but does not have the shape the normalizer expects.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("payload shape mismatch: {0}")]
    ShapeMismatch(&'static str),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
}

/// Anything that can take down one source's task. Never crosses the task
/// boundary: the aggregator converts it into a degraded group.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_messages_name_the_failure() {
        assert_eq!(FetchError::Timeout.to_string(), "request timed out");
        assert_eq!(
            FetchError::Status(503).to_string(),
            "upstream returned HTTP 503"
        );
    }

    #[test]
    fn source_error_is_transparent_over_stage_errors() {
        let err: SourceError = NormalizeError::MissingField("items").into();
        assert_eq!(err.to_string(), "missing field `items`");

        let err: SourceError = ParseError::Malformed("expected value".into()).into();
        assert!(err.to_string().contains("malformed json"));
    }
}
