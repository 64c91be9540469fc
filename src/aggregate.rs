//! The fan-out aggregation pipeline: one fetch → parse → normalize task per
//! configured source, all run concurrently, joined in configuration order.

use std::time::Instant;

use futures::future::join_all;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{SourceKind, SourceSpec};
use crate::error::{ParseError, SourceError};
use crate::feed;
use crate::fetch::Fetch;
use crate::normalize::{self, NormalizedGroup};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "aggregate_items_total",
            "Normalized items produced across all sources."
        );
        describe_counter!(
            "aggregate_source_errors_total",
            "Sources degraded to an empty group by fetch/parse/shape errors."
        );
        describe_histogram!("aggregate_run_ms", "Wall-clock time of one aggregate run.");
    });
}

/// Run one aggregate call: fetch every configured source concurrently and
/// assemble one group per spec, in spec order.
///
/// The join is positional: `join_all` yields results in the order the
/// futures were built, so the output never depends on which upstream
/// answered first. A failed source yields a degraded group instead of
/// failing the call.
pub async fn aggregate<F: Fetch + ?Sized>(
    fetcher: &F,
    specs: &[SourceSpec],
) -> Vec<NormalizedGroup> {
    ensure_metrics_described();
    let t0 = Instant::now();

    let groups = join_all(specs.iter().map(|spec| run_source(fetcher, spec))).await;

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("aggregate_run_ms").record(ms);
    info!(
        sources = specs.len(),
        degraded = groups.iter().filter(|g| g.error.is_some()).count(),
        elapsed_ms = ms,
        "aggregate run complete"
    );

    groups
}

async fn run_source<F: Fetch + ?Sized>(fetcher: &F, spec: &SourceSpec) -> NormalizedGroup {
    match collect_source(fetcher, spec).await {
        Ok(group) => {
            counter!("aggregate_items_total").increment(group.data.len() as u64);
            group
        }
        Err(err) => {
            warn!(
                source = spec.kind.source_tag(),
                category = %spec.category,
                url = %spec.url,
                error = %err,
                "source degraded to empty group"
            );
            counter!("aggregate_source_errors_total").increment(1);
            NormalizedGroup::degraded(spec, err)
        }
    }
}

async fn collect_source<F: Fetch + ?Sized>(
    fetcher: &F,
    spec: &SourceSpec,
) -> Result<NormalizedGroup, SourceError> {
    let raw = fetcher.fetch(&spec.url).await?;
    normalize_payload(spec, &raw)
}

/// Parse + normalize one raw payload according to its spec's kind. Split
/// from the fetch so tests can feed payloads straight through.
pub fn normalize_payload(spec: &SourceSpec, raw: &str) -> Result<NormalizedGroup, SourceError> {
    let group = match spec.kind {
        SourceKind::PackageIndex => {
            normalize::package_index(feed::parse_feed(raw), &spec.category)
        }
        SourceKind::CodeHostSearch => {
            normalize::code_host_search(&parse_json(raw)?, &spec.category)?
        }
        SourceKind::ForumWithThumbnail => {
            normalize::forum_with_thumbnail(&parse_json(raw)?, &spec.category)?
        }
        SourceKind::ForumWithImage => {
            normalize::forum_with_image(&parse_json(raw)?, &spec.category)?
        }
        SourceKind::ForumNoImage => {
            normalize::forum_no_image(&parse_json(raw)?, &spec.category)?
        }
    };
    Ok(group)
}

fn parse_json(raw: &str) -> Result<Value, ParseError> {
    serde_json::from_str(raw).map_err(|err| ParseError::Malformed(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceKind;

    #[test]
    fn malformed_feed_payload_is_an_empty_group_not_an_error() {
        let spec = SourceSpec::new(SourceKind::PackageIndex, "https://example.org", "updated");
        let group = normalize_payload(&spec, "definitely not xml <<<").unwrap();
        assert_eq!(group.source, "pypi");
        assert!(group.data.is_empty());
        assert!(group.error.is_none());
    }

    #[test]
    fn malformed_json_payload_is_a_parse_error() {
        let spec = SourceSpec::new(SourceKind::CodeHostSearch, "https://example.org", "popular");
        let err = normalize_payload(&spec, "definitely not json <<<").unwrap_err();
        assert!(matches!(err, SourceError::Parse(ParseError::Malformed(_))));
    }

    #[test]
    fn shape_errors_surface_as_normalize_errors() {
        let spec = SourceSpec::new(SourceKind::ForumNoImage, "https://example.org", "python");
        let err = normalize_payload(&spec, r#"{"data": 5}"#).unwrap_err();
        assert!(matches!(err, SourceError::Normalize(_)));
    }
}
