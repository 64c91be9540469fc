//! Source configuration: which upstreams to aggregate, and how long a
//! single fetch may take.
//!
//! Resolution order for the config file:
//! 1) `$AGGREGATOR_CONFIG_PATH`
//! 2) `config/sources.toml`
//! 3) built-in defaults (the stock dashboard source list)

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

const ENV_PATH: &str = "AGGREGATOR_CONFIG_PATH";
const DEFAULT_PATH: &str = "config/sources.toml";

/// Kind of upstream a `SourceSpec` points at. The kind decides the payload
/// format, the parser, the normalizer, and the provenance tag.
///
/// The two forum image kinds share one extraction shape and differ only in
/// which upstream field feeds the image slot (`thumbnail` vs `url`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    PackageIndex,
    CodeHostSearch,
    ForumWithThumbnail,
    ForumWithImage,
    ForumNoImage,
}

/// Payload format a source kind is expected to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Xml,
    Json,
}

impl SourceKind {
    /// Provenance tag surfaced to the client in `NormalizedGroup.source`.
    pub fn source_tag(&self) -> &'static str {
        match self {
            SourceKind::PackageIndex => "pypi",
            SourceKind::CodeHostSearch => "github",
            SourceKind::ForumWithThumbnail
            | SourceKind::ForumWithImage
            | SourceKind::ForumNoImage => "reddit",
        }
    }

    pub fn format(&self) -> PayloadFormat {
        match self {
            SourceKind::PackageIndex => PayloadFormat::Xml,
            _ => PayloadFormat::Json,
        }
    }
}

/// One upstream to fetch and normalize. Immutable once loaded; the list of
/// specs drives one aggregate run.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSpec {
    pub kind: SourceKind,
    pub url: String,
    pub category: String,
}

impl SourceSpec {
    pub fn new(kind: SourceKind, url: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            category: category.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Per-request fetch timeout in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceSpec>,
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_sources() -> Vec<SourceSpec> {
    vec![
        SourceSpec::new(
            SourceKind::CodeHostSearch,
            "https://api.github.com/search/repositories?q=language:python&sort=stars&order=desc",
            "popular",
        ),
        SourceSpec::new(
            SourceKind::CodeHostSearch,
            "https://api.github.com/search/repositories?q=language:python&sort=updated&order=desc",
            "updated",
        ),
        SourceSpec::new(
            SourceKind::ForumWithThumbnail,
            "https://www.reddit.com/r/webdev/.json?",
            "webdev",
        ),
        SourceSpec::new(
            SourceKind::ForumWithImage,
            "https://www.reddit.com/r/programmerhumor/.json?",
            "programmerhumor",
        ),
        SourceSpec::new(
            SourceKind::ForumNoImage,
            "https://www.reddit.com/r/python/.json?",
            "python",
        ),
        SourceSpec::new(
            SourceKind::ForumNoImage,
            "https://www.reddit.com/r/learnprogramming/.json?",
            "learnprogramming",
        ),
        SourceSpec::new(
            SourceKind::PackageIndex,
            "https://pypi.org/rss/updates.xml",
            "updated",
        ),
        SourceSpec::new(
            SourceKind::PackageIndex,
            "https://pypi.org/rss/packages.xml",
            "newest",
        ),
    ]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout_secs(),
            sources: default_sources(),
        }
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading source config from {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse config from a TOML string (useful for testing).
    pub fn from_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content).context("parsing source config toml")?;
        Ok(config)
    }

    /// Load using env var + fallbacks. An explicitly pointed-at path must
    /// exist; the default path and the built-in list are best-effort.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load(&pb);
            }
            return Err(anyhow!("{ENV_PATH} points to non-existent path"));
        }
        let default = PathBuf::from(DEFAULT_PATH);
        if default.exists() {
            return Self::load(&default);
        }
        Ok(Self::default())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
