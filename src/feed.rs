//! Lenient RSS decoding for package-index feeds.
//!
//! Feed publishers are sloppy, so this parser never fails: anything
//! quick-xml cannot make sense of degrades to zero entries and a warning.

use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Option<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
}

/// One feed entry in parsed form. `summary` maps from the RSS
/// `<description>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
}

/// Decode an RSS payload into entries. Malformed XML or a payload without
/// a channel yields an empty vec, never an error.
pub fn parse_feed(raw: &str) -> Vec<FeedEntry> {
    let xml_clean = scrub_html_entities_for_xml(raw);
    let rss: Rss = match from_str(&xml_clean) {
        Ok(rss) => rss,
        Err(err) => {
            warn!(error = %err, "discarding malformed feed payload");
            return Vec::new();
        }
    };

    let items = rss.channel.map(|c| c.item).unwrap_or_default();
    items
        .into_iter()
        .map(|it| FeedEntry {
            title: it.title,
            link: it.link,
            summary: it.description,
        })
        .collect()
}

// Feeds embed HTML entities that are not valid XML; replace the usual
// suspects before handing the payload to quick-xml.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
