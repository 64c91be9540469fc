//! Normalizers: one per source kind, mapping a parsed payload into the
//! common group shape the dashboard renders.
//!
//! All of them are pure and truncate to the first `MAX_GROUP_ITEMS`
//! entries, preserving upstream order (upstreams rank by recency/score).

use serde::Serialize;
use serde_json::Value;

use crate::config::SourceSpec;
use crate::error::NormalizeError;
use crate::feed::FeedEntry;

/// Cap on `NormalizedGroup.data`, for every source.
pub const MAX_GROUP_ITEMS: usize = 10;

/// Common item shape. One variant per output shape: fields a source kind
/// does not carry stay out of the JSON entirely, while fields the kind
/// carries but an individual entry lacks serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedItem {
    Package {
        title: Option<String>,
        link: Option<String>,
        description: Option<String>,
    },
    Repo {
        title: Option<String>,
        link: Option<String>,
        description: Option<String>,
        stars: Option<u64>,
    },
    PostWithThumbnail {
        title: Option<String>,
        link: Option<String>,
        thumbnail: Option<String>,
        ups: Option<i64>,
    },
    PostWithImage {
        title: Option<String>,
        link: Option<String>,
        image: Option<String>,
        ups: Option<i64>,
    },
    Post {
        title: Option<String>,
        link: Option<String>,
        ups: Option<i64>,
    },
}

/// One source's contribution to the aggregate: provenance tag, the category
/// label from its spec, and at most `MAX_GROUP_ITEMS` items. A failed
/// source still produces a group, with empty `data` and the failure reason
/// under `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedGroup {
    pub source: &'static str,
    pub category: String,
    pub data: Vec<NormalizedItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NormalizedGroup {
    fn new(source: &'static str, category: &str, data: Vec<NormalizedItem>) -> Self {
        Self {
            source,
            category: category.to_string(),
            data,
            error: None,
        }
    }

    /// Empty group standing in for a failed source, so the aggregate keeps
    /// one group per configured spec.
    pub fn degraded(spec: &SourceSpec, reason: impl std::fmt::Display) -> Self {
        Self {
            source: spec.kind.source_tag(),
            category: spec.category.clone(),
            data: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

/// Package-index feed entries → `Package` items. Feed parsing is lenient,
/// so this never fails; a malformed feed simply arrives here empty.
pub fn package_index(entries: Vec<FeedEntry>, category: &str) -> NormalizedGroup {
    let data = entries
        .into_iter()
        .take(MAX_GROUP_ITEMS)
        .map(|entry| NormalizedItem::Package {
            title: entry.title,
            link: entry.link,
            description: entry.summary,
        })
        .collect();

    NormalizedGroup::new("pypi", category, data)
}

/// Code-host search response → `Repo` items from `items[]`.
pub fn code_host_search(
    payload: &Value,
    category: &str,
) -> Result<NormalizedGroup, NormalizeError> {
    let items = payload
        .get("items")
        .ok_or(NormalizeError::MissingField("items"))?
        .as_array()
        .ok_or(NormalizeError::ShapeMismatch("`items` is not an array"))?;

    let data = items
        .iter()
        .take(MAX_GROUP_ITEMS)
        .map(|item| NormalizedItem::Repo {
            title: string_field(item, "name"),
            link: string_field(item, "html_url"),
            description: string_field(item, "description"),
            stars: item.get("stargazers_count").and_then(Value::as_u64),
        })
        .collect();

    Ok(NormalizedGroup::new("github", category, data))
}

/// Forum listing → posts surfacing the `thumbnail` field.
pub fn forum_with_thumbnail(
    payload: &Value,
    category: &str,
) -> Result<NormalizedGroup, NormalizeError> {
    let mut data = Vec::new();
    for child in forum_children(payload)?.iter().take(MAX_GROUP_ITEMS) {
        let post = forum_post(child)?;
        data.push(NormalizedItem::PostWithThumbnail {
            title: string_field(post, "title"),
            link: string_field(post, "permalink"),
            thumbnail: string_field(post, "thumbnail"),
            ups: post.get("ups").and_then(Value::as_i64),
        });
    }
    Ok(NormalizedGroup::new("reddit", category, data))
}

/// Forum listing → posts surfacing the post `url` as the image field.
pub fn forum_with_image(
    payload: &Value,
    category: &str,
) -> Result<NormalizedGroup, NormalizeError> {
    let mut data = Vec::new();
    for child in forum_children(payload)?.iter().take(MAX_GROUP_ITEMS) {
        let post = forum_post(child)?;
        data.push(NormalizedItem::PostWithImage {
            title: string_field(post, "title"),
            link: string_field(post, "permalink"),
            image: string_field(post, "url"),
            ups: post.get("ups").and_then(Value::as_i64),
        });
    }
    Ok(NormalizedGroup::new("reddit", category, data))
}

/// Forum listing → posts with no image field at all.
pub fn forum_no_image(
    payload: &Value,
    category: &str,
) -> Result<NormalizedGroup, NormalizeError> {
    let mut data = Vec::new();
    for child in forum_children(payload)?.iter().take(MAX_GROUP_ITEMS) {
        let post = forum_post(child)?;
        data.push(NormalizedItem::Post {
            title: string_field(post, "title"),
            link: string_field(post, "permalink"),
            ups: post.get("ups").and_then(Value::as_i64),
        });
    }
    Ok(NormalizedGroup::new("reddit", category, data))
}

// Forum listings wrap their entries twice: a `data` envelope holding
// `children`, each child holding its own `data` object with the post.
fn forum_children(payload: &Value) -> Result<&[Value], NormalizeError> {
    let envelope = payload
        .get("data")
        .ok_or(NormalizeError::MissingField("data"))?
        .as_object()
        .ok_or(NormalizeError::ShapeMismatch("`data` is not an object"))?;

    envelope
        .get("children")
        .ok_or(NormalizeError::MissingField("children"))?
        .as_array()
        .map(Vec::as_slice)
        .ok_or(NormalizeError::ShapeMismatch("`data.children` is not an array"))
}

fn forum_post(child: &Value) -> Result<&Value, NormalizeError> {
    let post = child
        .get("data")
        .ok_or(NormalizeError::ShapeMismatch("forum child without a `data` object"))?;
    if !post.is_object() {
        return Err(NormalizeError::ShapeMismatch("forum child `data` is not an object"));
    }
    Ok(post)
}

// Entry-level fields are author-supplied and routinely missing; absent or
// mistyped values resolve to None, never an error.
fn string_field(entry: &Value, key: &str) -> Option<String> {
    entry.get(key).and_then(Value::as_str).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn forum_payload(children: Vec<Value>) -> Value {
        json!({ "kind": "Listing", "data": { "children": children } })
    }

    #[test]
    fn code_host_truncates_to_ten() {
        let items: Vec<Value> = (0..15)
            .map(|i| {
                json!({
                    "name": format!("repo-{i}"),
                    "html_url": format!("https://github.com/example/repo-{i}"),
                    "description": "a repo",
                    "stargazers_count": i
                })
            })
            .collect();
        let payload = json!({ "total_count": 15, "items": items });

        let group = code_host_search(&payload, "popular").unwrap();
        assert_eq!(group.data.len(), MAX_GROUP_ITEMS);
        assert_eq!(
            group.data[0],
            NormalizedItem::Repo {
                title: Some("repo-0".into()),
                link: Some("https://github.com/example/repo-0".into()),
                description: Some("a repo".into()),
                stars: Some(0),
            }
        );
    }

    #[test]
    fn forum_truncates_to_ten_and_keeps_order() {
        let children: Vec<Value> = (0..12)
            .map(|i| json!({ "data": { "title": format!("post {i}"), "ups": i } }))
            .collect();

        let group = forum_no_image(&forum_payload(children), "python").unwrap();
        assert_eq!(group.data.len(), MAX_GROUP_ITEMS);
        assert_eq!(
            group.data[9],
            NormalizedItem::Post {
                title: Some("post 9".into()),
                link: None,
                ups: Some(9),
            }
        );
    }

    #[test]
    fn package_index_truncates_to_ten() {
        let entries: Vec<FeedEntry> = (0..11)
            .map(|i| FeedEntry {
                title: Some(format!("pkg {i}")),
                link: None,
                summary: None,
            })
            .collect();

        let group = package_index(entries, "newest");
        assert_eq!(group.data.len(), MAX_GROUP_ITEMS);
    }

    #[test]
    fn missing_items_container_is_a_missing_field() {
        let err = code_host_search(&json!({ "total_count": 0 }), "popular").unwrap_err();
        assert!(matches!(err, NormalizeError::MissingField("items")));
    }

    #[test]
    fn non_array_items_container_is_a_shape_mismatch() {
        let err = code_host_search(&json!({ "items": "nope" }), "popular").unwrap_err();
        assert!(matches!(err, NormalizeError::ShapeMismatch(_)));
    }

    #[test]
    fn forum_without_children_is_a_missing_field() {
        let err = forum_no_image(&json!({ "data": {} }), "python").unwrap_err();
        assert!(matches!(err, NormalizeError::MissingField("children")));
    }

    #[test]
    fn forum_child_without_data_is_a_shape_mismatch() {
        let payload = forum_payload(vec![json!({ "kind": "t3" })]);
        let err = forum_no_image(&payload, "python").unwrap_err();
        assert!(matches!(err, NormalizeError::ShapeMismatch(_)));
    }

    #[test]
    fn missing_entry_fields_resolve_to_null_not_error() {
        let payload = forum_payload(vec![json!({ "data": {} })]);
        let group = forum_with_thumbnail(&payload, "webdev").unwrap();

        assert_eq!(
            serde_json::to_value(&group.data[0]).unwrap(),
            json!({ "title": null, "link": null, "thumbnail": null, "ups": null })
        );
    }

    #[test]
    fn mistyped_entry_fields_resolve_to_null() {
        let payload = forum_payload(vec![json!({
            "data": { "title": 42, "permalink": ["not", "a", "string"], "ups": "many" }
        })]);
        let group = forum_no_image(&payload, "python").unwrap();
        assert_eq!(
            group.data[0],
            NormalizedItem::Post {
                title: None,
                link: None,
                ups: None,
            }
        );
    }

    #[test]
    fn normalization_is_deterministic() {
        let payload = json!({
            "items": [{ "name": "repo", "html_url": "https://example.org", "stargazers_count": 7 }]
        });
        let a = code_host_search(&payload, "popular").unwrap();
        let b = code_host_search(&payload, "popular").unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn degraded_group_serializes_its_error() {
        use crate::config::{SourceKind, SourceSpec};

        let spec = SourceSpec::new(SourceKind::CodeHostSearch, "https://example.org", "popular");
        let group = NormalizedGroup::degraded(&spec, "request timed out");
        assert_eq!(
            serde_json::to_value(&group).unwrap(),
            json!({
                "source": "github",
                "category": "popular",
                "data": [],
                "error": "request timed out"
            })
        );
    }

    #[test]
    fn healthy_group_omits_the_error_field() {
        let group = package_index(Vec::new(), "newest");
        let v = serde_json::to_value(&group).unwrap();
        assert!(v.get("error").is_none());
    }
}
