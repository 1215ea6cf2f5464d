//! Per-source dispatch tables: everything that varies by
//! `DataSource` (primary timestamp field, context type, parent
//! resolution, datapoint/context sibling predicates, recency half-life)
//! lives here as a `match` per table. Adding an eighth source means
//! extending every `match` in this file and nowhere else.

use crate::store::Predicate;
use crate::types::{DataSource, MetaValue, Metadata};

/// The field `navigator::datapoint_scope` sorts siblings by.
pub fn primary_timestamp_field(source: DataSource) -> &'static str {
    match source {
        DataSource::Slack => "timestamp",
        DataSource::Gmail => "date",
        DataSource::Calendar => "start",
        _ => "updatedAt",
    }
}

/// Recency half-life in days, for `query::scoring::recency_boost`.
pub fn half_life_days(source: DataSource) -> f64 {
    match source {
        DataSource::Slack => 7.0,
        DataSource::Calendar => 14.0,
        DataSource::Gmail => 14.0,
        DataSource::Jira => 30.0,
        DataSource::Github => 60.0,
        DataSource::Confluence => 90.0,
        DataSource::Drive => 90.0,
    }
}

fn field_str<'a>(metadata: &'a Metadata, key: &str) -> Option<&'a str> {
    metadata.get(key).and_then(MetaValue::as_str)
}

fn folder_from_path(path: &str) -> Option<String> {
    path.rfind('/').map(|i| path[..i].to_string())
}

/// The stored id of the parent document, or `None` if this source/item
/// carries no resolvable parent.
pub fn resolve_parent(source: DataSource, metadata: &Metadata) -> Option<String> {
    let raw = field_str(metadata, "parentId")
        .or_else(|| field_str(metadata, "parentDocId"))
        .map(str::to_string)?;

    if source == DataSource::Confluence && field_str(metadata, "type") == Some("comment") {
        Some(format!("confluence_{raw}"))
    } else {
        Some(raw)
    }
}

/// The logical id children of this item are filed under (`children`
/// navigation dispatches on this, not on `resolve_parent`).
pub fn children_key(source: DataSource, stored_id: &str, metadata: &Metadata) -> String {
    match source {
        DataSource::Slack | DataSource::Github => stored_id.to_string(),
        _ => field_str(metadata, "id").unwrap_or(stored_id).to_string(),
    }
}

/// Predicate matching items whose `parentId` is `logical_id` or whose
/// `parentDocId` is `stored_id` (chunk children of the current item).
pub fn children_predicate(logical_id: &str, stored_id: &str) -> Predicate {
    Predicate::Or(vec![
        Predicate::Eq("parentId".to_string(), MetaValue::Str(logical_id.to_string())),
        Predicate::Eq("parentDocId".to_string(), MetaValue::Str(stored_id.to_string())),
    ])
}

/// Datapoint-scope sibling predicate: the finest-grained grouping
/// (thread, issue, folder, ...). `None` when no grouping field applies.
pub fn datapoint_predicate(source: DataSource, metadata: &Metadata) -> Option<Predicate> {
    match source {
        DataSource::Slack => field_str(metadata, "threadTs")
            .map(|v| Predicate::Eq("threadTs".to_string(), MetaValue::Str(v.to_string())))
            .or_else(|| {
                field_str(metadata, "channelId")
                    .map(|v| Predicate::Eq("channelId".to_string(), MetaValue::Str(v.to_string())))
            }),
        DataSource::Gmail => field_str(metadata, "threadId")
            .map(|v| Predicate::Eq("threadId".to_string(), MetaValue::Str(v.to_string()))),
        DataSource::Jira => field_str(metadata, "parentId")
            .map(|v| Predicate::Eq("parentId".to_string(), MetaValue::Str(v.to_string())))
            .or_else(|| {
                field_str(metadata, "project")
                    .map(|v| Predicate::Eq("project".to_string(), MetaValue::Str(v.to_string())))
            }),
        DataSource::Drive => field_str(metadata, "folderPath")
            .map(|v| Predicate::Eq("folderPath".to_string(), MetaValue::Str(v.to_string())))
            .or_else(|| {
                field_str(metadata, "path")
                    .and_then(folder_from_path)
                    .map(|folder| Predicate::Eq("folderPath".to_string(), MetaValue::Str(folder)))
            }),
        DataSource::Confluence => field_str(metadata, "parentId")
            .map(|v| Predicate::Eq("parentId".to_string(), MetaValue::Str(v.to_string())))
            .or_else(|| {
                field_str(metadata, "space")
                    .map(|v| Predicate::Eq("space".to_string(), MetaValue::Str(v.to_string())))
            }),
        DataSource::Calendar => Some(Predicate::Eq(
            "source".to_string(),
            MetaValue::Str("calendar".to_string()),
        )),
        DataSource::Github => field_str(metadata, "parentId")
            .map(|v| Predicate::Eq("parentId".to_string(), MetaValue::Str(v.to_string())))
            .or_else(|| {
                field_str(metadata, "repo")
                    .map(|v| Predicate::Eq("repo".to_string(), MetaValue::Str(v.to_string())))
            }),
    }
}

/// Context-scope sibling predicate: one level coarser than datapoint
/// scope (channel, project, space, repo, folder). `None` for calendar,
/// which has no context grouping.
pub fn context_predicate(source: DataSource, metadata: &Metadata) -> Option<Predicate> {
    match source {
        DataSource::Slack => field_str(metadata, "channelId")
            .map(|v| Predicate::Eq("channelId".to_string(), MetaValue::Str(v.to_string()))),
        DataSource::Gmail => field_str(metadata, "threadId")
            .map(|v| Predicate::Eq("threadId".to_string(), MetaValue::Str(v.to_string()))),
        DataSource::Jira => field_str(metadata, "project")
            .map(|v| Predicate::Eq("project".to_string(), MetaValue::Str(v.to_string()))),
        DataSource::Drive => field_str(metadata, "folderPath")
            .map(|v| Predicate::Eq("folderPath".to_string(), MetaValue::Str(v.to_string())))
            .or_else(|| {
                field_str(metadata, "path")
                    .and_then(folder_from_path)
                    .map(|folder| Predicate::Eq("folderPath".to_string(), MetaValue::Str(folder)))
            }),
        DataSource::Confluence => field_str(metadata, "space")
            .map(|v| Predicate::Eq("space".to_string(), MetaValue::Str(v.to_string()))),
        DataSource::Github => field_str(metadata, "repo")
            .map(|v| Predicate::Eq("repo".to_string(), MetaValue::Str(v.to_string()))),
        DataSource::Calendar => None,
    }
}

/// The human-readable label for this item's immediate container.
pub fn context_type(source: DataSource, metadata: &Metadata) -> String {
    let item_type = field_str(metadata, "type");
    match source {
        DataSource::Slack => {
            if field_str(metadata, "threadTs").is_some() {
                "thread"
            } else {
                "channel"
            }
        }
        DataSource::Gmail => "thread",
        DataSource::Jira => {
            if item_type == Some("comment") {
                "issue"
            } else {
                "project"
            }
        }
        DataSource::Drive => "folder",
        DataSource::Confluence => {
            if item_type == Some("comment") {
                "page"
            } else {
                "space"
            }
        }
        DataSource::Calendar => "calendar",
        DataSource::Github => {
            if matches!(item_type, Some("pr_comment") | Some("pr_review")) {
                "pull_request"
            } else {
                "repository"
            }
        }
    }
    .to_string()
}
