//! Core data model: `DataSource`, `LogicalDocument`, `StoredItem`, and the
//! request/response shapes of the caller-facing operations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The seven upstream sources the index knows about. A closed
/// enumeration by design: adding an eighth source is a coordinated
/// change across the per-source dispatch tables in `sources.rs`, not an
/// open extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Jira,
    Slack,
    Gmail,
    Drive,
    Confluence,
    Calendar,
    Github,
}

impl DataSource {
    pub const ALL: [DataSource; 7] = [
        DataSource::Jira,
        DataSource::Slack,
        DataSource::Gmail,
        DataSource::Drive,
        DataSource::Confluence,
        DataSource::Calendar,
        DataSource::Github,
    ];

    /// The name of the backing collection for this source.
    pub fn collection_name(&self) -> String {
        format!("collector_{}", self.as_str())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Jira => "jira",
            DataSource::Slack => "slack",
            DataSource::Gmail => "gmail",
            DataSource::Drive => "drive",
            DataSource::Confluence => "confluence",
            DataSource::Calendar => "calendar",
            DataSource::Github => "github",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jira" => Ok(DataSource::Jira),
            "slack" => Ok(DataSource::Slack),
            "gmail" => Ok(DataSource::Gmail),
            "drive" => Ok(DataSource::Drive),
            "confluence" => Ok(DataSource::Confluence),
            "calendar" => Ok(DataSource::Calendar),
            "github" => Ok(DataSource::Github),
            other => Err(format!("unknown data source: {other}")),
        }
    }
}

/// A flattened metadata value: the only shapes a `StoredItem` may carry
/// after `flatten_metadata` runs. Arrays and objects are JSON-encoded
/// into `Str` before reaching this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

pub type Metadata = BTreeMap<String, MetaValue>;

/// Caller-supplied pre-chunked content, overriding automatic chunking
/// when at least two slices are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreChunked {
    pub chunks: Vec<String>,
}

/// A document as submitted by an upstream connector, before chunking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalDocument {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub pre_chunked: Option<PreChunked>,
}

/// A single stored unit of the vector index: either a whole short
/// document or one chunk of a longer one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredItem {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    pub score: f32,
    pub source: Option<DataSource>,
}

/// The kind of matching the Query Engine performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Vector,
    Keyword,
    Hybrid,
}

impl Default for SearchType {
    fn default() -> Self {
        SearchType::Vector
    }
}

/// Options accepted by `search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    #[serde(default = "default_sources")]
    pub sources: Vec<DataSource>,
    #[serde(default)]
    pub search_type: SearchType,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub r#where: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

fn default_sources() -> Vec<DataSource> {
    DataSource::ALL.to_vec()
}

fn default_limit() -> usize {
    20
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            search_type: SearchType::default(),
            limit: default_limit(),
            offset: 0,
            r#where: BTreeMap::new(),
            start_date: None,
            end_date: None,
        }
    }
}

/// Result of `search`: the paginated window plus the pre-pagination
/// post-coalesce total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<StoredItem>,
    pub total: usize,
}

/// Navigation direction, independent of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Prev,
    Next,
    Siblings,
    Parent,
    Children,
}

/// Navigation granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Chunk,
    Datapoint,
    Context,
}

/// The navigation metadata returned alongside `related`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationInfo {
    pub has_prev: bool,
    pub has_next: bool,
    pub parent_id: Option<String>,
    pub context_type: String,
    pub total_siblings: Option<usize>,
}

impl NavigationInfo {
    pub fn unknown() -> Self {
        Self {
            has_prev: false,
            has_next: false,
            parent_id: None,
            context_type: "unknown".to_string(),
            total_siblings: None,
        }
    }
}

/// Result of `navigate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigateResponse {
    pub current: Option<StoredItem>,
    pub related: Vec<StoredItem>,
    pub navigation: NavigationInfo,
}

impl NavigateResponse {
    pub fn not_found() -> Self {
        Self {
            current: None,
            related: vec![],
            navigation: NavigationInfo::unknown(),
        }
    }
}
