use crate::meili::FacetDistribution;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Query string accepted by `/search` and `/search/facets`. List-valued
/// parameters are comma-separated. `facets` and `max_values_per_facet` only
/// apply to faceted search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub filters: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub sort: Option<String>,
    #[serde(default)]
    pub highlight: bool,
    pub attributes_to_highlight: Option<String>,
    pub highlight_pre_tag: Option<String>,
    pub highlight_post_tag: Option<String>,
    pub attributes_to_retrieve: Option<String>,
    pub attributes_to_crop: Option<String>,
    pub crop_length: Option<usize>,
    pub crop_marker: Option<String>,
    #[serde(default)]
    pub show_matches_position: bool,
    pub facets: Option<String>,
    pub max_values_per_facet: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<serde_json::Value>,
    pub query: String,
    pub processing_time_ms: u64,
    pub limit: usize,
    pub offset: usize,
    pub estimated_total_hits: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_distribution: Option<FacetDistribution>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub query: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarResponse {
    pub product_id: String,
    /// Attributes of the reference product the match was made on.
    pub based_on: BTreeMap<String, String>,
    pub similar_products: Vec<serde_json::Value>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterValue {
    pub value: String,
    pub count: u64,
}

/// Facet fields exposed through `/search/filters/{kind}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Groups,
    RecordTypes,
    PlyRatings,
}

impl FilterKind {
    pub fn from_path(kind: &str) -> Option<Self> {
        match kind {
            "groups" => Some(FilterKind::Groups),
            "record-types" => Some(FilterKind::RecordTypes),
            "ply-ratings" => Some(FilterKind::PlyRatings),
            _ => None,
        }
    }

    pub fn field(self) -> &'static str {
        match self {
            FilterKind::Groups => "group",
            FilterKind::RecordTypes => "record_type",
            FilterKind::PlyRatings => "ply_rating",
        }
    }

}

/// Body of `/search/filters/{kind}`. The value list sits under a key named
/// after the kind, e.g. `{"facet": "group", "total": 2, "groups": [...]}`.
#[derive(Debug, Clone, Serialize)]
pub struct FilterValuesResponse {
    pub facet: &'static str,
    pub total: usize,
    #[serde(flatten)]
    pub values: FilterValueList,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValueList {
    Groups(Vec<FilterValue>),
    RecordTypes(Vec<FilterValue>),
    PlyRatings(Vec<FilterValue>),
}

impl FilterValuesResponse {
    pub fn new(kind: FilterKind, values: Vec<FilterValue>) -> Self {
        let total = values.len();
        let values = match kind {
            FilterKind::Groups => FilterValueList::Groups(values),
            FilterKind::RecordTypes => FilterValueList::RecordTypes(values),
            FilterKind::PlyRatings => FilterValueList::PlyRatings(values),
        };
        Self {
            facet: kind.field(),
            total,
            values,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatsView {
    pub number_of_documents: u64,
    pub is_indexing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub index_stats: IndexStatsView,
    pub groups: IndexMap<String, u64>,
    pub record_types: IndexMap<String, u64>,
    pub ply_ratings: IndexMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task_uid: String,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
