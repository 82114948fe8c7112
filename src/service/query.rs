//! Translation between the public query-string contract and the engine's
//! search body, plus the small amount of post-processing the derived
//! endpoints need.

use crate::meili::{FacetDistribution, SearchQuery, SearchResult};
use crate::service::types::{FilterValue, SearchParams, SearchResponse};
use std::collections::BTreeMap;

/// Facets requested by `/search/facets` when the caller names none.
pub const DEFAULT_FACETS: [&str; 3] = ["group", "record_type", "ply_rating"];

/// Attributes the similar-products heuristic matches on, in filter order.
pub const SIMILARITY_ATTRIBUTES: [&str; 2] = ["group", "ply_rating"];

/// Fields a suggestion string is taken from, first non-empty wins.
pub const SUGGESTION_FIELDS: [&str; 3] = ["title", "material", "pattern_model"];

pub const DEFAULT_HIGHLIGHT_PRE_TAG: &str = "<mark>";
pub const DEFAULT_HIGHLIGHT_POST_TAG: &str = "</mark>";

/// Splits a comma-separated parameter, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn list_param(raw: Option<&str>) -> Option<Vec<String>> {
    raw.map(split_list).filter(|v| !v.is_empty())
}

/// Builds the engine body for a plain search. Filter and sort expressions
/// are forwarded unvalidated.
pub fn search_query(params: &SearchParams, q: &str, limit: usize, offset: usize) -> SearchQuery {
    let mut query = SearchQuery {
        q: q.to_string(),
        limit: Some(limit),
        offset: Some(offset),
        filter: params
            .filters
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string),
        sort: list_param(params.sort.as_deref()),
        attributes_to_retrieve: list_param(params.attributes_to_retrieve.as_deref()),
        ..SearchQuery::default()
    };

    let highlight_attrs = list_param(params.attributes_to_highlight.as_deref());
    if params.highlight || highlight_attrs.is_some() {
        query.attributes_to_highlight = Some(highlight_attrs.unwrap_or_else(|| vec!["*".into()]));
        query.highlight_pre_tag = Some(
            params
                .highlight_pre_tag
                .clone()
                .unwrap_or_else(|| DEFAULT_HIGHLIGHT_PRE_TAG.to_string()),
        );
        query.highlight_post_tag = Some(
            params
                .highlight_post_tag
                .clone()
                .unwrap_or_else(|| DEFAULT_HIGHLIGHT_POST_TAG.to_string()),
        );
    }

    if let Some(crop) = list_param(params.attributes_to_crop.as_deref()) {
        query.attributes_to_crop = Some(crop);
        query.crop_length = params.crop_length;
        query.crop_marker = params.crop_marker.clone();
    }

    if params.show_matches_position {
        query.show_matches_position = Some(true);
    }

    query
}

/// Facet names for a faceted search: the caller's list, or the defaults.
pub fn facet_list(raw: Option<&str>) -> Vec<String> {
    list_param(raw).unwrap_or_else(|| DEFAULT_FACETS.iter().map(|f| f.to_string()).collect())
}

/// Empty-query, zero-hit search that only asks for counts on `fields`.
pub fn browse_query(fields: &[&str]) -> SearchQuery {
    SearchQuery {
        q: String::new(),
        limit: Some(0),
        facets: Some(fields.iter().map(|f| f.to_string()).collect()),
        ..SearchQuery::default()
    }
}

/// Keeps at most `max` values per facet, in engine order.
pub fn truncate_facets(distribution: &mut FacetDistribution, max: usize) {
    for values in distribution.values_mut() {
        values.truncate(max);
    }
}

/// Reshapes an engine result into the public contract. Hits past `limit`
/// are dropped.
pub fn into_response(result: SearchResult, q: &str, limit: usize, offset: usize) -> SearchResponse {
    let mut hits = result.hits;
    hits.truncate(limit);
    let estimated_total_hits = result
        .estimated_total_hits
        .or(result.total_hits)
        .unwrap_or(hits.len() as u64);

    SearchResponse {
        hits,
        query: q.to_string(),
        processing_time_ms: result.processing_time_ms,
        limit,
        offset,
        estimated_total_hits,
        facet_distribution: result.facet_distribution,
    }
}

/// Quotes a value for use on the right-hand side of an engine filter.
pub fn quote_filter_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn string_field<'a>(record: &'a serde_json::Value, field: &str) -> Option<&'a str> {
    record
        .get(field)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Equality filter over the reference product's similarity attributes.
/// Returns `None` for the filter when the reference carries none of them.
pub fn similarity_filter(
    reference: &serde_json::Value,
) -> (Option<String>, BTreeMap<String, String>) {
    let mut based_on = BTreeMap::new();
    let mut clauses = Vec::new();
    for field in SIMILARITY_ATTRIBUTES {
        if let Some(value) = string_field(reference, field) {
            clauses.push(format!("{field} = {}", quote_filter_value(value)));
            based_on.insert(field.to_string(), value.to_string());
        }
    }
    let filter = if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" AND "))
    };
    (filter, based_on)
}

/// Drops the reference product from a hit list and caps it at `limit`.
pub fn exclude_product(
    hits: Vec<serde_json::Value>,
    product_id: &str,
    limit: usize,
) -> Vec<serde_json::Value> {
    hits.into_iter()
        .filter(|hit| hit_id(hit).as_deref() != Some(product_id))
        .take(limit)
        .collect()
}

fn hit_id(hit: &serde_json::Value) -> Option<String> {
    match hit.get("id")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Up to `limit` distinct suggestion strings from the hits' title-like
/// fields. Comparison ignores case; the first spelling seen is kept.
pub fn suggestions_from_hits(hits: &[serde_json::Value], limit: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for hit in hits {
        if out.len() >= limit {
            break;
        }
        let Some(text) = SUGGESTION_FIELDS
            .iter()
            .find_map(|field| string_field(hit, field))
        else {
            continue;
        };
        if seen.insert(text.to_lowercase()) {
            out.push(text.to_string());
        }
    }
    out
}

/// Facet counts for one field, highest count first. Ties keep engine order.
pub fn filter_values(distribution: Option<&FacetDistribution>, field: &str) -> Vec<FilterValue> {
    let mut values: Vec<FilterValue> = distribution
        .and_then(|d| d.get(field))
        .map(|values| {
            values
                .iter()
                .map(|(value, count)| FilterValue {
                    value: value.clone(),
                    count: *count,
                })
                .collect()
        })
        .unwrap_or_default();
    values.sort_by(|a, b| b.count.cmp(&a.count));
    values
}
