//! Tire catalog records and the index settings profile they are searched
//! with.

use crate::meili::Settings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PRIMARY_KEY: &str = "id";

/// One catalog item as pushed to the index. Unknown fields are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub group: String,
    pub material: String,
    pub record_type: String,
    pub mpn: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub ply_rating: Option<String>,
    #[serde(default)]
    pub pattern_model: Option<String>,
    #[serde(default)]
    pub construction_type: Option<String>,
    #[serde(default)]
    pub load_index: Option<String>,
    #[serde(default)]
    pub speed_rating: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub special_features: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_brand")]
    pub brand: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_brand() -> String {
    "Apollo".to_string()
}

impl Product {
    /// Fills `title`, `category` and `tags` when the caller left them out.
    pub fn enrich(mut self) -> Self {
        if self.title.as_deref().map_or(true, str::is_empty) {
            self.title = Some(self.material.clone());
        }
        if self.category.as_deref().map_or(true, str::is_empty) {
            self.category = Some(format!("{} {}s", self.group, self.record_type));
        }
        if self.tags.is_empty() {
            let mut tags: Vec<String> = Vec::new();
            let words = self
                .pattern_model
                .iter()
                .flat_map(|p| p.split_whitespace())
                .chain(self.ply_rating.as_deref());
            for word in words {
                let tag = word.to_lowercase();
                if !tag.is_empty() && !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
            self.tags = tags;
        }
        self
    }
}

/// Public, snake_case view of the engine settings a caller may update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexSettings {
    pub searchable_attributes: Option<Vec<String>>,
    pub filterable_attributes: Option<Vec<String>>,
    pub sortable_attributes: Option<Vec<String>>,
    pub ranking_rules: Option<Vec<String>>,
    pub stop_words: Option<Vec<String>>,
    pub synonyms: Option<BTreeMap<String, Vec<String>>>,
    pub distinct_attribute: Option<String>,
}

impl From<IndexSettings> for Settings {
    fn from(s: IndexSettings) -> Self {
        Settings {
            searchable_attributes: s.searchable_attributes,
            filterable_attributes: s.filterable_attributes,
            sortable_attributes: s.sortable_attributes,
            ranking_rules: s.ranking_rules,
            stop_words: s.stop_words,
            synonyms: s.synonyms,
            distinct_attribute: s.distinct_attribute,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl IndexSettings {
    /// Settings profile for the tire catalog: every facet the API exposes is
    /// filterable, and common tire vocabulary is wired as synonyms.
    pub fn tire_catalog() -> Self {
        let synonyms = [
            ("tire", &["tyre", "wheel"][..]),
            ("tyre", &["tire"][..]),
            ("radial", &["rad"][..]),
            ("bias", &["diagonal"][..]),
            ("tube", &["inner tube"][..]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), strings(v)))
        .collect();

        IndexSettings {
            searchable_attributes: Some(strings(&[
                "title",
                "material",
                "pattern_model",
                "mpn",
                "size",
                "group",
                "tags",
            ])),
            filterable_attributes: Some(strings(&[
                "group",
                "record_type",
                "brand",
                "ply_rating",
                "construction_type",
                "load_index",
                "speed_rating",
                "series",
                "special_features",
                "category",
                "id",
            ])),
            sortable_attributes: Some(strings(&[
                "size",
                "load_index",
                "speed_rating",
                "title",
                "mpn",
            ])),
            ranking_rules: Some(strings(&[
                "words",
                "typo",
                "proximity",
                "attribute",
                "sort",
                "exactness",
            ])),
            stop_words: Some(strings(&["the", "a", "an"])),
            synonyms: Some(synonyms),
            distinct_attribute: None,
        }
    }
}
