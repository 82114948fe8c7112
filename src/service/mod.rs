pub mod catalog;
mod metrics;
pub mod query;
mod similar_cache;
pub mod types;

use crate::config::Config;
use crate::meili::{EnqueuedTask, Health, MeiliClient, MeiliError, Task, Version};
use catalog::{IndexSettings, Product, PRIMARY_KEY};
use indexmap::IndexMap;
use similar_cache::{Lookup, SimilarCache};
use std::sync::Arc;
use std::time::Duration;
use types::{
    FilterKind, FilterValue, IndexStatsView, SearchParams, SearchResponse, SimilarResponse,
    StatsResponse, SuggestionsResponse, TaskResponse,
};

pub const DEFAULT_LIMIT: usize = 20;
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;
pub const DEFAULT_SIMILAR_LIMIT: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Upstream(#[from] MeiliError),
}

/// Translates public search requests into engine calls. Cheap to clone.
#[derive(Clone)]
pub struct SearchService(Arc<Inner>);

struct Inner {
    config: Config,
    meili: MeiliClient,
    similar: SimilarCache,
    metrics: metrics::Metrics,
}

impl SearchService {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let meili = MeiliClient::new(
            &config.meili_url,
            &config.meili_master_key,
            &config.products_index,
            Duration::from_secs(config.meili_timeout_secs),
        )?;
        let similar = SimilarCache::new(
            config.similar_cache_capacity,
            Duration::from_secs(config.similar_cache_ttl_secs),
        );
        Ok(Self(Arc::new(Inner {
            config,
            meili,
            similar,
            metrics: metrics::Metrics::default(),
        })))
    }

    pub fn config(&self) -> &Config {
        &self.0.config
    }

    pub fn metrics_text(&self) -> String {
        let mut out = self.0.metrics.render();
        out.push_str(&format!(
            "# TYPE similar_cache_entries gauge\nsimilar_cache_entries {}\n",
            self.0.similar.len()
        ));
        out
    }

    fn upstream_error(&self, err: MeiliError) -> ServiceError {
        self.0.metrics.inc_upstream_error();
        tracing::warn!(%err, "meilisearch call failed");
        ServiceError::Upstream(err)
    }

    fn upstream<T>(&self, res: Result<T, MeiliError>) -> Result<T, ServiceError> {
        res.map_err(|err| self.upstream_error(err))
    }

    fn check_limit(&self, limit: usize, min: usize) -> Result<usize, ServiceError> {
        let max = self.0.config.max_limit;
        if limit < min || limit > max {
            return Err(ServiceError::InvalidArgument(format!(
                "limit must be between {min} and {max}"
            )));
        }
        Ok(limit)
    }

    pub async fn search(&self, params: SearchParams) -> Result<SearchResponse, ServiceError> {
        self.0.metrics.inc_search();
        let Some(q) = params.q.as_deref() else {
            return Err(ServiceError::InvalidArgument(
                "missing required parameter: q".into(),
            ));
        };
        let limit = self.check_limit(params.limit.unwrap_or(DEFAULT_LIMIT), 1)?;
        let offset = params.offset.unwrap_or(0);

        let body = query::search_query(&params, q, limit, offset);
        let result = self.upstream(self.0.meili.search(&body).await)?;
        tracing::info!(q, hits = result.hits.len(), "search");
        Ok(query::into_response(result, q, limit, offset))
    }

    /// Search plus facet counts. A zero limit returns counts only.
    pub async fn faceted_search(
        &self,
        params: SearchParams,
    ) -> Result<SearchResponse, ServiceError> {
        self.0.metrics.inc_facet_search();
        let q = params.q.clone().unwrap_or_default();
        let limit = self.check_limit(params.limit.unwrap_or(DEFAULT_LIMIT), 0)?;
        let offset = params.offset.unwrap_or(0);

        let mut body = query::search_query(&params, &q, limit, offset);
        body.facets = Some(query::facet_list(params.facets.as_deref()));
        let result = self.upstream(self.0.meili.search(&body).await)?;

        let mut response = query::into_response(result, &q, limit, offset);
        let distribution = response.facet_distribution.get_or_insert_with(Default::default);
        if let Some(max) = params.max_values_per_facet {
            query::truncate_facets(distribution, max);
        }
        tracing::info!(q = %q, hits = response.hits.len(), "faceted search");
        Ok(response)
    }

    pub async fn suggestions(
        &self,
        q: Option<String>,
        limit: Option<usize>,
    ) -> Result<SuggestionsResponse, ServiceError> {
        self.0.metrics.inc_suggestions();
        let Some(q) = q else {
            return Err(ServiceError::InvalidArgument(
                "missing required parameter: q".into(),
            ));
        };
        let max = self.0.config.max_suggestions;
        let limit = limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT);
        if limit == 0 || limit > max {
            return Err(ServiceError::InvalidArgument(format!(
                "limit must be between 1 and {max}"
            )));
        }
        if q.trim().is_empty() {
            return Ok(SuggestionsResponse {
                query: q,
                suggestions: Vec::new(),
            });
        }

        // Over-fetch so duplicates do not starve the list.
        let body = crate::meili::SearchQuery {
            q: q.clone(),
            limit: Some(limit.saturating_mul(2)),
            attributes_to_retrieve: Some(
                query::SUGGESTION_FIELDS
                    .iter()
                    .map(|f| f.to_string())
                    .collect(),
            ),
            ..Default::default()
        };
        let result = self.upstream(self.0.meili.search(&body).await)?;
        let suggestions = query::suggestions_from_hits(&result.hits, limit);
        Ok(SuggestionsResponse {
            query: q,
            suggestions,
        })
    }

    /// Products sharing the reference product's group and ply rating. Two
    /// round trips: fetch the reference, then search on its attributes.
    pub async fn similar(
        &self,
        product_id: &str,
        limit: Option<usize>,
    ) -> Result<SimilarResponse, ServiceError> {
        self.0.metrics.inc_similar();
        if product_id.is_empty() || product_id.len() > self.0.config.max_id_len {
            return Err(ServiceError::InvalidArgument("invalid product id".into()));
        }
        let limit = self.check_limit(limit.unwrap_or(DEFAULT_SIMILAR_LIMIT), 1)?;

        let generation = match self.0.similar.get(product_id, limit) {
            Lookup::Hit(hit) => {
                self.0.metrics.inc_similar_cache_hit();
                return Ok(hit);
            }
            Lookup::Miss(generation) => generation,
        };

        let reference = match self.0.meili.get_document(product_id).await {
            Ok(doc) => doc,
            Err(err) if err.is_not_found() => {
                return Err(ServiceError::NotFound(format!(
                    "product {product_id} not found"
                )))
            }
            Err(err) => return Err(self.upstream_error(err)),
        };

        let (filter, based_on) = query::similarity_filter(&reference);
        let search = crate::meili::SearchQuery {
            q: String::new(),
            limit: Some(limit.saturating_add(1)),
            filter,
            ..Default::default()
        };
        let result = self.upstream(self.0.meili.search(&search).await)?;
        let similar_products = query::exclude_product(result.hits, product_id, limit);

        let response = SimilarResponse {
            product_id: product_id.to_string(),
            based_on,
            count: similar_products.len(),
            similar_products,
        };
        self.0.similar.insert(product_id, limit, generation, response.clone());
        Ok(response)
    }

    async fn facet_counts(&self, field: &'static str) -> Result<Vec<FilterValue>, ServiceError> {
        let result = self.upstream(self.0.meili.search(&query::browse_query(&[field])).await)?;
        Ok(query::filter_values(result.facet_distribution.as_ref(), field))
    }

    pub async fn filter_values(&self, kind: FilterKind) -> Result<Vec<FilterValue>, ServiceError> {
        self.0.metrics.inc_filter_values();
        self.facet_counts(kind.field()).await
    }

    pub async fn stats(&self) -> Result<StatsResponse, ServiceError> {
        self.0.metrics.inc_analytics();
        let (stats, groups, record_types, ply_ratings) = tokio::try_join!(
            async { self.upstream(self.0.meili.stats().await) },
            self.facet_counts(FilterKind::Groups.field()),
            self.facet_counts(FilterKind::RecordTypes.field()),
            self.facet_counts(FilterKind::PlyRatings.field()),
        )?;

        let to_map = |values: Vec<FilterValue>| -> IndexMap<String, u64> {
            values.into_iter().map(|v| (v.value, v.count)).collect()
        };
        Ok(StatsResponse {
            index_stats: IndexStatsView {
                number_of_documents: stats.number_of_documents,
                is_indexing: stats.is_indexing,
            },
            groups: to_map(groups),
            record_types: to_map(record_types),
            ply_ratings: to_map(ply_ratings),
        })
    }

    pub async fn index_products(&self, products: Vec<Product>) -> Result<TaskResponse, ServiceError> {
        self.0.metrics.inc_index_op();
        let count = products.len();
        let products: Vec<Product> = products.into_iter().map(Product::enrich).collect();

        let enqueued = self.upstream(self.0.meili.add_documents(&products, PRIMARY_KEY).await)?;
        tracing::info!(count, task_uid = enqueued.task_uid, "indexing products");
        // The engine owns the documents now, whether or not the wait below
        // completes.
        self.0.similar.clear();
        let response = self.await_task(enqueued).await?;

        if response.status == "succeeded" {
            tracing::info!(count, "products indexed");
        } else {
            tracing::warn!(count, status = %response.status, "indexing did not succeed");
        }
        Ok(response)
    }

    pub async fn update_settings(
        &self,
        settings: IndexSettings,
    ) -> Result<TaskResponse, ServiceError> {
        self.0.metrics.inc_index_op();
        let settings: crate::meili::Settings = settings.into();
        if settings.is_empty() {
            return Ok(TaskResponse {
                task_uid: "no_changes".into(),
                status: "succeeded".into(),
                kind: "settingsUpdate".into(),
                details: Some(serde_json::json!({"message": "No settings to update"})),
            });
        }

        let enqueued = self.upstream(self.0.meili.update_settings(&settings).await)?;
        let response = self.await_task(enqueued).await?;
        if response.status == "succeeded" {
            tracing::info!("index settings updated");
        } else {
            tracing::warn!(status = %response.status, "settings update did not succeed");
        }
        Ok(response)
    }

    /// How long a request may poll a task. Bounded by three quarters of the
    /// inbound request timeout so the handler answers before the router
    /// cancels it.
    fn task_wait_budget(&self) -> Duration {
        let configured = Duration::from_secs(self.0.config.task_wait_timeout_secs);
        let request = Duration::from_secs(self.0.config.request_timeout_secs);
        configured.min(request * 3 / 4)
    }

    async fn await_task(&self, enqueued: EnqueuedTask) -> Result<TaskResponse, ServiceError> {
        let timeout = self.task_wait_budget();
        let interval = Duration::from_millis(self.0.config.task_poll_interval_ms.max(1));
        let task = self.upstream(
            self.0
                .meili
                .wait_for_task(enqueued.task_uid, timeout, interval)
                .await,
        )?;
        Ok(task_response(task, timeout))
    }

    pub async fn health(&self) -> Result<(Health, Version), ServiceError> {
        let health = self.upstream(self.0.meili.health().await)?;
        let version = self.upstream(self.0.meili.version().await)?;
        Ok((health, version))
    }
}

fn task_response(task: Task, timeout: Duration) -> TaskResponse {
    let details = if task.is_finished() {
        task.error.or(task.details)
    } else {
        tracing::warn!(task_uid = task.uid, status = %task.status, "task wait timed out");
        Some(serde_json::json!({
            "error": "Could not wait for completion",
            "message": format!("task still {} after {:?}", task.status, timeout),
        }))
    };
    TaskResponse {
        task_uid: task.uid.to_string(),
        status: task.status,
        kind: task.kind,
        details,
    }
}
