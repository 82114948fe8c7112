use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct Metrics {
    search_total: AtomicU64,
    facet_search_total: AtomicU64,
    suggestions_total: AtomicU64,
    similar_total: AtomicU64,
    similar_cache_hits_total: AtomicU64,
    filter_values_total: AtomicU64,
    analytics_total: AtomicU64,
    index_ops_total: AtomicU64,
    upstream_errors_total: AtomicU64,
}

impl Metrics {
    pub fn inc_search(&self) {
        self.search_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_facet_search(&self) {
        self.facet_search_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_suggestions(&self) {
        self.suggestions_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_similar(&self) {
        self.similar_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_similar_cache_hit(&self) {
        self.similar_cache_hits_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_filter_values(&self) {
        self.filter_values_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_analytics(&self) {
        self.analytics_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_index_op(&self) {
        self.index_ops_total.fetch_add(1, Ordering::Relaxed);
    }
    pub fn inc_upstream_error(&self) {
        self.upstream_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render(&self) -> String {
        let counters = [
            ("search_total", &self.search_total),
            ("facet_search_total", &self.facet_search_total),
            ("suggestions_total", &self.suggestions_total),
            ("similar_total", &self.similar_total),
            ("similar_cache_hits_total", &self.similar_cache_hits_total),
            ("filter_values_total", &self.filter_values_total),
            ("analytics_total", &self.analytics_total),
            ("index_ops_total", &self.index_ops_total),
            ("upstream_errors_total", &self.upstream_errors_total),
        ];

        let mut out = String::new();
        for (name, counter) in counters {
            out.push_str(&format!(
                "# TYPE {name} counter\n{name} {}\n",
                counter.load(Ordering::Relaxed)
            ));
        }
        out
    }
}
