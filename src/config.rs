use serde::{Deserialize, Serialize};
use std::net::IpAddr;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub port: u16,
    pub bind_addr: IpAddr,
    pub meili_url: String,
    pub meili_master_key: String,
    pub products_index: String,
    pub admin_api_key: Option<String>,
    pub service_name: String,
    pub request_timeout_secs: u64,
    pub meili_timeout_secs: u64,
    pub max_body_bytes: usize,
    pub max_limit: usize,
    pub max_suggestions: usize,
    pub max_id_len: usize,
    pub similar_cache_capacity: usize,
    pub similar_cache_ttl_secs: u64,
    pub task_wait_timeout_secs: u64,
    pub task_poll_interval_ms: u64,
    pub apply_default_settings: bool,
    pub cors_allowed_origins: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8000);

        let bind_addr = match std::env::var("BIND_ADDR") {
            Ok(v) => v
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid BIND_ADDR: {v}"))?,
            Err(_) => IpAddr::from([0, 0, 0, 0]),
        };

        let meili_url = std::env::var("MEILI_URL")
            .unwrap_or_else(|_| "http://localhost:7700".to_string());
        reqwest::Url::parse(&meili_url)
            .map_err(|err| anyhow::anyhow!("invalid MEILI_URL {meili_url}: {err}"))?;

        let meili_master_key = std::env::var("MEILI_MASTER_KEY")
            .unwrap_or_else(|_| "development_key_please_change_in_production".to_string());

        let products_index =
            std::env::var("PRODUCTS_INDEX").unwrap_or_else(|_| "products".to_string());

        let admin_api_key = std::env::var("ADMIN_API_KEY")
            .ok()
            .filter(|v| !v.is_empty());

        let service_name = std::env::var("SERVICE_NAME")
            .unwrap_or_else(|_| "apollo-tire-search-backend".to_string());

        let request_timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let meili_timeout_secs = std::env::var("MEILI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let max_body_bytes = std::env::var("MAX_BODY_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(16 * 1024 * 1024);

        let max_limit = std::env::var("MAX_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000);

        let max_suggestions = std::env::var("MAX_SUGGESTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(20);

        let max_id_len = std::env::var("MAX_ID_LEN")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(128);

        let similar_cache_capacity = std::env::var("SIMILAR_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1024);

        let similar_cache_ttl_secs = std::env::var("SIMILAR_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);

        let task_wait_timeout_secs = std::env::var("TASK_WAIT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let task_poll_interval_ms = std::env::var("TASK_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);

        let apply_default_settings = std::env::var("APPLY_DEFAULT_SETTINGS")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS").ok();

        Ok(Self {
            port,
            bind_addr,
            meili_url,
            meili_master_key,
            products_index,
            admin_api_key,
            service_name,
            request_timeout_secs,
            meili_timeout_secs,
            max_body_bytes,
            max_limit,
            max_suggestions,
            max_id_len,
            similar_cache_capacity,
            similar_cache_ttl_secs,
            task_wait_timeout_secs,
            task_poll_interval_ms,
            apply_default_settings,
            cors_allowed_origins,
        })
    }
}
