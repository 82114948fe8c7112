#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tire_search::api;
use tire_search::config::Config;
use tire_search::service::SearchService;
use tokio::sync::oneshot;

pub const MASTER_KEY: &str = "test-master-key";

/// In-memory stand-in for the parts of the Meilisearch API the service uses.
#[derive(Default)]
pub struct FakeMeili {
    pub docs: Mutex<Vec<Value>>,
    pub searches: Mutex<Vec<Value>>,
    pub document_fetches: AtomicU64,
    pub settings: Mutex<Vec<Value>>,
    pub tasks: Mutex<HashMap<u64, Value>>,
    next_task: AtomicU64,
    /// Leave new tasks `enqueued` forever.
    pub hold_tasks: AtomicBool,
}

impl FakeMeili {
    pub fn search_count(&self) -> usize {
        self.searches.lock().len()
    }

    pub fn last_search(&self) -> Value {
        self.searches.lock().last().cloned().unwrap_or(Value::Null)
    }

    fn enqueue(&self, kind: &str, details: Value) -> Value {
        let uid = self.next_task.fetch_add(1, Ordering::SeqCst);
        let status = if self.hold_tasks.load(Ordering::SeqCst) {
            "enqueued"
        } else {
            "succeeded"
        };
        self.tasks.lock().insert(
            uid,
            json!({"uid": uid, "status": status, "type": kind, "details": details}),
        );
        json!({"taskUid": uid, "indexUid": "products", "status": "enqueued", "type": kind})
    }
}

pub fn seed_products() -> Vec<Value> {
    vec![
        json!({"id": "RTH1YDLXP1A01", "group": "SCV", "record_type": "Tyre", "ply_rating": "8PR",
               "material": "155/80 D12 8PR LOADSTAR SUPER XP - D", "title": "LOADSTAR SUPER XP",
               "pattern_model": "LOADSTAR SUPER XP", "size": "155/80 D12", "mpn": "RTH1YDLXP1A01"}),
        json!({"id": "RTH1YDLXP1A02", "group": "SCV", "record_type": "Tyre", "ply_rating": "8PR",
               "material": "145/80 D12 8PR LOADSTAR SUPER XP", "title": "loadstar super xp",
               "pattern_model": "LOADSTAR SUPER XP", "size": "145/80 D12", "mpn": "RTH1YDLXP1A02"}),
        json!({"id": "RTH1YDLHD6A01", "group": "SCV", "record_type": "Tyre", "ply_rating": "6PR",
               "material": "145/70 D12 6PR LOADSTAR SUPER HD", "title": "LOADSTAR SUPER HD",
               "pattern_model": "LOADSTAR SUPER HD", "size": "145/70 D12", "mpn": "RTH1YDLHD6A01"}),
        json!({"id": "PCR4GLIFE1", "group": "PCR", "record_type": "Tyre",
               "material": "185/65 R15 AMAZER 4G LIFE", "title": "AMAZER 4G LIFE",
               "pattern_model": "AMAZER 4G LIFE", "size": "185/65 R15", "mpn": "PCR4GLIFE1"}),
        json!({"id": "PCRFLAP15", "group": "PCR", "record_type": "Flaps",
               "material": "FLAP 15 PCR", "title": "FLAP 15", "size": "15", "mpn": "PCRFLAP15"}),
    ]
}

fn meili_error(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({"message": message, "code": code, "type": "invalid_request", "link": ""})),
    )
        .into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {MASTER_KEY}"))
        .unwrap_or(false)
}

fn field_strings(doc: &Value, field: &str) -> Vec<String> {
    match doc.get(field) {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(Value::Number(n)) => vec![n.to_string()],
        _ => Vec::new(),
    }
}

fn matches_query(doc: &Value, q: &str) -> bool {
    let haystack: Vec<String> = doc
        .as_object()
        .map(|o| {
            o.keys()
                .flat_map(|k| field_strings(doc, k))
                .map(|s| s.to_lowercase())
                .collect()
        })
        .unwrap_or_default();
    q.split_whitespace()
        .map(str::to_lowercase)
        .all(|token| haystack.iter().any(|h| h.contains(&token)))
}

/// Supports `field = value`, `field != value` joined by AND/OR (AND binds
/// tighter). Values may be single- or double-quoted.
fn parse_filter(filter: &str) -> Option<Vec<Vec<(String, bool, String)>>> {
    let mut any_of = Vec::new();
    for disjunct in filter.split(" OR ") {
        let mut all_of = Vec::new();
        for clause in disjunct.split(" AND ") {
            let clause = clause.trim();
            let (field, negated, value) = if let Some((f, v)) = clause.split_once("!=") {
                (f, true, v)
            } else if let Some((f, v)) = clause.split_once('=') {
                (f, false, v)
            } else {
                return None;
            };
            let field = field.trim();
            if field.is_empty() || field.contains(' ') {
                return None;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value)
                .replace("\\\"", "\"");
            all_of.push((field.to_string(), negated, value));
        }
        any_of.push(all_of);
    }
    Some(any_of)
}

fn matches_filter(doc: &Value, filter: &[Vec<(String, bool, String)>]) -> bool {
    filter.iter().any(|all_of| {
        all_of.iter().all(|(field, negated, value)| {
            let hit = field_strings(doc, field).iter().any(|v| v == value);
            hit != *negated
        })
    })
}

async fn search(
    State(fake): State<Arc<FakeMeili>>,
    Path(_index): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    fake.searches.lock().push(body.clone());

    let q = body["q"].as_str().unwrap_or("").to_string();
    let limit = body["limit"].as_u64().unwrap_or(20) as usize;
    let offset = body["offset"].as_u64().unwrap_or(0) as usize;
    let filter = match body["filter"].as_str() {
        Some(raw) => match parse_filter(raw) {
            Some(f) => Some(f),
            None => {
                return meili_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_search_filter",
                    "Was expecting an operation",
                )
            }
        },
        None => None,
    };

    let docs = fake.docs.lock().clone();
    let matched: Vec<Value> = docs
        .into_iter()
        .filter(|d| matches_query(d, &q))
        .filter(|d| filter.as_ref().map_or(true, |f| matches_filter(d, f)))
        .collect();

    let retrieve: Option<Vec<String>> = body["attributesToRetrieve"].as_array().map(|a| {
        a.iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    });
    let hits: Vec<Value> = matched
        .iter()
        .skip(offset)
        .take(limit)
        .map(|d| match &retrieve {
            Some(fields) => {
                let mut out = Map::new();
                for f in fields {
                    if let Some(v) = d.get(f) {
                        out.insert(f.clone(), v.clone());
                    }
                }
                Value::Object(out)
            }
            None => d.clone(),
        })
        .collect();

    let mut response = json!({
        "hits": hits,
        "query": q,
        "processingTimeMs": 1,
        "limit": limit,
        "offset": offset,
        "estimatedTotalHits": matched.len(),
    });

    if let Some(facets) = body["facets"].as_array() {
        let mut distribution = Map::new();
        for facet in facets.iter().filter_map(|f| f.as_str()) {
            let mut counts = Map::new();
            for doc in &matched {
                for value in field_strings(doc, facet) {
                    let n = counts.get(&value).and_then(|v| v.as_u64()).unwrap_or(0);
                    counts.insert(value, json!(n + 1));
                }
            }
            distribution.insert(facet.to_string(), Value::Object(counts));
        }
        response["facetDistribution"] = Value::Object(distribution);
    }

    Json(response).into_response()
}

async fn get_document(
    State(fake): State<Arc<FakeMeili>>,
    Path((_index, id)): Path<(String, String)>,
) -> Response {
    fake.document_fetches.fetch_add(1, Ordering::SeqCst);
    let doc = fake
        .docs
        .lock()
        .iter()
        .find(|d| d["id"].as_str() == Some(id.as_str()))
        .cloned();
    match doc {
        Some(doc) => Json(doc).into_response(),
        None => meili_error(
            StatusCode::NOT_FOUND,
            "document_not_found",
            &format!("Document `{id}` not found."),
        ),
    }
}

async fn add_documents(
    State(fake): State<Arc<FakeMeili>>,
    Path(_index): Path<String>,
    Json(body): Json<Vec<Value>>,
) -> Response {
    let received = body.len();
    {
        let mut docs = fake.docs.lock();
        for doc in body {
            docs.retain(|d| d["id"] != doc["id"]);
            docs.push(doc);
        }
    }
    let task = fake.enqueue(
        "documentAdditionOrUpdate",
        json!({"receivedDocuments": received, "indexedDocuments": received}),
    );
    (StatusCode::ACCEPTED, Json(task)).into_response()
}

async fn update_settings(
    State(fake): State<Arc<FakeMeili>>,
    Path(_index): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    fake.settings.lock().push(body.clone());
    let task = fake.enqueue("settingsUpdate", body);
    (StatusCode::ACCEPTED, Json(task)).into_response()
}

async fn stats(State(fake): State<Arc<FakeMeili>>, Path(_index): Path<String>) -> Response {
    let n = fake.docs.lock().len();
    Json(json!({"numberOfDocuments": n, "isIndexing": false, "fieldDistribution": {}}))
        .into_response()
}

async fn get_task(State(fake): State<Arc<FakeMeili>>, Path(uid): Path<u64>) -> Response {
    match fake.tasks.lock().get(&uid).cloned() {
        Some(task) => Json(task).into_response(),
        None => meili_error(StatusCode::NOT_FOUND, "task_not_found", "Task not found."),
    }
}

async fn require_key(
    headers: HeaderMap,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    if req.uri().path() != "/health" && !authorized(&headers) {
        return meili_error(
            StatusCode::UNAUTHORIZED,
            "missing_authorization_header",
            "The Authorization header is missing.",
        );
    }
    next.run(req).await
}

pub async fn start_fake_meili(docs: Vec<Value>) -> (String, Arc<FakeMeili>, oneshot::Sender<()>) {
    let fake = Arc::new(FakeMeili::default());
    *fake.docs.lock() = docs;

    let app = Router::new()
        .route("/health", get(|| async { Json(json!({"status": "available"})) }))
        .route(
            "/version",
            get(|| async {
                Json(json!({"pkgVersion": "1.8.0", "commitSha": "test", "commitDate": "test"}))
            }),
        )
        .route("/indexes/:index/search", post(search))
        .route("/indexes/:index/documents", post(add_documents))
        .route("/indexes/:index/documents/:id", get(get_document))
        .route(
            "/indexes/:index/settings",
            axum::routing::patch(update_settings),
        )
        .route("/indexes/:index/stats", get(stats))
        .route("/tasks/:uid", get(get_task))
        .layer(axum::middleware::from_fn(require_key))
        .with_state(fake.clone());

    let (base, tx) = serve(app).await;
    (base, fake, tx)
}

async fn serve(app: Router) -> (String, oneshot::Sender<()>) {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{}", addr), tx)
}

pub fn base_test_config(meili_url: &str) -> Config {
    Config {
        port: 0,
        bind_addr: "127.0.0.1".parse().unwrap(),
        meili_url: meili_url.to_string(),
        meili_master_key: MASTER_KEY.to_string(),
        products_index: "products".to_string(),
        admin_api_key: None,
        service_name: "apollo-tire-search-backend".to_string(),
        request_timeout_secs: 30,
        meili_timeout_secs: 5,
        max_body_bytes: 1_048_576,
        max_limit: 1000,
        max_suggestions: 20,
        max_id_len: 128,
        similar_cache_capacity: 64,
        similar_cache_ttl_secs: 300,
        task_wait_timeout_secs: 5,
        task_poll_interval_ms: 10,
        apply_default_settings: false,
        cors_allowed_origins: None,
    }
}

pub async fn start_app(config: Config) -> (String, oneshot::Sender<()>) {
    let service = SearchService::new(config).unwrap();
    serve(api::router(service)).await
}

pub struct TestApp {
    pub base: String,
    pub fake: Arc<FakeMeili>,
    pub client: reqwest::Client,
    _shutdown: Vec<oneshot::Sender<()>>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn get_json(&self, path: &str) -> (reqwest::StatusCode, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status();
        let body = resp.json().await.unwrap_or(Value::Null);
        (status, body)
    }
}

pub async fn spawn_with(docs: Vec<Value>, tweak: impl FnOnce(&mut Config)) -> TestApp {
    let (meili_base, fake, meili_tx) = start_fake_meili(docs).await;
    let mut config = base_test_config(&meili_base);
    tweak(&mut config);
    let (base, app_tx) = start_app(config).await;
    TestApp {
        base,
        fake,
        client: reqwest::Client::new(),
        _shutdown: vec![app_tx, meili_tx],
    }
}

pub async fn spawn() -> TestApp {
    spawn_with(seed_products(), |_| {}).await
}
