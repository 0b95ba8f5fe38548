//! Shared test infrastructure: in-memory collaborators and app construction
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use menulens_api::db;
use menulens_api::models::Run;
use menulens_api::services::completion::{
    CompletionModel, ImageAttachment, TextCompletionRequest,
};
use menulens_api::services::reviews::UrlResolver;
use menulens_api::services::search::{ReviewSnippet, SearchProvider};
use menulens_api::storage::{ObjectStore, StoredObject};
use menulens_api::AppState;
use menulens_common::{Error, Result};

/// In-memory object store
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(bytes, content_type)| StoredObject {
                bytes: bytes.clone(),
                content_type: content_type.clone(),
            }))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }
}

/// Completion model that replays scripted responses in order and counts calls
#[derive(Default)]
pub struct ScriptedModel {
    vision_responses: Mutex<Vec<Result<String>>>,
    text_responses: Mutex<Vec<Result<String>>>,
    pub vision_calls: AtomicUsize,
    pub text_calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_vision(&self, response: Result<String>) {
        self.vision_responses.lock().unwrap().push(response);
    }

    pub fn push_text(&self, response: Result<String>) {
        self.text_responses.lock().unwrap().push(response);
    }

    pub fn vision_call_count(&self) -> usize {
        self.vision_calls.load(Ordering::SeqCst)
    }

    pub fn text_call_count(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    fn pop(queue: &Mutex<Vec<Result<String>>>) -> Result<String> {
        let mut queue = queue.lock().unwrap();
        if queue.is_empty() {
            return Err(Error::Upstream("no scripted response".to_string()));
        }
        queue.remove(0)
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete_text(&self, _request: TextCompletionRequest) -> Result<String> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        Self::pop(&self.text_responses)
    }

    async fn complete_vision(&self, _prompt: &str, _images: &[ImageAttachment]) -> Result<String> {
        self.vision_calls.fetch_add(1, Ordering::SeqCst);
        Self::pop(&self.vision_responses)
    }
}

/// Search provider with canned responses.
///
/// Image queries return a single derived URL unless overridden; queries in
/// the failing set return an upstream error.
#[derive(Default)]
pub struct StaticSearch {
    images_by_query: Mutex<HashMap<String, Vec<String>>>,
    failing_queries: Mutex<Vec<String>>,
    data_id: Mutex<Option<String>>,
    reviews: Mutex<Vec<ReviewSnippet>>,
    pub image_calls: AtomicUsize,
    pub maps_search_calls: AtomicUsize,
}

impl StaticSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_images(&self, query: &str, urls: Vec<String>) {
        self.images_by_query
            .lock()
            .unwrap()
            .insert(query.to_string(), urls);
    }

    pub fn fail_query(&self, query: &str) {
        self.failing_queries.lock().unwrap().push(query.to_string());
    }

    pub fn set_data_id(&self, data_id: &str) {
        *self.data_id.lock().unwrap() = Some(data_id.to_string());
    }

    pub fn set_reviews(&self, snippets: &[&str]) {
        *self.reviews.lock().unwrap() = snippets
            .iter()
            .map(|s| ReviewSnippet {
                snippet: Some(s.to_string()),
            })
            .collect();
    }

    pub fn image_call_count(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn image_search(&self, query: &str, _count: usize) -> Result<Vec<String>> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_queries.lock().unwrap().iter().any(|q| q == query) {
            return Err(Error::Upstream("search timeout".to_string()));
        }
        if let Some(urls) = self.images_by_query.lock().unwrap().get(query) {
            return Ok(urls.clone());
        }
        Ok(vec![format!(
            "https://images.example/{}.jpg",
            query.replace(' ', "-")
        )])
    }

    async fn maps_search(&self, _query: &str) -> Result<Option<String>> {
        self.maps_search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.data_id.lock().unwrap().clone())
    }

    async fn maps_reviews(&self, _data_id: &str) -> Result<Vec<ReviewSnippet>> {
        Ok(self.reviews.lock().unwrap().clone())
    }
}

/// Resolver that rewrites short links to a fixed target, or passes through
#[derive(Default)]
pub struct StaticResolver {
    target: Mutex<Option<String>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_target(&self, url: &str) {
        *self.target.lock().unwrap() = Some(url.to_string());
    }
}

#[async_trait]
impl UrlResolver for StaticResolver {
    async fn resolve(&self, url: &str) -> Result<String> {
        Ok(self
            .target
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| url.to_string()))
    }
}

/// Fully assembled test application with handles to every mock
pub struct TestContext {
    pub app: Router,
    pub state: AppState,
    pub pool: SqlitePool,
    pub uploads: Arc<MemoryStore>,
    pub model: Arc<ScriptedModel>,
    pub search: Arc<StaticSearch>,
    pub resolver: Arc<StaticResolver>,
}

/// Build the app against an in-memory database, auth disabled
pub async fn test_context() -> TestContext {
    test_context_with_auth(false).await
}

pub async fn test_context_with_auth(auth_enabled: bool) -> TestContext {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    db::init_tables(&pool)
        .await
        .expect("Failed to initialize database schema");

    let uploads = Arc::new(MemoryStore::new());
    let cache_store = Arc::new(MemoryStore::new());
    let model = Arc::new(ScriptedModel::new());
    let search = Arc::new(StaticSearch::new());
    let resolver = Arc::new(StaticResolver::new());

    let state = AppState::new(
        pool.clone(),
        uploads.clone(),
        cache_store,
        model.clone(),
        search.clone(),
        resolver.clone(),
        auth_enabled,
    );
    let app = menulens_api::build_router(state.clone());

    TestContext {
        app,
        state,
        pool,
        uploads,
        model,
        search,
        resolver,
    }
}

/// Build a JSON POST request
pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a GET request
pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Collect a response body as JSON
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    use http_body_util::BodyExt;
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        panic!(
            "response body was not JSON: {} ({})",
            String::from_utf8_lossy(&bytes),
            e
        )
    })
}

/// Poll the run registry until the run reaches a terminal state
pub async fn wait_for_terminal(pool: &SqlitePool, run_id: Uuid) -> Run {
    for _ in 0..200 {
        if let Some(run) = db::runs::get_run(pool, run_id).await.unwrap() {
            if run.status.is_terminal() {
                return run;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("run {} did not reach a terminal state", run_id);
}

/// A menu the scripted vision model can return: two sections, five dishes
pub fn sample_menu_json() -> String {
    serde_json::json!({
        "restaurant_name": "Casa Uno",
        "sections": [
            {
                "name": "Starters",
                "dishes": [
                    {"name": "Spring Rolls", "description": "Crispy", "price": 6.5, "dietary": ["vegetarian"]},
                    {"name": "Satay Skewers", "price": 8.0}
                ]
            },
            {
                "name": "Mains",
                "dishes": [
                    {"name": "Pad Thai", "price": 14.0},
                    {"name": "Green Curry", "price": 15.0, "dietary": ["spicy"]},
                    {"name": "Mango Sticky Rice", "price": 9.0}
                ]
            }
        ]
    })
    .to_string()
}

/// Register an upload set and store matching fake image bytes
pub async fn seeded_run(ctx: &TestContext, count: usize) -> (Uuid, Vec<String>) {
    use tower::util::ServiceExt;

    let content_types: Vec<&str> = (0..count).map(|_| "image/jpeg").collect();
    let response = ctx
        .app
        .clone()
        .oneshot(post_json(
            "/uploads/presign",
            serde_json::json!({"content_types": content_types}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let body = body_json(response).await;
    let run_id: Uuid = body["run_id"].as_str().unwrap().parse().unwrap();
    let keys: Vec<String> = body["keys"]
        .as_array()
        .unwrap()
        .iter()
        .map(|k| k.as_str().unwrap().to_string())
        .collect();

    for key in &keys {
        ctx.uploads
            .put(key, b"\xff\xd8\xff\xe0fake_jpeg".to_vec(), "image/jpeg")
            .await
            .unwrap();
    }

    (run_id, keys)
}
