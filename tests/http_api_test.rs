//! End-to-end tests against the router, with in-memory collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use apod_web::app::ports::{DocumentStore, NotificationPublisher, PictureProvider};
use apod_web::app::service::ApodService;
use apod_web::error::{FetchError, StoreError};
use apod_web::metrics::MetricsSink;
use apod_web::server::{create_router, AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use mongodb::bson::{doc, Document};
use serde_json::{json, Value};
use tower::ServiceExt;

#[derive(Default)]
struct FakeStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    find_calls: AtomicUsize,
    projections: Mutex<Vec<(String, Document)>>,
    fail: bool,
}

impl FakeStore {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn docs(&self, collection: &str) -> Vec<Document> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn find(
        &self,
        collection: &str,
        _filter: Document,
        projection: Document,
    ) -> Result<Vec<Document>, StoreError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.projections
            .lock()
            .unwrap()
            .push((collection.to_string(), projection));
        if self.fail {
            return Err(StoreError::Other("store is down".into()));
        }
        Ok(self.docs(collection))
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::Other("store is down".into()));
        }
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(doc);
        Ok(())
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<(), StoreError> {
        if self.fail {
            return Err(StoreError::Other("store is down".into()));
        }
        let mut collections = self.collections.lock().unwrap();
        if let Some(docs) = collections.get_mut(collection) {
            if let Some(pos) = docs
                .iter()
                .position(|d| filter.iter().all(|(key, value)| d.get(key) == Some(value)))
            {
                docs.remove(pos);
            }
        }
        Ok(())
    }
}

struct StubProvider {
    response: Result<Value, FetchError>,
}

impl StubProvider {
    fn ok() -> Self {
        Self {
            response: Ok(json!({
                "url": "http://img/today.jpg",
                "title": "Today",
                "explanation": "A picture",
                "media_type": "image"
            })),
        }
    }

    fn timing_out() -> Self {
        Self {
            response: Err(FetchError::Timeout),
        }
    }
}

#[async_trait]
impl PictureProvider for StubProvider {
    async fn fetch_daily(&self) -> Result<Value, FetchError> {
        self.response.clone()
    }
}

#[derive(Default)]
struct RecordingPublisher {
    topics: Mutex<Vec<String>>,
    messages: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl NotificationPublisher for RecordingPublisher {
    async fn ensure_topic(&self, topic: &str) {
        self.topics.lock().unwrap().push(topic.to_string());
    }

    async fn publish(&self, topic: &str, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((topic.to_string(), message.to_string()));
    }
}

#[derive(Default)]
struct FakeMetrics {
    requests: Mutex<Vec<(String, String)>>,
    in_flight: AtomicI64,
}

impl MetricsSink for FakeMetrics {
    fn record_request(&self, method: &str, endpoint: &str) {
        self.requests
            .lock()
            .unwrap()
            .push((method.to_string(), endpoint.to_string()));
    }

    fn fetch_started(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
    }

    fn fetch_finished(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn render(&self) -> String {
        "apod_requests_total{method=\"GET\",endpoint=\"/metrics\"} 1\n".to_string()
    }
}

struct TestApp {
    router: Router,
    store: Arc<FakeStore>,
    publisher: Arc<RecordingPublisher>,
    metrics: Arc<FakeMetrics>,
}

fn test_app(store: FakeStore, provider: StubProvider) -> TestApp {
    let store = Arc::new(store);
    let publisher = Arc::new(RecordingPublisher::default());
    let metrics = Arc::new(FakeMetrics::default());
    let service = Arc::new(ApodService::new(
        Arc::new(provider),
        store.clone(),
        publisher.clone(),
        metrics.clone(),
    ));
    let router = create_router(AppState {
        service,
        metrics: metrics.clone(),
    });
    TestApp {
        router,
        store,
        publisher,
        metrics,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn form_post(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn invalid_pictures_type_is_rejected_before_any_store_read() {
    let app = test_app(FakeStore::default(), StubProvider::ok());

    let response = app.router.clone().oneshot(get("/pictures?type=bogus")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Invalid data type. Use \"favorites\" or \"last_seen\"." })
    );
    assert_eq!(app.store.find_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn pictures_defaults_to_favorites() {
    let app = test_app(FakeStore::default(), StubProvider::ok());
    app.store
        .insert_one("favorites", doc! { "url": "http://x/a.jpg", "title": "A" })
        .await
        .unwrap();

    let response = app.router.clone().oneshot(get("/pictures")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("http://x/a.jpg"));
    assert_eq!(app.store.find_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn picture_reads_project_out_the_internal_id() {
    let app = test_app(FakeStore::default(), StubProvider::ok());

    app.router
        .clone()
        .oneshot(get("/pictures?type=favorites"))
        .await
        .unwrap();
    app.router
        .clone()
        .oneshot(get("/pictures?type=last_seen"))
        .await
        .unwrap();

    let projections = app.store.projections.lock().unwrap().clone();
    let collections: Vec<&str> = projections.iter().map(|(c, _)| c.as_str()).collect();
    assert_eq!(collections, vec!["favorites", "last_seen"]);
    for (_, projection) in &projections {
        assert_eq!(projection.get_i32("_id").unwrap(), 0);
    }
}

#[tokio::test]
async fn adding_a_favorite_persists_notifies_and_redirects() {
    let app = test_app(FakeStore::default(), StubProvider::ok());

    let response = app
        .router
        .clone()
        .oneshot(form_post(
            "/favorites",
            "url=http%3A%2F%2Fx%2Fimg.jpg&title=Nebula",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/favorites");
    assert_eq!(
        app.store.docs("favorites"),
        vec![doc! { "url": "http://x/img.jpg", "title": "Nebula" }]
    );
    assert_eq!(*app.publisher.topics.lock().unwrap(), vec!["favorites"]);
    assert_eq!(
        *app.publisher.messages.lock().unwrap(),
        vec![("favorites".to_string(), "Added favorite: Nebula".to_string())]
    );
}

#[tokio::test]
async fn adding_a_favorite_without_a_title_is_rejected() {
    let app = test_app(FakeStore::default(), StubProvider::ok());

    let response = app
        .router
        .clone()
        .oneshot(form_post("/favorites", "url=http%3A%2F%2Fx%2Fimg.jpg"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "No picture data provided" })
    );
    assert!(app.store.docs("favorites").is_empty());
}

#[tokio::test]
async fn fetching_the_daily_picture_appends_to_last_seen() {
    let app = test_app(FakeStore::default(), StubProvider::ok());

    let response = app.router.clone().oneshot(get("/apod")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Today"));
    assert_eq!(app.store.docs("last_seen").len(), 1);
    assert_eq!(app.metrics.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn provider_timeout_surfaces_as_500_and_stores_nothing() {
    let app = test_app(FakeStore::default(), StubProvider::timing_out());

    let response = app.router.clone().oneshot(get("/apod")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("timed out"));
    assert!(app.store.docs("last_seen").is_empty());
    assert_eq!(app.metrics.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn home_reports_store_failures_as_500() {
    let app = test_app(FakeStore::failing(), StubProvider::ok());

    let response = app.router.clone().oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Failed to load favorites. Please try again later." })
    );
}

#[tokio::test]
async fn deleting_an_unknown_last_seen_url_still_redirects() {
    let app = test_app(FakeStore::default(), StubProvider::ok());

    let response = app
        .router
        .clone()
        .oneshot(form_post("/last-seen/delete", "url=http%3A%2F%2Fnowhere"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn deleting_a_last_seen_entry_removes_exactly_one_document() {
    let app = test_app(FakeStore::default(), StubProvider::ok());
    for _ in 0..2 {
        app.store
            .insert_one("last_seen", doc! { "url": "http://x/a.jpg" })
            .await
            .unwrap();
    }

    let response = app
        .router
        .clone()
        .oneshot(form_post("/last-seen/delete", "url=http%3A%2F%2Fx%2Fa.jpg"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(app.store.docs("last_seen").len(), 1);
}

#[tokio::test]
async fn every_request_bumps_the_counter_with_method_and_route() {
    let app = test_app(FakeStore::default(), StubProvider::ok());

    app.router.clone().oneshot(get("/")).await.unwrap();
    app.router
        .clone()
        .oneshot(form_post("/favorites", "url=u&title=t"))
        .await
        .unwrap();

    let requests = app.metrics.requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec![
            ("GET".to_string(), "/".to_string()),
            ("POST".to_string(), "/favorites".to_string()),
        ]
    );
}

#[tokio::test]
async fn metrics_endpoint_serves_the_exposition_text() {
    let app = test_app(FakeStore::default(), StubProvider::ok());

    let response = app.router.clone().oneshot(get("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let body = body_text(response).await;
    assert!(body.contains("apod_requests_total"));
}
