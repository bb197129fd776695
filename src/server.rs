//! HTTP surface: routing, request instrumentation, and the single mapping
//! from use-case errors to response status codes.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{MatchedPath, Query};
use axum::http::{header, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::{Extension, Form, Router};
use serde::Deserialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::app::service::{ApodService, PictureKind};
use crate::error::AppError;
use crate::metrics::MetricsSink;
use crate::views;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ApodService>,
    pub metrics: Arc<dyn MetricsSink>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Bumps the request counter before routing logic executes.
async fn track_requests<B>(
    Extension(state): Extension<AppState>,
    req: Request<B>,
    next: Next<B>,
) -> Response {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    state.metrics.record_request(req.method().as_str(), &endpoint);
    next.run(req).await
}

async fn home(Extension(state): Extension<AppState>) -> Result<Html<String>, AppError> {
    let favorites = state.service.list_favorites().await?;
    Ok(Html(views::home_page(&favorites)))
}

async fn get_apod(Extension(state): Extension<AppState>) -> Result<Html<String>, AppError> {
    let record = state.service.fetch_daily_picture().await?;
    Ok(Html(views::apod_page(&record)))
}

fn default_kind() -> String {
    "favorites".to_string()
}

#[derive(Deserialize)]
struct PicturesQuery {
    #[serde(rename = "type", default = "default_kind")]
    kind: String,
}

async fn get_pictures(
    Extension(state): Extension<AppState>,
    Query(query): Query<PicturesQuery>,
) -> Result<Html<String>, AppError> {
    let kind = PictureKind::parse(&query.kind)?;
    let pictures = state.service.list_pictures(kind).await?;
    let html = match kind {
        PictureKind::Favorites => views::favorites_page(&pictures),
        PictureKind::LastSeen => views::last_seen_page(&pictures),
    };
    Ok(Html(html))
}

#[derive(Deserialize)]
struct FavoriteForm {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
}

async fn add_favorite(
    Extension(state): Extension<AppState>,
    Form(form): Form<FavoriteForm>,
) -> Result<Response, AppError> {
    state.service.add_favorite(&form.url, &form.title).await?;
    Ok(redirect_to("/favorites"))
}

async fn view_favorites(
    Extension(state): Extension<AppState>,
) -> Result<Html<String>, AppError> {
    let favorites = state.service.list_favorites().await?;
    Ok(Html(views::favorites_page(&favorites)))
}

#[derive(Deserialize)]
struct DeleteLastSeenForm {
    #[serde(default)]
    url: String,
}

async fn delete_last_seen(
    Extension(state): Extension<AppState>,
    Form(form): Form<DeleteLastSeenForm>,
) -> Result<Response, AppError> {
    state.service.delete_last_seen(&form.url).await?;
    Ok(redirect_to("/pictures?type=last_seen"))
}

async fn scrape_metrics(Extension(state): Extension<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
        .into_response()
}

fn redirect_to(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Create the HTTP router with all routes and instrumentation.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(home))
        .route("/apod", get(get_apod))
        .route("/pictures", get(get_pictures))
        .route("/favorites", get(view_favorites).post(add_favorite))
        .route("/last-seen/delete", post(delete_last_seen))
        .route("/metrics", get(scrape_metrics))
        .layer(middleware::from_fn(track_requests))
        .layer(Extension(state))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server on the specified port.
pub async fn serve(state: AppState, port: u16) -> Result<(), hyper::Error> {
    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("HTTP server running on http://{addr}");

    axum::Server::try_bind(&addr)?
        .serve(app.into_make_service())
        .await
}
