use axum::{
    extract::State,
    http::{header::HeaderName, HeaderValue},
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::models::DashboardSnapshot;
use crate::render::render_page;
use crate::AppState;

pub const DATA_SOURCE_HEADER: &str = "x-data-source";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
}

// Latest price, proxied from the backend or synthesized
pub async fn latest_price(State(state): State<AppState>) -> impl IntoResponse {
    let response = state.proxy.latest().await;
    (
        [(
            HeaderName::from_static(DATA_SOURCE_HEADER),
            HeaderValue::from_static(response.source.as_str()),
        )],
        Json(response.body),
    )
}

// Up to ten recent prices, newest first
pub async fn price_list(State(state): State<AppState>) -> impl IntoResponse {
    let response = state.proxy.list().await;
    (
        [(
            HeaderName::from_static(DATA_SOURCE_HEADER),
            HeaderValue::from_static(response.source.as_str()),
        )],
        Json(response.body),
    )
}

pub async fn dashboard_snapshot(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.dashboard.get().await)
}

pub async fn dashboard_page(State(state): State<AppState>) -> Html<String> {
    let snapshot = state.dashboard.get().await;
    Html(render_page(
        &snapshot,
        state.config.poll_interval_secs,
        chrono::Utc::now(),
    ))
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "BTC Price Dashboard is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub fn create_routes(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(dashboard_page))
        .route("/health", get(health_check))
        .route("/api/btc/latest", get(latest_price))
        .route("/api/btc/list", get(price_list))
        .route("/api/btc/dashboard", get(dashboard_snapshot))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(cors))
}
