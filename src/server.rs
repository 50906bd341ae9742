//! HTTP surface of the dashboard.
//!
//! Every request re-runs the pipeline against the cached dataset:
//! - `GET /`: HTML page
//! - `GET /api/dashboard`: the same view as JSON
//! - `GET /health`: liveness check

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::dashboard::{DashboardView, WidgetInput, build_view};
use crate::data_ingestion::DatasetCache;
use crate::error::DashboardError;
use crate::render::render_page;

type AppState = Arc<DatasetCache>;

type QueryPairs = Query<Vec<(String, String)>>;

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match self {
            DashboardError::InvalidDate(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self, "dashboard request failed");
        }
        (status, self.to_string()).into_response()
    }
}

/// Bind `host:port` and serve until the process is stopped.
pub async fn serve(
    cache: Arc<DatasetCache>,
    host: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let addr = listener.local_addr()?;
    info!(%addr, "dashboard listening");
    axum::serve(listener, router(cache)).await?;
    Ok(())
}

/// Build the axum router (separated for testing).
pub fn router(cache: Arc<DatasetCache>) -> Router {
    Router::new()
        .route("/", get(page))
        .route("/api/dashboard", get(api_dashboard))
        .route("/health", get(health))
        .with_state(cache)
}

fn view_for(
    cache: &DatasetCache,
    pairs: Vec<(String, String)>,
) -> Result<DashboardView, DashboardError> {
    let dataset = cache.get()?;
    let selection = WidgetInput::from_query_pairs(pairs).resolve(dataset.date_bounds())?;
    build_view(&dataset, selection)
}

async fn page(
    State(cache): State<AppState>,
    Query(pairs): QueryPairs,
) -> Result<Html<String>, DashboardError> {
    let view = view_for(&cache, pairs)?;
    Ok(Html(render_page(&view)?))
}

async fn api_dashboard(
    State(cache): State<AppState>,
    Query(pairs): QueryPairs,
) -> Result<Json<DashboardView>, DashboardError> {
    Ok(Json(view_for(&cache, pairs)?))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::test_utils::sample_sources;

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn app() -> (tempfile::TempDir, Router) {
        let (dir, sources) = sample_sources();
        (dir, router(Arc::new(DatasetCache::new(sources))))
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, app) = app();
        let (status, _) = get_body(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_page_renders_defaults() {
        let (_dir, app) = app();
        let (status, body) = get_body(app, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Total de Pedidos"));
        assert!(body.contains("<div class=\"value\">3</div>"));
    }

    #[tokio::test]
    async fn test_api_filters_by_state() {
        let (_dir, app) = app();
        let (status, body) = get_body(app, "/api/dashboard?states=RJ").await;
        assert_eq!(status, StatusCode::OK);

        let view: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(view["metrics"]["total_orders"], 1);
        assert_eq!(view["metrics"]["unique_customers"], 1);
        assert_eq!(view["orders_by_state"][0]["state"], "RJ");
        assert_eq!(view["orders_by_state"][0]["orders"], 1);
        assert_eq!(view["selection"]["start"], "2017-01-05");
    }

    #[tokio::test]
    async fn test_api_repeated_states_and_dates() {
        let (_dir, app) = app();
        let (_, body) = get_body(
            app,
            "/api/dashboard?states=SP&states=RJ&start=2017-01-20&end=2017-03-20",
        )
        .await;

        let view: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(view["metrics"]["total_orders"], 2);
        assert_eq!(view["monthly_orders"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_api_submitted_without_states_is_empty() {
        let (_dir, app) = app();
        let (_, body) = get_body(app, "/api/dashboard?submitted=1").await;

        let view: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(view["metrics"]["total_orders"], 0);
        assert_eq!(view["metrics"]["unique_customers"], 0);
    }

    #[tokio::test]
    async fn test_cleared_start_date_uses_dataset_minimum() {
        let (_dir, app) = app();
        let (status, body) =
            get_body(app, "/?submitted=1&states=Todos&start=&end=2017-03-20").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("name=\"start\" value=\"2017-01-05\""));
        assert!(body.contains("<div class=\"value\">3</div>"));
    }

    #[tokio::test]
    async fn test_invalid_date_is_bad_request() {
        let (_dir, app) = app();
        let (status, body) = get_body(app, "/?start=not-a-date").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("not-a-date"));
    }

    #[tokio::test]
    async fn test_missing_data_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let sources = crate::data_ingestion::DataSources {
            orders: dir.path().join("orders.csv"),
            customers: dir.path().join("customers.csv"),
        };
        let app = router(Arc::new(DatasetCache::new(sources)));

        let (status, _) = get_body(app, "/api/dashboard").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
