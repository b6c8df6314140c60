//! Read-only HTTP view of the report store.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use recap_core::{ReportStore, StoreError};
use recap_types::DailyReport;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Shared across request handlers
#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<ReportStore>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct DateList {
    dates: Vec<NaiveDate>,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "No reports available"),
            other => {
                tracing::error!("Report read failed: {}", other);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Report store unavailable")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, format!("Invalid date '{raw}', expected YYYY-MM-DD")))
}

/// `GET /report`: today's report
async fn latest_report(State(state): State<ServerState>) -> Result<Json<DailyReport>, ApiError> {
    Ok(Json(state.store.latest().await?))
}

/// `GET /reports`: every date with a report
async fn list_reports(State(state): State<ServerState>) -> Result<Json<DateList>, ApiError> {
    Ok(Json(DateList {
        dates: state.store.dates().await?,
    }))
}

/// `GET /report/:date`
async fn report_for_date(
    State(state): State<ServerState>,
    Path(date): Path<String>,
) -> Result<Json<DailyReport>, ApiError> {
    let date = parse_date(&date)?;
    Ok(Json(state.store.load(date).await?))
}

/// `GET /report/:date/readable`
async fn readable_for_date(
    State(state): State<ServerState>,
    Path(date): Path<String>,
) -> Result<String, ApiError> {
    let date = parse_date(&date)?;
    Ok(state.store.readable(date).await?)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/report", get(latest_report))
        .route("/reports", get(list_reports))
        .route("/report/:date", get(report_for_date))
        .route("/report/:date/readable", get(readable_for_date))
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
}

/// Serve until `cancel` fires
pub async fn start_server(
    addr: SocketAddr,
    state: ServerState,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Report server listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    tracing::info!("Report server stopped");
    Ok(())
}
