//! Monthly report triggers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use common::CustomerId;
use reporting::{BulkReportSummary, ReportMonth};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MonthQuery {
    /// `YYYY-MM`; defaults to the previous month.
    pub month: Option<ReportMonth>,
}

#[derive(Serialize)]
pub struct ReportResponse {
    pub message: String,
    pub sent: bool,
}

#[derive(Serialize)]
pub struct BulkReportResponse {
    pub message: String,
    #[serde(flatten)]
    pub summary: BulkReportSummary,
}

/// POST /api/reports/monthly/{customer_id}?month=YYYY-MM
#[tracing::instrument(skip(state, query))]
pub async fn monthly<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(customer_id): ApiPath<CustomerId>,
    ApiQuery(query): ApiQuery<MonthQuery>,
) -> Result<Json<ReportResponse>, ApiError> {
    let month = query
        .month
        .unwrap_or_else(|| ReportMonth::previous(Utc::now()));
    let sent = state
        .reports
        .send_monthly_report(customer_id, month)
        .await?;

    let message = if sent {
        format!("Monthly report sent successfully for {}", month.long_name())
    } else {
        format!("No report sent for {}", month.long_name())
    };
    Ok(Json(ReportResponse { message, sent }))
}

/// POST /api/reports/trigger-monthly: sends the previous month's reports to
/// every customer.
#[tracing::instrument(skip(state))]
pub async fn trigger_monthly<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<BulkReportResponse>, ApiError> {
    let month = ReportMonth::previous(Utc::now());
    let summary = state.reports.send_bulk_monthly_reports(month).await?;
    Ok(Json(BulkReportResponse {
        message: "Monthly reports triggered successfully".to_string(),
        summary,
    }))
}
