// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! HTTP surface: report generation and health probing.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use energy_report_core::{
    GeneratedReport, ReportError, ReportGenerator, ReportRequest, StatisticsSource,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<ReportGenerator>,
    pub source: Arc<dyn StatisticsSource>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("generator", &self.generator)
            .field("source", &self.source.name())
            .finish()
    }
}

/// Response body of `POST /api/generate`
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<GeneratedReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/generate", post(generate_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive()) // Allow HA Ingress
        .with_state(state)
}

/// Serve on an already bound listener until Ctrl+C
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr()?;
    info!("🌐 [SERVER] Listening on http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 [SERVER] Stopped");
    Ok(())
}

/// Bind `0.0.0.0:port` and serve
pub async fn run(port: u16, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    serve(listener, state).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠️ [SERVER] Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

fn status_for(error: &ReportError) -> StatusCode {
    match error {
        ReportError::InvalidDateRange { .. }
        | ReportError::InvalidRequest(_)
        | ReportError::Translation(_) => StatusCode::BAD_REQUEST,
        ReportError::NoMetrics | ReportError::MissingStatistics(_) => StatusCode::NOT_FOUND,
        ReportError::SourceUnavailable(_) => StatusCode::BAD_GATEWAY,
        ReportError::Render(_) | ReportError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn generate_handler(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> (StatusCode, Json<GenerateResponse>) {
    info!("📄 [SERVER] Report requested: {request:?}");

    match state.generator.generate(&request).await {
        Ok(report) => (
            StatusCode::OK,
            Json(GenerateResponse {
                ok: true,
                report: Some(report),
                error: None,
            }),
        ),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                error!("❌ [SERVER] Report generation failed: {e}");
            } else {
                warn!("⚠️ [SERVER] Report request rejected: {e}");
            }
            (
                status,
                Json(GenerateResponse {
                    ok: false,
                    report: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.source.health_check().await {
        Ok(true) => (StatusCode::OK, "OK"),
        Ok(false) => (StatusCode::SERVICE_UNAVAILABLE, "DEGRADED"),
        Err(e) => {
            warn!("⚠️ [SERVER] Health check failed: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "ERROR")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_error_status_mapping() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let cases = [
            (ReportError::InvalidDateRange { start: day, end: day }, StatusCode::BAD_REQUEST),
            (ReportError::InvalidRequest("x".to_owned()), StatusCode::BAD_REQUEST),
            (ReportError::NoMetrics, StatusCode::NOT_FOUND),
            (ReportError::MissingStatistics("x".to_owned()), StatusCode::NOT_FOUND),
            (ReportError::SourceUnavailable("x".to_owned()), StatusCode::BAD_GATEWAY),
            (ReportError::Render("x".to_owned()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            assert_eq!(status_for(&error), expected, "{error}");
        }
    }
}
