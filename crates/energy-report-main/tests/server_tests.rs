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

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use energy_report_core::{
    EnergyPreferences, Language, StatisticMetadata, StatisticRow, StatisticsPeriod,
    StatisticsSource,
};
use energy_report_main::server::{self, AppState};
use energy_report_main::{AppConfig, build_generator};
use serde_json::{Value, json};
use tempfile::TempDir;

struct FakeSource {
    prefs: EnergyPreferences,
    healthy: bool,
}

#[async_trait]
impl StatisticsSource for FakeSource {
    async fn statistics_during_period(
        &self,
        statistic_ids: &[String],
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _period: StatisticsPeriod,
    ) -> Result<HashMap<String, Vec<StatisticRow>>> {
        let rows = vec![
            StatisticRow::at(Utc.with_ymd_and_hms(2024, 3, 5, 6, 0, 0).unwrap()).with_change(1.5),
            StatisticRow::at(Utc.with_ymd_and_hms(2024, 3, 5, 18, 0, 0).unwrap()).with_change(2.0),
        ];
        Ok(statistic_ids
            .iter()
            .filter(|id| id.as_str() == "sensor.grid_in")
            .map(|id| (id.clone(), rows.clone()))
            .collect())
    }

    async fn statistics_metadata(
        &self,
        _statistic_ids: &[String],
    ) -> Result<HashMap<String, StatisticMetadata>> {
        Ok(HashMap::new())
    }

    async fn energy_preferences(&self) -> Result<EnergyPreferences> {
        Ok(self.prefs.clone())
    }

    async fn timezone(&self) -> Result<Tz> {
        Ok(chrono_tz::Europe::Brussels)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.healthy)
    }

    fn name(&self) -> &str {
        "fake"
    }
}

fn grid_dashboard() -> EnergyPreferences {
    serde_json::from_value(json!({
        "energy_sources": [
            {"type": "grid", "flow_from": [{"stat_energy_from": "sensor.grid_in"}], "flow_to": []}
        ]
    }))
    .unwrap()
}

/// Start the service on an ephemeral port and return its base URL
async fn start_server(dir: &TempDir, prefs: EnergyPreferences, healthy: bool) -> String {
    let config = AppConfig {
        output_dir: dir.path().display().to_string(),
        language: Language::English,
        ..AppConfig::default()
    };
    let source: Arc<dyn StatisticsSource> = Arc::new(FakeSource { prefs, healthy });
    let generator = Arc::new(build_generator(&config, source.clone()).unwrap());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, AppState { generator, source }));

    format!("http://{addr}")
}

async fn post_generate(base: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{base}/api/generate"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_generate_writes_report() {
    let dir = TempDir::new().unwrap();
    let base = start_server(&dir, grid_dashboard(), true).await;

    let (status, body) =
        post_generate(&base, json!({"start_date": "2024-03-05", "period": "day"})).await;

    assert_eq!(status, 200, "{body}");
    assert_eq!(body["ok"], true);
    assert!(body.get("error").is_none());
    assert_eq!(body["report"]["language"], "en");
    assert_eq!(body["report"]["advice_included"], false);

    let path = body["report"]["path"].as_str().unwrap();
    assert!(path.starts_with(&dir.path().display().to_string()));
    assert!(path.ends_with(".pdf"));
    let bytes = std::fs::read(path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_generate_rejects_reversed_dates() {
    let dir = TempDir::new().unwrap();
    let base = start_server(&dir, grid_dashboard(), true).await;

    let (status, body) = post_generate(
        &base,
        json!({"start_date": "2024-03-10", "end_date": "2024-03-01"}),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("2024-03-10"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_generate_confines_output_dir() {
    let dir = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    let base = start_server(&dir, grid_dashboard(), true).await;

    let escape = outside.path().join("created/by/caller");
    let (status, body) = post_generate(
        &base,
        json!({"start_date": "2024-03-05", "output_dir": escape}),
    )
    .await;
    assert_eq!(status, 400, "{body}");
    assert_eq!(body["ok"], false);
    assert!(!outside.path().join("created").exists());

    let (status, body) =
        post_generate(&base, json!({"start_date": "2024-03-05", "output_dir": "../escape"})).await;
    assert_eq!(status, 400, "{body}");

    let (status, body) =
        post_generate(&base, json!({"start_date": "2024-03-05", "output_dir": "daily"})).await;
    assert_eq!(status, 200, "{body}");
    let path = std::path::PathBuf::from(body["report"]["path"].as_str().unwrap());
    assert_eq!(path.parent(), Some(dir.path().join("daily").as_path()));
}

#[tokio::test]
async fn test_generate_without_metrics() {
    let dir = TempDir::new().unwrap();
    let base = start_server(&dir, EnergyPreferences::default(), true).await;

    let (status, body) = post_generate(&base, json!({"start_date": "2024-03-05"})).await;

    assert_eq!(status, 404);
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn test_generate_rejects_malformed_body() {
    let dir = TempDir::new().unwrap();
    let base = start_server(&dir, grid_dashboard(), true).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/generate"))
        .json(&json!({"start_date": "yesterday"}))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let healthy = start_server(&dir, grid_dashboard(), true).await;
    let degraded = start_server(&dir, grid_dashboard(), false).await;

    let response = reqwest::get(format!("{healthy}/health")).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");

    let response = reqwest::get(format!("{degraded}/health")).await.unwrap();
    assert_eq!(response.status().as_u16(), 503);
}
