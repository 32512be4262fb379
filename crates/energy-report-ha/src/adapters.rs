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

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use energy_report_core::{
    EnergyPreferences, StatisticMetadata, StatisticRow, StatisticsPeriod, StatisticsSource,
};
use tracing::{debug, info, warn};

use crate::client::HomeAssistantClient;
use crate::types::HaStatisticRow;

/// Home Assistant adapter implementing `StatisticsSource`
#[derive(Debug, Clone)]
pub struct HaStatisticsAdapter {
    client: Arc<HomeAssistantClient>,
}

impl HaStatisticsAdapter {
    pub fn new(client: Arc<HomeAssistantClient>) -> Self {
        Self { client }
    }

    /// Get reference to the underlying HA client
    pub fn client(&self) -> &Arc<HomeAssistantClient> {
        &self.client
    }
}

fn convert_row(statistic_id: &str, row: HaStatisticRow) -> Option<StatisticRow> {
    let Some(start) = row.start.to_utc() else {
        warn!(
            "⚠️ [ADAPTER] Dropping bucket of {} with invalid start {:?}",
            statistic_id, row.start
        );
        return None;
    };
    Some(StatisticRow {
        start,
        end: row.end.and_then(|end| end.to_utc()),
        state: row.state,
        sum: row.sum,
        change: row.change,
        mean: row.mean,
        min: row.min,
        max: row.max,
    })
}

#[async_trait]
impl StatisticsSource for HaStatisticsAdapter {
    async fn statistics_during_period(
        &self,
        statistic_ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        period: StatisticsPeriod,
    ) -> Result<HashMap<String, Vec<StatisticRow>>> {
        if statistic_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let raw = self
            .client
            .statistics_during_period(statistic_ids, start, end, period.as_str())
            .await
            .context("Failed to query recorder statistics")?;

        let mut statistics = HashMap::with_capacity(raw.len());
        for (statistic_id, rows) in raw {
            let mut converted: Vec<StatisticRow> = rows
                .into_iter()
                .filter_map(|row| convert_row(&statistic_id, row))
                .collect();
            converted.sort_by_key(|row| row.start);
            debug!("📊 [ADAPTER] {} = {} buckets", statistic_id, converted.len());
            statistics.insert(statistic_id, converted);
        }
        Ok(statistics)
    }

    async fn statistics_metadata(
        &self,
        statistic_ids: &[String],
    ) -> Result<HashMap<String, StatisticMetadata>> {
        if statistic_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let raw = self
            .client
            .statistics_metadata(statistic_ids)
            .await
            .context("Failed to read statistics metadata")?;

        Ok(raw
            .into_iter()
            .map(|entry| {
                let metadata = StatisticMetadata {
                    statistic_id: entry.statistic_id.clone(),
                    unit: entry.unit().map(str::to_owned),
                    name: entry.name.clone(),
                };
                (entry.statistic_id, metadata)
            })
            .collect())
    }

    async fn energy_preferences(&self) -> Result<EnergyPreferences> {
        match self.client.energy_prefs().await {
            Ok(raw) if raw.is_null() => Ok(EnergyPreferences::default()),
            Ok(raw) => {
                let prefs: EnergyPreferences =
                    serde_json::from_value(raw).context("Malformed energy dashboard preferences")?;
                info!(
                    "⚡ [ADAPTER] Energy dashboard: {} sources, {} devices",
                    prefs.energy_sources.len(),
                    prefs.device_consumption.len()
                );
                Ok(prefs)
            }
            Err(e) if e.is_not_found() => {
                info!("⚡ [ADAPTER] Energy dashboard is not configured");
                Ok(EnergyPreferences::default())
            }
            Err(e) => Err(e).context("Failed to read energy dashboard preferences"),
        }
    }

    async fn timezone(&self) -> Result<Tz> {
        let name = self
            .client
            .get_timezone()
            .await
            .context("Failed to read Home Assistant timezone")?;
        name.parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Unknown timezone '{name}': {e}"))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.client.ping().await?)
    }

    fn name(&self) -> &str {
        "Home Assistant"
    }
}
