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

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use energy_report_i18n::Language;

use crate::statistics::{EnergyPreferences, StatisticMetadata, StatisticRow, StatisticsPeriod};

/// Read access to the host's long-term statistics.
///
/// Implementations are expected to batch all requested IDs into one query and return
/// rows ordered by bucket start. IDs without data may be absent from the result map.
#[async_trait]
pub trait StatisticsSource: Send + Sync {
    /// Buckets overlapping `[start, end)` for each statistic
    async fn statistics_during_period(
        &self,
        statistic_ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        period: StatisticsPeriod,
    ) -> Result<HashMap<String, Vec<StatisticRow>>>;

    /// Units and names of the given statistics
    async fn statistics_metadata(
        &self,
        statistic_ids: &[String],
    ) -> Result<HashMap<String, StatisticMetadata>>;

    /// Energy dashboard configuration
    async fn energy_preferences(&self) -> Result<EnergyPreferences>;

    /// Host timezone used to map calendar days onto UTC instants
    async fn timezone(&self) -> Result<Tz>;

    /// Check if the source is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get source name for logging
    fn name(&self) -> &str;
}

/// Produces free-text advice from a report conclusion
#[async_trait]
pub trait AdviceProvider: Send + Sync {
    /// Advice text, or `None` when no advice could be produced
    async fn advise(&self, conclusion: &str, language: Language) -> Option<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
