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

//! Report generation: request resolution and the fetch → aggregate → render → write flow.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use energy_report_i18n::{I18n, Language};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::aggregation::aggregate;
use crate::error::{ReportError, ReportResult};
use crate::filename::{DEFAULT_FILENAME_PATTERN, build_base_filename, write_unique};
use crate::metrics::{MetricDefinition, MetricSelection, SourceSensor, collect_metrics};
use crate::pdf::load_logo;
use crate::period::{DateWindow, ReportPeriod, resolve_comparison_window, resolve_window, to_local};
use crate::render::{MetricTotal, PeriodReport, ReportContent, render_report};
use crate::statistics::{EnergyPreferences, StatisticMetadata};
use crate::traits::{AdviceProvider, StatisticsSource};

/// Default directory for generated reports, served by the host under `/local/energy_reports`
pub const DEFAULT_OUTPUT_DIR: &str = "/config/www/energy_reports";

/// Parameters of one `generate` call; everything falls back to [`ReportSettings`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub period: Option<String>,
    pub filename: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub language: Option<String>,
    pub dashboard: Option<String>,
    pub co2_enabled: Option<bool>,
    pub price_enabled: Option<bool>,
    pub compare: Option<bool>,
    pub compare_start_date: Option<NaiveDate>,
    pub compare_end_date: Option<NaiveDate>,
}

/// Configured defaults for report generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    pub output_dir: PathBuf,
    pub filename_pattern: String,
    pub default_report_type: ReportPeriod,
    pub language: Language,
    pub dashboard: Option<String>,
    pub co2_enabled: bool,
    pub price_enabled: bool,
    pub co2_sensors: Vec<SourceSensor>,
    pub price_sensors: Vec<SourceSensor>,
    /// Image drawn on the cover page; skipped when missing or unreadable
    pub logo_path: Option<PathBuf>,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            filename_pattern: DEFAULT_FILENAME_PATTERN.to_owned(),
            default_report_type: ReportPeriod::default(),
            language: Language::default(),
            dashboard: None,
            co2_enabled: true,
            price_enabled: true,
            co2_sensors: Vec::new(),
            price_sensors: Vec::new(),
            logo_path: None,
        }
    }
}

/// A request with every default applied and every window computed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub period: ReportPeriod,
    pub window: DateWindow,
    pub comparison_window: Option<DateWindow>,
    pub language: Language,
    pub output_dir: PathBuf,
    pub base_filename: String,
    pub dashboard: Option<String>,
    pub selection: MetricSelection,
}

impl ReportRequest {
    /// Apply `settings` and compute the report windows relative to `today`
    ///
    /// # Errors
    ///
    /// Returns a client error for an unknown period or language, reversed dates or an
    /// empty output directory.
    pub fn resolve(
        &self,
        settings: &ReportSettings,
        today: NaiveDate,
    ) -> ReportResult<ResolvedRequest> {
        let period = match non_empty(self.period.as_deref()) {
            Some(period) => period.parse()?,
            None => settings.default_report_type,
        };
        let language = match non_empty(self.language.as_deref()) {
            Some(code) => Language::from_code(code)?,
            None => settings.language,
        };

        let window = resolve_window(period, self.start_date, self.end_date, today)?;
        let compare = self.compare.unwrap_or(false)
            || self.compare_start_date.is_some()
            || self.compare_end_date.is_some();
        let comparison_window = if compare {
            Some(resolve_comparison_window(
                &window,
                period,
                self.compare_start_date,
                self.compare_end_date,
            )?)
        } else {
            None
        };

        if settings.output_dir.as_os_str().is_empty() {
            return Err(ReportError::InvalidRequest(
                "output_dir must not be empty".to_owned(),
            ));
        }
        let output_dir = match &self.output_dir {
            Some(requested) => confine_output_dir(&settings.output_dir, requested)?,
            None => settings.output_dir.clone(),
        };

        let base_filename = build_base_filename(
            &settings.filename_pattern,
            self.filename.as_deref(),
            language,
            &window,
        );
        let dashboard = non_empty(self.dashboard.as_deref())
            .map(str::to_owned)
            .or_else(|| settings.dashboard.clone());

        Ok(ResolvedRequest {
            period,
            window,
            comparison_window,
            language,
            output_dir,
            base_filename,
            dashboard,
            selection: MetricSelection {
                co2_sensors: settings.co2_sensors.clone(),
                price_sensors: settings.price_sensors.clone(),
                co2_enabled: self.co2_enabled.unwrap_or(settings.co2_enabled),
                price_enabled: self.price_enabled.unwrap_or(settings.price_enabled),
            },
        })
    }
}

/// Directory `requested` resolved inside `base`
///
/// Relative paths are taken from `base`; absolute ones must already lie under it. Only
/// plain path segments are accepted, so `..` can never climb out.
///
/// # Errors
///
/// `ReportError::InvalidRequest` for an empty path, a path outside `base` or one with
/// `..` segments.
pub fn confine_output_dir(base: &Path, requested: &Path) -> ReportResult<PathBuf> {
    if requested.as_os_str().is_empty() {
        return Err(ReportError::InvalidRequest(
            "output_dir must not be empty".to_owned(),
        ));
    }
    let outside = || {
        ReportError::InvalidRequest(format!(
            "output_dir {} is not inside {}",
            requested.display(),
            base.display()
        ))
    };

    let relative = if requested.is_absolute() {
        requested.strip_prefix(base).map_err(|_| outside())?
    } else {
        requested
    };

    let mut confined = base.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => confined.push(segment),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(outside());
            }
        }
    }
    Ok(confined)
}

/// Create `dir` and check that, symlinks resolved, it still lies under `base`
fn create_confined_dir(base: &Path, dir: &Path) -> ReportResult<()> {
    std::fs::create_dir_all(base)?;
    std::fs::create_dir_all(dir)?;
    let base = base.canonicalize()?;
    let resolved = dir.canonicalize()?;
    if resolved.starts_with(&base) {
        Ok(())
    } else {
        Err(ReportError::InvalidRequest(format!(
            "output_dir {} resolves outside {}",
            resolved.display(),
            base.display()
        )))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Outcome of a successful generation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedReport {
    pub path: PathBuf,
    pub window: DateWindow,
    pub comparison_window: Option<DateWindow>,
    /// Metrics that had data in the report window
    pub metrics: Vec<MetricDefinition>,
    pub advice_included: bool,
    pub language: Language,
}

/// Produces report files from a statistics source
pub struct ReportGenerator {
    source: Arc<dyn StatisticsSource>,
    advisor: Option<Arc<dyn AdviceProvider>>,
    settings: ReportSettings,
}

impl std::fmt::Debug for ReportGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportGenerator")
            .field("source", &self.source.name())
            .field("advisor", &self.advisor.as_ref().map(|a| a.name()))
            .field("settings", &self.settings)
            .finish()
    }
}

impl ReportGenerator {
    pub fn new(source: Arc<dyn StatisticsSource>, settings: ReportSettings) -> Self {
        Self {
            source,
            advisor: None,
            settings,
        }
    }

    #[must_use]
    pub fn with_advisor(mut self, advisor: Arc<dyn AdviceProvider>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    #[must_use]
    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    /// Generate a report as of now
    ///
    /// # Errors
    ///
    /// See [`ReportGenerator::generate_at`].
    pub async fn generate(&self, request: &ReportRequest) -> ReportResult<GeneratedReport> {
        self.generate_at(request, Utc::now()).await
    }

    /// Generate a report, treating `now` as the current instant
    ///
    /// # Errors
    ///
    /// Fails on invalid requests, when the statistics source is unreachable, when no
    /// metric is configured or none has data, and on render or write failures.
    pub async fn generate_at(
        &self,
        request: &ReportRequest,
        now: DateTime<Utc>,
    ) -> ReportResult<GeneratedReport> {
        let tz = self.source.timezone().await.map_err(|e| {
            error!("❌ [REPORT] Failed to read timezone from {}: {e:#}", self.source.name());
            ReportError::SourceUnavailable(format!("{e:#}"))
        })?;
        let generated_at = to_local(now, &tz);
        let resolved = request.resolve(&self.settings, generated_at.date())?;

        info!(
            "📄 [REPORT] Generating {} report for {} ({}, tz {tz})",
            resolved.period,
            resolved.window,
            resolved.language.code()
        );

        let prefs = match self.source.energy_preferences().await {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!("⚠️ [REPORT] Energy dashboard unavailable, using sensors only: {e:#}");
                EnergyPreferences::default()
            }
        };
        let metrics = collect_metrics(&prefs, &resolved.selection);
        if metrics.is_empty() {
            return Err(ReportError::NoMetrics);
        }
        debug!("🔍 [REPORT] {} metrics selected", metrics.len());

        let ids: Vec<String> = metrics.iter().map(|m| m.statistic_id.clone()).collect();
        let metadata = match self.source.statistics_metadata(&ids).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("⚠️ [REPORT] Statistics metadata unavailable, units unknown: {e:#}");
                HashMap::new()
            }
        };

        let primary = self
            .collect_period(&metrics, &metadata, resolved.window, &tz)
            .await?;
        if primary.metrics.is_empty() {
            return Err(ReportError::MissingStatistics(ids.join(", ")));
        }
        let comparison = match resolved.comparison_window {
            Some(window) => Some(self.collect_period(&metrics, &metadata, window, &tz).await?),
            None => None,
        };

        let i18n = I18n::new(resolved.language)?;
        let conclusion = primary.conclusion(&i18n);
        let advice = match &self.advisor {
            Some(advisor) => advisor.advise(&conclusion, resolved.language).await,
            None => None,
        };
        if self.advisor.is_some() && advice.is_none() {
            info!("📄 [REPORT] Continuing without advice");
        }

        let report_metrics: Vec<MetricDefinition> =
            primary.metrics.iter().map(|m| m.metric.clone()).collect();
        let advice_included = advice.is_some();
        let content = ReportContent {
            period: resolved.period,
            dashboard: resolved.dashboard.clone(),
            generated_at,
            primary,
            comparison,
            conclusion,
            advice,
            logo: None,
        };

        let root = self.settings.output_dir.clone();
        let output_dir = resolved.output_dir.clone();
        let base = resolved.base_filename.clone();
        let logo_path = self.settings.logo_path.clone();
        let path = tokio::task::spawn_blocking(move || -> ReportResult<PathBuf> {
            let content = ReportContent {
                logo: logo_path.as_deref().and_then(load_logo),
                ..content
            };
            let document = render_report(&content, &i18n)?;
            create_confined_dir(&root, &output_dir)?;
            write_unique(&output_dir, &base, &document.to_bytes())
        })
        .await
        .map_err(|e| ReportError::Render(format!("render task failed: {e}")))??;

        info!("✅ [REPORT] Report written to {}", path.display());
        Ok(GeneratedReport {
            path,
            window: resolved.window,
            comparison_window: resolved.comparison_window,
            metrics: report_metrics,
            advice_included,
            language: resolved.language,
        })
    }

    /// Fetch and aggregate every metric over one window; metrics without data are skipped
    async fn collect_period(
        &self,
        metrics: &[MetricDefinition],
        metadata: &HashMap<String, StatisticMetadata>,
        window: DateWindow,
        tz: &Tz,
    ) -> ReportResult<PeriodReport> {
        let (start, end) = window.utc_bounds(tz);
        let bucket = window.bucket();
        let ids: Vec<String> = metrics.iter().map(|m| m.statistic_id.clone()).collect();
        debug!("🔍 [REPORT] Fetching {} statistics for {window} per {bucket}", ids.len());

        let mut rows = self
            .source
            .statistics_during_period(&ids, start, end, bucket)
            .await
            .map_err(|e| {
                error!("❌ [REPORT] Statistics query failed for {window}: {e:#}");
                ReportError::SourceUnavailable(format!("{e:#}"))
            })?;

        let mut totals = Vec::with_capacity(metrics.len());
        for metric in metrics {
            let series = rows.remove(&metric.statistic_id).unwrap_or_default();
            match aggregate(&series, metric.aggregation, &window, tz) {
                Some(aggregated) => totals.push(MetricTotal {
                    metric: metric.clone(),
                    total: aggregated.total,
                    unit: metadata
                        .get(&metric.statistic_id)
                        .and_then(|m| m.unit.clone()),
                    daily: aggregated.daily,
                }),
                None => warn!(
                    "⚠️ [REPORT] No statistics for {} in {window}, omitted",
                    metric.statistic_id
                ),
            }
        }

        Ok(PeriodReport::new(window, totals, metadata.clone()))
    }
}
