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

//! Energy report generation: date-window arithmetic, statistics aggregation,
//! conclusion/comparison tables and PDF rendering.
//!
//! Everything that talks to Home Assistant sits behind [`StatisticsSource`], so the
//! aggregation rules can be exercised without a running host.

pub mod advisor;
pub mod aggregation;
pub mod comparison;
pub mod error;
pub mod filename;
pub mod format;
pub mod metrics;
pub mod pdf;
pub mod period;
pub mod render;
pub mod report;
pub mod statistics;
pub mod summary;
pub mod traits;
pub mod units;

pub use advisor::OpenAiAdvisor;
pub use error::{ReportError, ReportResult};
pub use metrics::{Aggregation, MetricCategory, MetricDefinition, SensorSource, SourceSensor};
pub use period::{DateWindow, ReportPeriod};
pub use report::{GeneratedReport, ReportGenerator, ReportRequest, ReportSettings};
pub use statistics::{
    EnergyPreferences, EnergySource, StatisticMetadata, StatisticRow, StatisticsPeriod,
};
pub use summary::ConclusionSummary;
pub use traits::{AdviceProvider, StatisticsSource};

pub use energy_report_i18n::Language;
