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

use chrono::NaiveDate;
use energy_report_i18n::I18nError;
use thiserror::Error;

/// Report generation error types
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No metrics configured: the energy dashboard is empty and no CO₂/price sensors are enabled")]
    NoMetrics,

    #[error("Statistics source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("No statistics available for: {0}")]
    MissingStatistics(String),

    #[error("Failed to render PDF: {0}")]
    Render(String),

    #[error("Translation error: {0}")]
    Translation(#[from] I18nError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    /// Whether the error was caused by the caller's input rather than the host or the filesystem
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDateRange { .. } | Self::InvalidRequest(_) | Self::Translation(_)
        )
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
