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

//! Data model of the Home Assistant long-term statistics store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bucket granularity requested from the recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticsPeriod {
    Hour,
    Day,
}

impl StatisticsPeriod {
    /// Recorder API name of the period
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }

    /// Translation key of the bucket name
    #[must_use]
    pub fn label_key(&self) -> &'static str {
        match self {
            Self::Hour => "bucket-hour",
            Self::Day => "bucket-day",
        }
    }
}

impl std::fmt::Display for StatisticsPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One statistics bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticRow {
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub state: Option<f64>,
    #[serde(default)]
    pub sum: Option<f64>,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl StatisticRow {
    /// Empty bucket starting at `start`
    #[must_use]
    pub fn at(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: None,
            state: None,
            sum: None,
            change: None,
            mean: None,
            min: None,
            max: None,
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: f64) -> Self {
        self.state = Some(state);
        self
    }

    #[must_use]
    pub fn with_change(mut self, change: f64) -> Self {
        self.change = Some(change);
        self
    }

    #[must_use]
    pub fn with_sum(mut self, sum: f64) -> Self {
        self.sum = Some(sum);
        self
    }
}

/// Metadata attached to a statistic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticMetadata {
    pub statistic_id: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Energy dashboard preferences (`energy/get_prefs`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyPreferences {
    #[serde(default)]
    pub energy_sources: Vec<EnergySource>,
    #[serde(default)]
    pub device_consumption: Vec<DeviceConsumption>,
}

/// One source configured on the energy dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EnergySource {
    Grid {
        #[serde(default)]
        flow_from: Vec<GridImport>,
        #[serde(default)]
        flow_to: Vec<GridExport>,
    },
    Solar {
        stat_energy_from: String,
    },
    /// `stat_energy_from` is the discharge counter, `stat_energy_to` the charge counter
    Battery {
        stat_energy_from: String,
        stat_energy_to: String,
    },
    Gas {
        stat_energy_from: String,
        #[serde(default)]
        stat_cost: Option<String>,
    },
    Water {
        stat_energy_from: String,
        #[serde(default)]
        stat_cost: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridImport {
    pub stat_energy_from: String,
    #[serde(default)]
    pub stat_cost: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridExport {
    pub stat_energy_to: String,
    #[serde(default)]
    pub stat_compensation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConsumption {
    pub stat_consumption: String,
    #[serde(default)]
    pub name: Option<String>,
}
