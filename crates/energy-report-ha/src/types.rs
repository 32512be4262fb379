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

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entity state as returned by `/api/states/<entity_id>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaEntityState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
    #[serde(default)]
    pub last_changed: String,
    #[serde(default)]
    pub last_updated: String,
}

/// Recorder timestamp: epoch milliseconds on current versions, ISO 8601 on older ones
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HaTimestamp {
    Millis(f64),
    Iso(DateTime<Utc>),
}

impl HaTimestamp {
    #[must_use]
    pub fn to_utc(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Millis(ms) if ms.is_finite() => {
                Utc.timestamp_millis_opt(ms.round() as i64).single()
            }
            Self::Millis(_) => None,
            Self::Iso(instant) => Some(instant),
        }
    }
}

/// One bucket of `recorder/statistics_during_period`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaStatisticRow {
    pub start: HaTimestamp,
    #[serde(default)]
    pub end: Option<HaTimestamp>,
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

/// One entry of `recorder/get_statistics_metadata`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaStatisticMetadata {
    pub statistic_id: String,
    #[serde(default)]
    pub statistics_unit_of_measurement: Option<String>,
    #[serde(default)]
    pub display_unit_of_measurement: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl HaStatisticMetadata {
    /// Unit the recorder stores values in
    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        self.statistics_unit_of_measurement
            .as_deref()
            .or(self.display_unit_of_measurement.as_deref())
            .filter(|unit| !unit.is_empty())
    }
}

/// Error body of a failed WebSocket command
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WsErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Any message received on the WebSocket API
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WsMessage {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<WsErrorBody>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub ha_version: Option<String>,
}
