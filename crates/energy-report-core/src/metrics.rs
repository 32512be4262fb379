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

//! Which statistics appear in a report and how each one is aggregated.

use std::collections::HashSet;

use energy_report_i18n::I18n;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::statistics::{EnergyPreferences, EnergySource};

/// Unit shown for CO₂ figures whose statistic has no unit
pub const DEFAULT_CO2_UNIT: &str = "kgCO₂e";

/// What a statistic measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Solar,
    GridImport,
    GridExport,
    BatteryCharge,
    BatteryDischarge,
    Device,
    Gas,
    Water,
    Cost,
    Compensation,
    Co2,
}

impl MetricCategory {
    /// Translation key of the category label
    #[must_use]
    pub fn label_key(&self) -> &'static str {
        match self {
            Self::Solar => "metric-solar",
            Self::GridImport => "metric-grid-import",
            Self::GridExport => "metric-grid-export",
            Self::BatteryCharge => "metric-battery-charge",
            Self::BatteryDischarge => "metric-battery-discharge",
            Self::Device => "metric-device",
            Self::Gas => "metric-gas",
            Self::Water => "metric-water",
            Self::Cost => "metric-cost",
            Self::Compensation => "metric-compensation",
            Self::Co2 => "metric-co2",
        }
    }

    /// Electrical energy counters, normalized to kWh
    #[must_use]
    pub fn is_electric_energy(&self) -> bool {
        matches!(
            self,
            Self::Solar
                | Self::GridImport
                | Self::GridExport
                | Self::BatteryCharge
                | Self::BatteryDischarge
                | Self::Device
        )
    }

    /// Monetary categories
    #[must_use]
    pub fn is_monetary(&self) -> bool {
        matches!(self, Self::Cost | Self::Compensation)
    }
}

/// How buckets are reduced to a total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Sum of bucket changes, for cumulative counters
    Change,
    /// Sum of the last state of each day, for sensors that reset daily
    LastStatePerDay,
}

/// Commodity a CO₂ or price sensor refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorSource {
    Electricity,
    ElectricityImport,
    ElectricityExport,
    Gas,
    Water,
    FuelOil,
    Wood,
}

impl SensorSource {
    #[must_use]
    pub fn label_key(&self) -> &'static str {
        match self {
            Self::Electricity => "source-electricity",
            Self::ElectricityImport => "source-electricity-import",
            Self::ElectricityExport => "source-electricity-export",
            Self::Gas => "source-gas",
            Self::Water => "source-water",
            Self::FuelOil => "source-fuel-oil",
            Self::Wood => "source-wood",
        }
    }
}

/// A configured CO₂ or price sensor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSensor {
    pub source: SensorSource,
    pub entity_id: String,
}

impl SourceSensor {
    #[must_use]
    pub fn new(source: SensorSource, entity_id: impl Into<String>) -> Self {
        Self {
            source,
            entity_id: entity_id.into(),
        }
    }
}

/// One statistic shown in the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub statistic_id: String,
    pub category: MetricCategory,
    pub source: Option<SensorSource>,
    pub aggregation: Aggregation,
}

impl MetricDefinition {
    #[must_use]
    pub fn counter(statistic_id: impl Into<String>, category: MetricCategory) -> Self {
        Self {
            statistic_id: statistic_id.into(),
            category,
            source: None,
            aggregation: Aggregation::Change,
        }
    }

    #[must_use]
    pub fn sensor(sensor: &SourceSensor, category: MetricCategory) -> Self {
        Self {
            statistic_id: sensor.entity_id.clone(),
            category,
            source: Some(sensor.source),
            aggregation: Aggregation::LastStatePerDay,
        }
    }

    /// Localized label, e.g. "CO₂ emissions (gas)"
    #[must_use]
    pub fn label(&self, i18n: &I18n) -> String {
        let category = i18n.text(self.category.label_key());
        match self.source {
            Some(source) => format!("{category} ({})", i18n.text(source.label_key())),
            None => category,
        }
    }
}

/// Sensors and toggles that decide which metrics are collected
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricSelection {
    pub co2_sensors: Vec<SourceSensor>,
    pub price_sensors: Vec<SourceSensor>,
    pub co2_enabled: bool,
    pub price_enabled: bool,
}

/// Build the metric list from the energy dashboard and the configured sensors
///
/// Duplicate statistic IDs are dropped, the first occurrence wins.
#[must_use]
pub fn collect_metrics(
    prefs: &EnergyPreferences,
    selection: &MetricSelection,
) -> Vec<MetricDefinition> {
    let mut metrics = Vec::new();
    let with_prices = selection.price_enabled;

    for source in &prefs.energy_sources {
        match source {
            EnergySource::Grid { flow_from, flow_to } => {
                for flow in flow_from {
                    metrics.push(MetricDefinition::counter(
                        &flow.stat_energy_from,
                        MetricCategory::GridImport,
                    ));
                    if let Some(cost) = flow.stat_cost.as_ref().filter(|_| with_prices) {
                        metrics.push(MetricDefinition::counter(cost, MetricCategory::Cost));
                    }
                }
                for flow in flow_to {
                    metrics.push(MetricDefinition::counter(
                        &flow.stat_energy_to,
                        MetricCategory::GridExport,
                    ));
                    if let Some(comp) = flow.stat_compensation.as_ref().filter(|_| with_prices) {
                        metrics.push(MetricDefinition::counter(comp, MetricCategory::Compensation));
                    }
                }
            }
            EnergySource::Solar { stat_energy_from } => {
                metrics.push(MetricDefinition::counter(
                    stat_energy_from,
                    MetricCategory::Solar,
                ));
            }
            EnergySource::Battery {
                stat_energy_from,
                stat_energy_to,
            } => {
                metrics.push(MetricDefinition::counter(
                    stat_energy_to,
                    MetricCategory::BatteryCharge,
                ));
                metrics.push(MetricDefinition::counter(
                    stat_energy_from,
                    MetricCategory::BatteryDischarge,
                ));
            }
            EnergySource::Gas {
                stat_energy_from,
                stat_cost,
            } => {
                metrics.push(MetricDefinition::counter(stat_energy_from, MetricCategory::Gas));
                if let Some(cost) = stat_cost.as_ref().filter(|_| with_prices) {
                    metrics.push(MetricDefinition::counter(cost, MetricCategory::Cost));
                }
            }
            EnergySource::Water {
                stat_energy_from,
                stat_cost,
            } => {
                metrics.push(MetricDefinition::counter(
                    stat_energy_from,
                    MetricCategory::Water,
                ));
                if let Some(cost) = stat_cost.as_ref().filter(|_| with_prices) {
                    metrics.push(MetricDefinition::counter(cost, MetricCategory::Cost));
                }
            }
            EnergySource::Unknown => debug!("Ignoring unsupported energy source type"),
        }
    }

    for device in &prefs.device_consumption {
        metrics.push(MetricDefinition::counter(
            &device.stat_consumption,
            MetricCategory::Device,
        ));
    }

    if selection.co2_enabled {
        for sensor in &selection.co2_sensors {
            metrics.push(MetricDefinition::sensor(sensor, MetricCategory::Co2));
        }
    }

    if selection.price_enabled {
        for sensor in &selection.price_sensors {
            let category = if sensor.source == SensorSource::ElectricityExport {
                MetricCategory::Compensation
            } else {
                MetricCategory::Cost
            };
            metrics.push(MetricDefinition::sensor(sensor, category));
        }
    }

    let mut seen = HashSet::new();
    metrics.retain(|metric| {
        let first = seen.insert(metric.statistic_id.clone());
        if !first {
            debug!("Dropping duplicate statistic {}", metric.statistic_id);
        }
        first
    });
    metrics
}
