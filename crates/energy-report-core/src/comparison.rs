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

//! Side-by-side comparison of two report periods.

use std::collections::{BTreeMap, HashMap};

use energy_report_i18n::I18n;

use crate::format::{MISSING, ZERO_EPSILON, format_measure, format_signed};
use crate::metrics::{DEFAULT_CO2_UNIT, MetricCategory, MetricDefinition};
use crate::pdf::TableConfig;
use crate::statistics::StatisticMetadata;
use crate::summary::{ConclusionSummary, ENERGY_UNIT};
use crate::units::normalize_to_kwh;

/// Indicators of the comparison table, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComparisonRow {
    Consumption,
    TotalEstimatedConsumption,
    UntrackedConsumption,
    DeviceConsumption,
    Production,
    Import,
    Export,
    SelfConsumption,
    Expenses,
    Income,
    Co2,
}

impl ComparisonRow {
    pub const ALL: [ComparisonRow; 11] = [
        Self::Consumption,
        Self::TotalEstimatedConsumption,
        Self::UntrackedConsumption,
        Self::DeviceConsumption,
        Self::Production,
        Self::Import,
        Self::Export,
        Self::SelfConsumption,
        Self::Expenses,
        Self::Income,
        Self::Co2,
    ];

    #[must_use]
    pub fn label_key(&self) -> &'static str {
        match self {
            Self::Consumption => "comparison-consumption-label",
            Self::TotalEstimatedConsumption => "comparison-total-estimated-consumption-label",
            Self::UntrackedConsumption => "comparison-untracked-consumption-label",
            Self::DeviceConsumption => "comparison-device-consumption-label",
            Self::Production => "comparison-production-label",
            Self::Import => "comparison-import-label",
            Self::Export => "comparison-export-label",
            Self::SelfConsumption => "comparison-self-consumption-label",
            Self::Expenses => "comparison-expense-label",
            Self::Income => "comparison-income-label",
            Self::Co2 => "comparison-co2-label",
        }
    }

    /// Rows a metric category contributes to
    #[must_use]
    pub fn for_category(category: MetricCategory) -> &'static [ComparisonRow] {
        match category {
            MetricCategory::Device => &[Self::Consumption, Self::DeviceConsumption],
            MetricCategory::BatteryCharge => &[Self::Consumption],
            MetricCategory::Solar => &[Self::Production],
            MetricCategory::GridImport => &[Self::Import],
            MetricCategory::GridExport => &[Self::Export],
            MetricCategory::Cost => &[Self::Expenses],
            MetricCategory::Compensation => &[Self::Income],
            MetricCategory::Co2 => &[Self::Co2],
            MetricCategory::BatteryDischarge | MetricCategory::Gas | MetricCategory::Water => &[],
        }
    }
}

/// Indicator values of one period with their units
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonValues {
    values: BTreeMap<ComparisonRow, f64>,
    units: BTreeMap<ComparisonRow, String>,
}

impl ComparisonValues {
    /// Aggregate metric totals into indicators and inject the energy balance
    #[must_use]
    pub fn collect(
        metrics: &[MetricDefinition],
        totals: &HashMap<String, f64>,
        metadata: &HashMap<String, StatisticMetadata>,
        summary: Option<&ConclusionSummary>,
    ) -> Self {
        let mut collected = Self::default();

        for metric in metrics {
            let Some(total) = totals.get(&metric.statistic_id) else {
                continue;
            };
            let unit = metadata
                .get(&metric.statistic_id)
                .and_then(|meta| meta.unit.as_deref());
            let (value, unit) = if metric.category.is_electric_energy() {
                (normalize_to_kwh(*total, unit), Some(ENERGY_UNIT))
            } else {
                (*total, unit.filter(|u| !u.is_empty()))
            };

            for row in ComparisonRow::for_category(metric.category) {
                *collected.values.entry(*row).or_insert(0.0) += value;
                if let Some(unit) = unit {
                    collected
                        .units
                        .entry(*row)
                        .or_insert_with(|| unit.to_owned());
                }
            }
        }

        if let Some(summary) = summary {
            for (row, value) in [
                (ComparisonRow::SelfConsumption, summary.self_consumption()),
                (
                    ComparisonRow::TotalEstimatedConsumption,
                    summary.total_estimated_consumption,
                ),
                (
                    ComparisonRow::UntrackedConsumption,
                    summary.untracked_consumption,
                ),
            ] {
                collected.values.insert(row, value);
                collected
                    .units
                    .insert(row, summary.energy_unit.to_owned());
            }
        }

        collected
    }

    #[must_use]
    pub fn get(&self, row: ComparisonRow) -> Option<f64> {
        self.values.get(&row).copied()
    }

    #[must_use]
    pub fn unit(&self, row: ComparisonRow) -> Option<&str> {
        self.units.get(&row).map(String::as_str)
    }
}

/// Build the comparison table
///
/// Every indicator is listed; values missing on either side render as a dash.
#[must_use]
pub fn build_comparison_table(
    i18n: &I18n,
    primary: &ComparisonValues,
    reference: &ComparisonValues,
    primary_label: &str,
    reference_label: &str,
) -> TableConfig {
    let rows = ComparisonRow::ALL
        .iter()
        .map(|row| {
            let unit = primary
                .unit(*row)
                .or_else(|| reference.unit(*row))
                .unwrap_or(if *row == ComparisonRow::Co2 {
                    DEFAULT_CO2_UNIT
                } else {
                    ""
                });
            let current = primary.get(*row);
            let previous = reference.get(*row);
            vec![
                i18n.text(row.label_key()),
                format_measure(current.map(sanitize), unit),
                format_measure(previous.map(sanitize), unit),
                format_difference(current, previous, unit),
                format_variation(current, previous),
            ]
        })
        .collect();

    TableConfig {
        title: i18n.text("comparison-table-title"),
        headers: vec![
            i18n.text("comparison-header-category"),
            primary_label.to_owned(),
            reference_label.to_owned(),
            i18n.text("comparison-header-difference"),
            i18n.text("comparison-header-variation"),
        ],
        rows,
        column_weights: Some(vec![3.2, 2.0, 2.0, 2.0, 1.6]),
        emphasize_rows: Vec::new(),
    }
}

fn sanitize(value: f64) -> f64 {
    if value.abs() < ZERO_EPSILON { 0.0 } else { value }
}

fn format_difference(current: Option<f64>, previous: Option<f64>, unit: &str) -> String {
    match (current, previous) {
        (Some(current), Some(previous)) => {
            format_signed(sanitize(sanitize(current) - sanitize(previous)), unit)
        }
        _ => MISSING.to_owned(),
    }
}

fn format_variation(current: Option<f64>, previous: Option<f64>) -> String {
    let (Some(current), Some(previous)) = (current, previous) else {
        return MISSING.to_owned();
    };
    let baseline = sanitize(previous);
    if baseline.abs() < ZERO_EPSILON {
        return MISSING.to_owned();
    }
    let variation = sanitize((sanitize(current) - baseline) / baseline * 100.0);
    format!("{} %", format_signed(variation, ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{SensorSource, SourceSensor};
    use crate::summary::prepare_conclusion_summary;
    use energy_report_i18n::Language;

    fn metrics() -> Vec<MetricDefinition> {
        vec![
            MetricDefinition::counter("solar", MetricCategory::Solar),
            MetricDefinition::counter("import", MetricCategory::GridImport),
            MetricDefinition::counter("fridge", MetricCategory::Device),
            MetricDefinition::counter("bat_in", MetricCategory::BatteryCharge),
            MetricDefinition::sensor(
                &SourceSensor::new(SensorSource::Electricity, "co2"),
                MetricCategory::Co2,
            ),
        ]
    }

    fn totals(values: &[(&str, f64)]) -> HashMap<String, f64> {
        values
            .iter()
            .map(|(id, value)| ((*id).to_owned(), *value))
            .collect()
    }

    fn wh_import() -> HashMap<String, StatisticMetadata> {
        HashMap::from([(
            "import".to_owned(),
            StatisticMetadata {
                statistic_id: "import".to_owned(),
                unit: Some("Wh".to_owned()),
                name: None,
            },
        )])
    }

    #[test]
    fn test_category_mapping() {
        let totals = totals(&[
            ("solar", 5.0),
            ("import", 2000.0),
            ("fridge", 3.0),
            ("bat_in", 1.0),
        ]);
        let values = ComparisonValues::collect(&metrics(), &totals, &wh_import(), None);

        assert_eq!(values.get(ComparisonRow::Consumption), Some(4.0));
        assert_eq!(values.get(ComparisonRow::DeviceConsumption), Some(3.0));
        assert_eq!(values.get(ComparisonRow::Import), Some(2.0));
        assert_eq!(values.unit(ComparisonRow::Import), Some("kWh"));
        assert_eq!(values.get(ComparisonRow::Production), Some(5.0));
        assert_eq!(values.get(ComparisonRow::Co2), None);
        assert_eq!(values.get(ComparisonRow::SelfConsumption), None);
    }

    #[test]
    fn test_summary_values_injected() {
        let metrics = metrics();
        let totals = totals(&[("solar", 5.0), ("import", 2000.0), ("fridge", 3.0)]);
        let metadata = wh_import();
        let summary = prepare_conclusion_summary(&metrics, &totals, &metadata);
        let values = ComparisonValues::collect(&metrics, &totals, &metadata, summary.as_ref());

        assert_eq!(values.get(ComparisonRow::SelfConsumption), Some(5.0));
        assert_eq!(values.get(ComparisonRow::TotalEstimatedConsumption), Some(7.0));
        assert_eq!(values.get(ComparisonRow::UntrackedConsumption), Some(4.0));
    }

    #[test]
    fn test_table_cells() {
        let i18n = I18n::new(Language::English).unwrap();
        let metrics = metrics();
        let primary = ComparisonValues::collect(
            &metrics,
            &totals(&[("solar", 6.0), ("co2", 0.039)]),
            &HashMap::new(),
            None,
        );
        let reference = ComparisonValues::collect(
            &metrics,
            &totals(&[("solar", 4.0), ("co2", 0.0)]),
            &HashMap::new(),
            None,
        );

        let table = build_comparison_table(&i18n, &primary, &reference, "March", "February");
        assert_eq!(table.headers[1], "March");
        assert_eq!(table.rows.len(), ComparisonRow::ALL.len());

        let production = &table.rows[4];
        assert_eq!(production[0], "Production");
        assert_eq!(production[1], "6.00 kWh");
        assert_eq!(production[2], "4.00 kWh");
        assert_eq!(production[3], "+2.00 kWh");
        assert_eq!(production[4], "+50.00 %");

        let co2 = &table.rows[10];
        assert_eq!(co2[1], "0.039 kgCO₂e");
        // zero baseline has no meaningful variation
        assert_eq!(co2[4], MISSING);

        let income = &table.rows[9];
        assert_eq!(income[1], MISSING);
        assert_eq!(income[3], MISSING);
    }
}
