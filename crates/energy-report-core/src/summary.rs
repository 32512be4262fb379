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

//! Energy balance of a period and the localized conclusion paragraph.

use std::collections::{BTreeMap, HashMap};

use energy_report_i18n::I18n;
use serde::Serialize;

use crate::format::{format_date, format_fixed, format_measure};
use crate::metrics::{DEFAULT_CO2_UNIT, MetricCategory, MetricDefinition};
use crate::period::DateWindow;
use crate::statistics::StatisticMetadata;
use crate::units::normalize_to_kwh;

pub const ENERGY_UNIT: &str = "kWh";

/// Energy balance of one period, all values in kWh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConclusionSummary {
    pub production: f64,
    pub imported: f64,
    pub exported: f64,
    pub consumption: f64,
    pub charge: f64,
    pub discharge: f64,
    pub direct: f64,
    pub indirect: f64,
    pub total_estimated_consumption: f64,
    pub untracked_consumption: f64,
    pub energy_unit: &'static str,
    pub formatted: BTreeMap<&'static str, String>,
}

impl ConclusionSummary {
    /// Solar energy used on site, directly or through the battery
    #[must_use]
    pub fn self_consumption(&self) -> f64 {
        self.direct + self.indirect
    }
}

/// Compute the energy balance from per-statistic totals
///
/// Returns `None` when no electrical energy metric has a total.
#[must_use]
pub fn prepare_conclusion_summary(
    metrics: &[MetricDefinition],
    totals: &HashMap<String, f64>,
    metadata: &HashMap<String, StatisticMetadata>,
) -> Option<ConclusionSummary> {
    let mut production = 0.0;
    let mut imported = 0.0;
    let mut exported = 0.0;
    let mut consumption = 0.0;
    let mut charge = 0.0;
    let mut discharge = 0.0;
    let mut found = false;

    for metric in metrics {
        if !metric.category.is_electric_energy() {
            continue;
        }
        let Some(total) = totals.get(&metric.statistic_id) else {
            continue;
        };
        let unit = metadata
            .get(&metric.statistic_id)
            .and_then(|meta| meta.unit.as_deref());
        let value = normalize_to_kwh(*total, unit);
        found = true;

        match metric.category {
            MetricCategory::Solar => production += value,
            MetricCategory::GridImport => imported += value,
            MetricCategory::GridExport => exported += value,
            MetricCategory::Device => consumption += value,
            MetricCategory::BatteryCharge => charge += value,
            MetricCategory::BatteryDischarge => discharge += value,
            MetricCategory::Gas
            | MetricCategory::Water
            | MetricCategory::Cost
            | MetricCategory::Compensation
            | MetricCategory::Co2 => {}
        }
    }

    if !found {
        return None;
    }

    let direct = (production - exported - charge).max(0.0);
    let indirect = discharge;
    let total_estimated_consumption = imported + direct + indirect;
    let untracked_consumption = (total_estimated_consumption - consumption).max(0.0);

    let formatted = [
        ("production", production),
        ("imported", imported),
        ("exported", exported),
        ("consumption", consumption),
        ("charge", charge),
        ("discharge", discharge),
        ("direct", direct),
        ("indirect", indirect),
        ("total_estimated_consumption", total_estimated_consumption),
        ("untracked_consumption", untracked_consumption),
    ]
    .into_iter()
    .map(|(key, value)| (key, format_fixed(value, ENERGY_UNIT)))
    .collect();

    Some(ConclusionSummary {
        production,
        imported,
        exported,
        consumption,
        charge,
        discharge,
        direct,
        indirect,
        total_estimated_consumption,
        untracked_consumption,
        energy_unit: ENERGY_UNIT,
        formatted,
    })
}

/// Total of every metric in `category`, with the first known unit
#[must_use]
pub fn category_total(
    metrics: &[MetricDefinition],
    totals: &HashMap<String, f64>,
    metadata: &HashMap<String, StatisticMetadata>,
    category: MetricCategory,
) -> Option<(f64, String)> {
    let mut sum = None;
    let mut unit = None;
    for metric in metrics.iter().filter(|m| m.category == category) {
        if let Some(total) = totals.get(&metric.statistic_id) {
            *sum.get_or_insert(0.0) += total;
            if unit.is_none() {
                unit = metadata
                    .get(&metric.statistic_id)
                    .and_then(|meta| meta.unit.clone())
                    .filter(|u| !u.is_empty());
            }
        }
    }
    let unit = unit.unwrap_or_else(|| {
        if category == MetricCategory::Co2 {
            DEFAULT_CO2_UNIT.to_owned()
        } else {
            String::new()
        }
    });
    sum.map(|sum| (sum, unit))
}

/// Localized conclusion paragraph, also used as the advisor input
#[must_use]
pub fn conclusion_text(
    i18n: &I18n,
    window: &DateWindow,
    summary: Option<&ConclusionSummary>,
    metrics: &[MetricDefinition],
    totals: &HashMap<String, f64>,
    metadata: &HashMap<String, StatisticMetadata>,
) -> String {
    let mut sentences = vec![i18n.text_with(
        "conclusion-intro",
        &[
            ("start", format_date(window.start)),
            ("end", format_date(window.end)),
        ],
    )];

    match summary {
        Some(summary) => {
            let f = |key: &str| summary.formatted.get(key).cloned().unwrap_or_default();
            if summary.production > 0.0 {
                sentences.push(
                    i18n.text_with("conclusion-production", &[("value", f("production"))]),
                );
            }
            sentences.push(i18n.text_with(
                "conclusion-grid",
                &[("imported", f("imported")), ("exported", f("exported"))],
            ));
            if summary.charge > 0.0 || summary.discharge > 0.0 {
                sentences.push(i18n.text_with(
                    "conclusion-battery",
                    &[("charge", f("charge")), ("discharge", f("discharge"))],
                ));
            }
            if summary.self_consumption() > 0.0 {
                sentences.push(i18n.text_with(
                    "conclusion-self-consumption",
                    &[("direct", f("direct")), ("indirect", f("indirect"))],
                ));
            }
            sentences.push(i18n.text_with(
                "conclusion-total",
                &[
                    ("total", f("total_estimated_consumption")),
                    ("untracked", f("untracked_consumption")),
                ],
            ));
        }
        None => sentences.push(i18n.text("conclusion-no-data")),
    }

    for (category, key) in [
        (MetricCategory::Co2, "conclusion-co2"),
        (MetricCategory::Cost, "conclusion-cost"),
        (MetricCategory::Compensation, "conclusion-income"),
    ] {
        if let Some((total, unit)) = category_total(metrics, totals, metadata, category) {
            let value = format_measure(Some(total), &unit);
            sentences.push(i18n.text_with(key, &[("value", value)]));
        }
    }

    sentences.join(" ")
}
