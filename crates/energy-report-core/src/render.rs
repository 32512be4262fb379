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

//! Turns aggregated report data into a laid-out document.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use energy_report_i18n::I18n;

use crate::comparison::{ComparisonValues, build_comparison_table};
use crate::error::ReportResult;
use crate::format::{format_date, format_measure, format_timestamp};
use crate::metrics::{DEFAULT_CO2_UNIT, MetricCategory, MetricDefinition};
use crate::pdf::builder::{CURRENT_PAGE, TOTAL_PAGES, UNIT};
use crate::pdf::{
    ChartBar, EnergyPdfBuilder, PdfDocument, PdfImage, PdfLabels, Rgb, TableConfig,
};
use crate::period::{DateWindow, ReportPeriod};
use crate::statistics::StatisticMetadata;
use crate::summary::{ConclusionSummary, ENERGY_UNIT, conclusion_text, prepare_conclusion_summary};
use crate::units::normalize_to_kwh;

/// Aggregated value of one metric over a window
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTotal {
    pub metric: MetricDefinition,
    /// Total in the statistic's own unit
    pub total: f64,
    pub unit: Option<String>,
    pub daily: BTreeMap<NaiveDate, f64>,
}

impl MetricTotal {
    /// Total converted for display (electrical energy in kWh)
    #[must_use]
    pub fn display_total(&self) -> f64 {
        self.convert(self.total)
    }

    #[must_use]
    pub fn display_unit(&self) -> String {
        if self.metric.category.is_electric_energy() {
            return ENERGY_UNIT.to_owned();
        }
        match self.unit.as_deref().filter(|u| !u.is_empty()) {
            Some(unit) => unit.to_owned(),
            None if self.metric.category == MetricCategory::Co2 => DEFAULT_CO2_UNIT.to_owned(),
            None => String::new(),
        }
    }

    fn convert(&self, value: f64) -> f64 {
        if self.metric.category.is_electric_energy() {
            normalize_to_kwh(value, self.unit.as_deref())
        } else {
            value
        }
    }
}

/// Everything the report knows about one window
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodReport {
    pub window: DateWindow,
    pub metrics: Vec<MetricTotal>,
    pub metadata: HashMap<String, StatisticMetadata>,
    pub summary: Option<ConclusionSummary>,
    pub values: ComparisonValues,
}

impl PeriodReport {
    #[must_use]
    pub fn new(
        window: DateWindow,
        metrics: Vec<MetricTotal>,
        metadata: HashMap<String, StatisticMetadata>,
    ) -> Self {
        let definitions: Vec<MetricDefinition> = metrics.iter().map(|m| m.metric.clone()).collect();
        let totals = totals_of(&metrics);
        let summary = prepare_conclusion_summary(&definitions, &totals, &metadata);
        let values = ComparisonValues::collect(&definitions, &totals, &metadata, summary.as_ref());
        Self {
            window,
            metrics,
            metadata,
            summary,
            values,
        }
    }

    /// Localized conclusion paragraph for this window
    #[must_use]
    pub fn conclusion(&self, i18n: &I18n) -> String {
        let definitions: Vec<MetricDefinition> =
            self.metrics.iter().map(|m| m.metric.clone()).collect();
        conclusion_text(
            i18n,
            &self.window,
            self.summary.as_ref(),
            &definitions,
            &totals_of(&self.metrics),
            &self.metadata,
        )
    }

    /// Items borrow `self` only, so `categories` may be a temporary
    fn in_categories<'a>(
        &'a self,
        categories: &[MetricCategory],
    ) -> impl Iterator<Item = &'a MetricTotal> {
        self.metrics
            .iter()
            .filter(move |m| categories.contains(&m.metric.category))
    }
}

fn totals_of(metrics: &[MetricTotal]) -> HashMap<String, f64> {
    metrics
        .iter()
        .map(|m| (m.metric.statistic_id.clone(), m.total))
        .collect()
}

/// Input of [`render_report`]
#[derive(Debug, Clone, PartialEq)]
pub struct ReportContent {
    pub period: ReportPeriod,
    pub dashboard: Option<String>,
    /// Local wall-clock time of generation
    pub generated_at: NaiveDateTime,
    pub primary: PeriodReport,
    pub comparison: Option<PeriodReport>,
    pub conclusion: String,
    pub advice: Option<String>,
    /// Drawn on the cover page
    pub logo: Option<PdfImage>,
}

const ENERGY_CATEGORIES: [MetricCategory; 8] = [
    MetricCategory::Solar,
    MetricCategory::GridImport,
    MetricCategory::GridExport,
    MetricCategory::BatteryCharge,
    MetricCategory::BatteryDischarge,
    MetricCategory::Device,
    MetricCategory::Gas,
    MetricCategory::Water,
];

const DAILY_CATEGORIES: [MetricCategory; 6] = [
    MetricCategory::Solar,
    MetricCategory::GridImport,
    MetricCategory::GridExport,
    MetricCategory::Device,
    MetricCategory::Co2,
    MetricCategory::Cost,
];

/// Bar colour of a metric category
#[must_use]
pub fn category_color(category: MetricCategory) -> Rgb {
    match category {
        MetricCategory::Solar => Rgb(241, 196, 15),
        MetricCategory::GridImport | MetricCategory::GridExport => Rgb(52, 152, 219),
        MetricCategory::Device => Rgb(46, 134, 193),
        MetricCategory::BatteryCharge | MetricCategory::BatteryDischarge => Rgb(155, 89, 182),
        MetricCategory::Gas => Rgb(231, 76, 60),
        MetricCategory::Water => Rgb(26, 188, 156),
        MetricCategory::Co2 => Rgb(100, 100, 100),
        MetricCategory::Cost => Rgb(243, 156, 18),
        MetricCategory::Compensation => Rgb(46, 204, 113),
    }
}

/// Lay out the full report
///
/// # Errors
///
/// Returns `ReportError::Render` when a table cannot be laid out.
pub fn render_report(content: &ReportContent, i18n: &I18n) -> ReportResult<PdfDocument> {
    let primary = &content.primary;
    let window = &primary.window;
    let timestamp = format_timestamp(content.generated_at);
    let bucket = i18n.text(window.bucket().label_key());

    let mut builder = EnergyPdfBuilder::new(PdfLabels {
        title: i18n.text("report-title"),
        period_label: period_label(i18n, window),
        generated: i18n.text_with("footer-generated", &[("timestamp", timestamp.clone())]),
        page_template: i18n.text_with(
            "footer-page",
            &[
                ("current", CURRENT_PAGE.to_owned()),
                ("total", TOTAL_PAGES.to_owned()),
            ],
        ),
        table_empty: i18n.text("table-empty"),
        chart_units_template: i18n.text_with("chart-units", &[("unit", UNIT.to_owned())]),
    });

    let mut details = vec![
        period_label(i18n, window),
        i18n.text_with("cover-generated", &[("timestamp", timestamp)]),
    ];
    if let Some(dashboard) = content.dashboard.as_deref().filter(|d| !d.is_empty()) {
        details.push(i18n.text_with("cover-dashboard", &[("dashboard", dashboard.to_owned())]));
    }
    details.push(i18n.text_with("cover-granularity", &[("bucket", bucket.clone())]));
    let subtitle = i18n.text_with(
        "report-subtitle",
        &[("type", i18n.text(content.period.label_key()))],
    );
    builder.add_cover_page(&subtitle, &details, content.logo.as_ref());

    add_overview(&mut builder, i18n, primary)?;
    add_category_table(
        &mut builder,
        i18n,
        primary,
        "section-co2",
        "table-co2-title",
        &[MetricCategory::Co2],
    )?;
    add_category_table(
        &mut builder,
        i18n,
        primary,
        "section-prices",
        "table-price-title",
        &[MetricCategory::Cost, MetricCategory::Compensation],
    )?;
    add_daily_breakdown(&mut builder, i18n, primary)?;

    if let Some(reference) = &content.comparison {
        builder.add_section_title(&i18n.text("section-comparison"));
        let table = build_comparison_table(
            i18n,
            &primary.values,
            &reference.values,
            &period_range(i18n, &primary.window),
            &period_range(i18n, &reference.window),
        );
        builder.add_table(&table)?;
    }

    builder.add_section_title(&i18n.text("section-conclusion"));
    builder.add_paragraph(&content.conclusion, false, 11.0);

    if let Some(advice) = content.advice.as_deref().filter(|a| !a.trim().is_empty()) {
        builder.add_section_title(&i18n.text("section-advice"));
        builder.add_paragraph(advice, false, 11.0);
        builder.add_paragraph(&i18n.text("advice-disclaimer"), false, 9.0);
    }

    builder.add_footer(&i18n.text_with("footer-note", &[("bucket", bucket)]));
    Ok(builder.finish())
}

fn period_label(i18n: &I18n, window: &DateWindow) -> String {
    i18n.text_with(
        "period-label",
        &[
            ("start", format_date(window.start)),
            ("end", format_date(window.end)),
        ],
    )
}

fn period_range(i18n: &I18n, window: &DateWindow) -> String {
    i18n.text_with(
        "period-range",
        &[
            ("start", format_date(window.start)),
            ("end", format_date(window.end)),
        ],
    )
}

fn metric_row(i18n: &I18n, total: &MetricTotal) -> Vec<String> {
    vec![
        total.metric.label(i18n),
        total.metric.statistic_id.clone(),
        format_measure(Some(total.display_total()), &total.display_unit()),
    ]
}

fn metric_headers(i18n: &I18n) -> Vec<String> {
    vec![
        i18n.text("header-category"),
        i18n.text("header-statistic"),
        i18n.text("header-total"),
    ]
}

fn add_overview(
    builder: &mut EnergyPdfBuilder,
    i18n: &I18n,
    period: &PeriodReport,
) -> ReportResult<()> {
    builder.add_section_title(&i18n.text("section-overview"));

    let rows = period
        .in_categories(&ENERGY_CATEGORIES)
        .map(|total| metric_row(i18n, total))
        .collect();
    builder.add_table(&TableConfig {
        title: i18n.text("table-energy-title"),
        headers: metric_headers(i18n),
        rows,
        column_weights: Some(vec![3.0, 3.0, 2.0]),
        emphasize_rows: Vec::new(),
    })?;

    // Exported energy leaves the home, so it is drawn left of the zero line
    let bars: Vec<ChartBar> = period
        .metrics
        .iter()
        .filter(|total| total.metric.category.is_electric_energy())
        .map(|total| {
            let value = total.display_total();
            ChartBar {
                label: total.metric.label(i18n),
                value: if total.metric.category == MetricCategory::GridExport {
                    -value
                } else {
                    value
                },
                unit: total.display_unit(),
                color: category_color(total.metric.category),
            }
        })
        .collect();
    builder.add_chart(&i18n.text("chart-energy-title"), &bars, None);
    Ok(())
}

/// Section listing the metrics of some categories, with a total row when units agree
fn add_category_table(
    builder: &mut EnergyPdfBuilder,
    i18n: &I18n,
    period: &PeriodReport,
    section_key: &str,
    title_key: &str,
    categories: &[MetricCategory],
) -> ReportResult<()> {
    let totals: Vec<&MetricTotal> = period.in_categories(categories).collect();
    if totals.is_empty() {
        return Ok(());
    }
    builder.add_section_title(&i18n.text(section_key));

    let mut rows = Vec::new();
    let mut emphasize_rows = Vec::new();
    for category in categories {
        let members: Vec<&MetricTotal> = totals
            .iter()
            .copied()
            .filter(|t| t.metric.category == *category)
            .collect();
        rows.extend(members.iter().map(|total| metric_row(i18n, total)));

        let units: Vec<String> = members.iter().map(|t| t.display_unit()).collect();
        let same_unit = units.windows(2).all(|pair| pair[0] == pair[1]);
        if members.len() > 1 && same_unit {
            let sum: f64 = members.iter().map(|t| t.display_total()).sum();
            emphasize_rows.push(rows.len());
            rows.push(vec![
                i18n.text("total-row"),
                String::new(),
                format_measure(Some(sum), units.first().map_or("", String::as_str)),
            ]);
        }
    }

    builder.add_table(&TableConfig {
        title: i18n.text(title_key),
        headers: metric_headers(i18n),
        rows,
        column_weights: Some(vec![3.0, 3.0, 2.0]),
        emphasize_rows,
    })
}

/// Per-day totals by category, for windows longer than one day
fn add_daily_breakdown(
    builder: &mut EnergyPdfBuilder,
    i18n: &I18n,
    period: &PeriodReport,
) -> ReportResult<()> {
    if period.window.is_single_day() {
        return Ok(());
    }

    let mut columns: Vec<(MetricCategory, String, BTreeMap<NaiveDate, f64>)> = Vec::new();
    for category in DAILY_CATEGORIES {
        let members: Vec<&MetricTotal> = period.in_categories(&[category]).collect();
        let Some(first) = members.first() else {
            continue;
        };
        let mut daily = BTreeMap::new();
        for total in &members {
            for (day, value) in &total.daily {
                *daily.entry(*day).or_insert(0.0) += total.convert(*value);
            }
        }
        if !daily.is_empty() {
            columns.push((category, first.display_unit(), daily));
        }
    }
    if columns.is_empty() {
        return Ok(());
    }

    builder.add_section_title(&i18n.text("section-daily"));
    let mut headers = vec![i18n.text("header-date")];
    headers.extend(
        columns
            .iter()
            .map(|(category, _, _)| i18n.text(category.label_key())),
    );

    let rows = period
        .window
        .dates()
        .map(|day| {
            let mut row = vec![format_date(day)];
            row.extend(
                columns
                    .iter()
                    .map(|(_, unit, daily)| format_measure(daily.get(&day).copied(), unit)),
            );
            row
        })
        .collect();

    let mut weights = vec![1.4];
    weights.extend(std::iter::repeat_n(2.0, columns.len()));
    builder.add_table(&TableConfig {
        title: i18n.text("table-daily-title"),
        headers,
        rows,
        column_weights: Some(weights),
        emphasize_rows: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{SensorSource, SourceSensor};
    use energy_report_i18n::Language;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn total(
        metric: MetricDefinition,
        total: f64,
        unit: &str,
        daily: &[(u32, f64)],
    ) -> MetricTotal {
        MetricTotal {
            metric,
            total,
            unit: Some(unit.to_owned()),
            daily: daily.iter().map(|(d, v)| (day(*d), *v)).collect(),
        }
    }

    fn period(window: DateWindow) -> PeriodReport {
        let co2 = |id: &str, source| {
            MetricDefinition::sensor(&SourceSensor::new(source, id), MetricCategory::Co2)
        };
        PeriodReport::new(
            window,
            vec![
                total(
                    MetricDefinition::counter("sensor.pv", MetricCategory::Solar),
                    5000.0,
                    "Wh",
                    &[(5, 3000.0), (6, 2000.0)],
                ),
                total(
                    MetricDefinition::counter("sensor.grid_out", MetricCategory::GridExport),
                    0.5,
                    "kWh",
                    &[(5, 0.5)],
                ),
                total(
                    co2("sensor.co2_elec", SensorSource::Electricity),
                    0.026,
                    "kgCO₂e",
                    &[(5, 0.013), (6, 0.013)],
                ),
                total(
                    co2("sensor.co2_gas", SensorSource::Gas),
                    0.013,
                    "kgCO₂e",
                    &[(6, 0.013)],
                ),
            ],
            HashMap::new(),
        )
    }

    fn content(comparison: bool, advice: Option<&str>) -> ReportContent {
        let window = DateWindow::new(day(5), day(6)).unwrap();
        ReportContent {
            period: ReportPeriod::Week,
            dashboard: Some("Energy".to_owned()),
            generated_at: day(7).and_hms_opt(8, 30, 0).unwrap(),
            primary: period(window),
            comparison: comparison.then(|| period(window.previous(ReportPeriod::Week).unwrap())),
            conclusion: "Summary for the period.".to_owned(),
            advice: advice.map(str::to_owned),
            logo: None,
        }
    }

    #[test]
    fn test_display_units() {
        let pv = total(
            MetricDefinition::counter("sensor.pv", MetricCategory::Solar),
            5000.0,
            "Wh",
            &[],
        );
        assert_eq!(pv.display_total(), 5.0);
        assert_eq!(pv.display_unit(), "kWh");

        let mut co2 = total(
            MetricDefinition::counter("sensor.co2", MetricCategory::Co2),
            1.0,
            "",
            &[],
        );
        assert_eq!(co2.display_unit(), DEFAULT_CO2_UNIT);
        co2.unit = Some("g".to_owned());
        assert_eq!(co2.display_unit(), "g");
    }

    #[test]
    fn test_in_categories_with_temporary_filter() {
        let period = period(DateWindow::new(day(5), day(6)).unwrap());

        let co2: Vec<&MetricTotal> = period.in_categories(&[MetricCategory::Co2]).collect();
        let ids: Vec<&str> = co2.iter().map(|t| t.metric.statistic_id.as_str()).collect();
        assert_eq!(ids, vec!["sensor.co2_elec", "sensor.co2_gas"]);

        assert_eq!(period.in_categories(&[MetricCategory::Solar]).count(), 1);
    }

    #[test]
    fn test_report_sections() {
        let i18n = I18n::new(Language::English).unwrap();
        let document = render_report(&content(true, Some("Shift loads.")), &i18n).unwrap();
        let texts: Vec<&str> = document.texts().collect();

        for expected in [
            "Energy report",
            "Weekly report",
            "Dashboard: Energy",
            "Overview",
            "CO₂ emissions",
            "Daily breakdown",
            "Period comparison",
            "Conclusion",
            "Advice",
            "Shift loads.",
            "5.00 kWh",
            "0.039 kgCO₂e",
            "06/03/2024",
        ] {
            assert!(texts.contains(&expected), "missing '{expected}' in {texts:?}");
        }
        assert!(!texts.contains(&"Costs and income"));
    }

    #[test]
    fn test_logo_is_embedded_once_on_the_cover() {
        let i18n = I18n::new(Language::English).unwrap();
        let logo = PdfImage {
            width: 10,
            height: 10,
            rgb: Vec::new(),
            alpha: None,
        };
        let mut with_logo = content(false, None);
        with_logo.logo = Some(logo);
        let document = render_report(&with_logo, &i18n).unwrap();

        assert_eq!(document.images.len(), 1);
        let is_image = |op: &crate::pdf::document::DrawOp| {
            matches!(op, crate::pdf::document::DrawOp::Image { .. })
        };
        assert!(document.pages[0].ops.iter().any(is_image));
        assert!(!document.pages[1..].iter().flat_map(|p| &p.ops).any(is_image));

        let plain = render_report(&content(false, None), &i18n).unwrap();
        assert!(plain.images.is_empty());
        assert_eq!(plain.page_count(), document.page_count());
    }

    #[test]
    fn test_without_advice_or_comparison() {
        let i18n = I18n::new(Language::French).unwrap();
        let document = render_report(&content(false, None), &i18n).unwrap();
        let texts: Vec<&str> = document.texts().collect();

        assert!(!texts.contains(&"Conseil"));
        assert!(!texts.iter().any(|t| t.contains("Comparaison")));
        assert!(document.page_count() >= 2);
        assert!(document.to_bytes().starts_with(b"%PDF-"));
    }
}
