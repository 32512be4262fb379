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

use energy_report_i18n::{I18n, I18nError, Language};

/// List of all translation keys that must exist in all languages
const REQUIRED_KEYS: &[&str] = &[
    // Report - cover and page furniture
    "report-title",
    "report-subtitle",
    "report-type-day",
    "report-type-week",
    "report-type-month",
    "period-range",
    "period-label",
    "cover-generated",
    "cover-dashboard",
    "cover-granularity",
    "footer-page",
    "footer-generated",
    "footer-note",
    "bucket-hour",
    "bucket-day",
    // Report - sections
    "section-overview",
    "section-co2",
    "section-prices",
    "section-daily",
    "section-comparison",
    "section-conclusion",
    "section-advice",
    // Report - tables and charts
    "table-energy-title",
    "table-co2-title",
    "table-price-title",
    "table-daily-title",
    "table-empty",
    "header-category",
    "header-statistic",
    "header-total",
    "header-date",
    "total-row",
    "chart-energy-title",
    "chart-units",
    // Metrics
    "metric-solar",
    "metric-grid-import",
    "metric-grid-export",
    "metric-battery-charge",
    "metric-battery-discharge",
    "metric-device",
    "metric-gas",
    "metric-water",
    "metric-cost",
    "metric-compensation",
    "metric-co2",
    "source-electricity",
    "source-electricity-import",
    "source-electricity-export",
    "source-gas",
    "source-water",
    "source-fuel-oil",
    "source-wood",
    // Comparison
    "comparison-table-title",
    "comparison-header-category",
    "comparison-header-difference",
    "comparison-header-variation",
    "comparison-consumption-label",
    "comparison-total-estimated-consumption-label",
    "comparison-untracked-consumption-label",
    "comparison-device-consumption-label",
    "comparison-production-label",
    "comparison-import-label",
    "comparison-export-label",
    "comparison-self-consumption-label",
    "comparison-expense-label",
    "comparison-income-label",
    "comparison-co2-label",
    // Conclusion
    "conclusion-intro",
    "conclusion-production",
    "conclusion-grid",
    "conclusion-battery",
    "conclusion-self-consumption",
    "conclusion-total",
    "conclusion-co2",
    "conclusion-cost",
    "conclusion-income",
    "conclusion-no-data",
    "advice-disclaimer",
    // Advice prompts
    "advice-system-prompt",
    "advice-user-instruction",
    "advice-conclusion-label",
    "advice-instruction-label",
];

#[test]
fn test_all_keys_exist_in_every_language() {
    for language in Language::ALL {
        let i18n = I18n::new(language).expect("Failed to create i18n");

        // Keys with placeholders report a formatting error without arguments, which still
        // proves the message exists
        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| matches!(i18n.get(key), Err(I18nError::KeyNotFound(_))))
            .collect();

        assert!(
            missing.is_empty(),
            "Missing keys for {}: {missing:?}",
            language.display_name()
        );
    }
}

#[test]
fn test_placeholder_keys_format_with_arguments() {
    for language in Language::ALL {
        let i18n = I18n::new(language).expect("Failed to create i18n");
        let text = i18n.text_with(
            "period-label",
            &[
                ("start", "01/03/2025".to_owned()),
                ("end", "31/03/2025".to_owned()),
            ],
        );
        assert!(text.contains("01/03/2025"), "{language}: {text}");
        assert!(text.contains("31/03/2025"), "{language}: {text}");
    }
}

#[test]
fn test_translations_differ_between_languages() {
    let french = I18n::new(Language::French).unwrap();
    let english = I18n::new(Language::English).unwrap();
    let dutch = I18n::new(Language::Dutch).unwrap();

    assert_eq!(french.get("report-title").unwrap(), "Rapport énergétique");
    assert_eq!(english.get("report-title").unwrap(), "Energy report");
    assert_eq!(dutch.get("report-title").unwrap(), "Energierapport");
}

#[test]
fn test_advice_prompts_request_the_report_language() {
    let english = I18n::new(Language::English).unwrap();
    let dutch = I18n::new(Language::Dutch).unwrap();

    assert!(
        english
            .get("advice-system-prompt")
            .unwrap()
            .contains("English")
    );
    assert!(
        dutch
            .get("advice-system-prompt")
            .unwrap()
            .contains("Nederlands")
    );
}
