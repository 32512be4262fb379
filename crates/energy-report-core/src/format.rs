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

//! Number and date formatting used across the report.

use chrono::{NaiveDate, NaiveDateTime};

/// Placeholder for values that are missing or undefined
pub const MISSING: &str = "—";

/// Values closer to zero than this are rendered as zero
pub const ZERO_EPSILON: f64 = 1e-9;

/// Format a number with magnitude-dependent precision and space-separated thousands
///
/// ≥ 1000 → no decimals, ≥ 100 → 1, ≥ 1 → 2, below 1 → 3.
#[must_use]
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return MISSING.to_owned();
    }
    let value = if value.abs() < ZERO_EPSILON { 0.0 } else { value };
    let magnitude = value.abs();
    let decimals = if magnitude >= 1000.0 {
        0
    } else if magnitude >= 100.0 {
        1
    } else if magnitude >= 1.0 {
        2
    } else {
        3
    };
    group_thousands(&format!("{value:.decimals$}"))
}

/// Value followed by its unit, or the missing placeholder
#[must_use]
pub fn format_measure(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(value) if value.is_finite() => {
            let number = format_number(value);
            if unit.is_empty() {
                number
            } else {
                format!("{number} {unit}")
            }
        }
        _ => MISSING.to_owned(),
    }
}

/// Difference with an explicit sign
#[must_use]
pub fn format_signed(value: f64, unit: &str) -> String {
    let value = if value.abs() < ZERO_EPSILON { 0.0 } else { value };
    let sign = if value > 0.0 { "+" } else { "" };
    format!("{sign}{}", format_measure(Some(value), unit))
}

/// Fixed three-decimal rendering used for the conclusion figures
#[must_use]
pub fn format_fixed(value: f64, unit: &str) -> String {
    let value = if value.abs() < ZERO_EPSILON { 0.0 } else { value };
    format!("{} {unit}", group_thousands(&format!("{value:.3}")))
}

/// `dd/mm/yyyy`
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// `dd/mm/yyyy HH:MM`
#[must_use]
pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format("%d/%m/%Y %H:%M").to_string()
}

fn group_thousands(number: &str) -> String {
    let (sign, unsigned) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let digits: Vec<char> = integer.chars().collect();
    let mut grouped = String::with_capacity(number.len() + digits.len() / 3);
    for (index, digit) in digits.iter().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(*digit);
    }

    let mut result = format!("{sign}{grouped}");
    if let Some(fraction) = fraction {
        result.push('.');
        result.push_str(fraction);
    }
    result
}
