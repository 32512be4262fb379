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

use tracing::debug;

/// Convert an energy value to kWh based on its unit of measurement
///
/// Unknown or missing units are returned unchanged.
#[must_use]
pub fn normalize_to_kwh(value: f64, unit: Option<&str>) -> f64 {
    let Some(unit) = unit.map(str::trim).filter(|u| !u.is_empty()) else {
        return value;
    };

    match unit.to_lowercase().as_str() {
        "wh" => value / 1000.0,
        "kwh" => value,
        "mwh" => value * 1000.0,
        "gwh" => value * 1_000_000.0,
        other => {
            debug!("Unknown energy unit '{other}', keeping value as kWh");
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_units() {
        assert_eq!(normalize_to_kwh(2000.0, Some("Wh")), 2.0);
        assert_eq!(normalize_to_kwh(2.0, Some("kWh")), 2.0);
        assert_eq!(normalize_to_kwh(1.5, Some("MWh")), 1500.0);
        assert_eq!(normalize_to_kwh(0.002, Some("gwh")), 2000.0);
    }

    #[test]
    fn test_unknown_units_unchanged() {
        assert_eq!(normalize_to_kwh(4.2, None), 4.2);
        assert_eq!(normalize_to_kwh(4.2, Some("")), 4.2);
        assert_eq!(normalize_to_kwh(4.2, Some("m³")), 4.2);
    }
}
