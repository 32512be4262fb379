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

mod validation;

pub use validation::{ValidationIssue, ValidationResult, ValidationSeverity};

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use energy_report_core::filename::DEFAULT_FILENAME_PATTERN;
use energy_report_core::report::DEFAULT_OUTPUT_DIR;
use energy_report_core::{ReportPeriod, ReportSettings, SensorSource, SourceSensor};
use energy_report_i18n::Language;
use serde::{Deserialize, Serialize};

/// Add-on options file written by the Supervisor
pub const ADDON_OPTIONS_PATH: &str = "/data/options.json";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Service configuration, in the shape of the add-on options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory the reports are written to
    pub output_dir: String,
    /// File name template with `{start}`, `{end}` and `{language}` placeholders
    pub filename_pattern: String,
    pub default_report_type: ReportPeriod,
    pub language: Language,

    // CO₂ sensors, one per commodity
    pub co2_electricity: Option<String>,
    pub co2_gas: Option<String>,
    pub co2_water: Option<String>,
    pub co2_fuel_oil: Option<String>,
    pub co2_wood: Option<String>,

    // Price sensors, one per commodity
    pub price_electricity_import: Option<String>,
    pub price_electricity_export: Option<String>,
    pub price_gas: Option<String>,
    pub price_water: Option<String>,

    pub co2_enabled: bool,
    pub price_enabled: bool,
    /// Dashboard name printed on the cover page
    pub dashboard: Option<String>,
    /// PNG or JPEG drawn on the cover page
    pub logo_path: Option<String>,
    pub openai_api_key: Option<String>,

    pub ha_base_url: Option<String>,
    pub ha_token: Option<String>,
    pub log_level: String,
    pub server_port: u16,

    /// `REPORT_LANGUAGE` value that named no supported language
    #[serde(skip)]
    pub rejected_language: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.to_owned(),
            filename_pattern: DEFAULT_FILENAME_PATTERN.to_owned(),
            default_report_type: ReportPeriod::Day,
            language: Language::French,
            co2_electricity: None,
            co2_gas: None,
            co2_water: None,
            co2_fuel_oil: None,
            co2_wood: None,
            price_electricity_import: None,
            price_electricity_export: None,
            price_gas: None,
            price_water: None,
            co2_enabled: true,
            price_enabled: true,
            dashboard: None,
            logo_path: None,
            openai_api_key: None,
            ha_base_url: None,
            ha_token: None,
            log_level: "info".to_owned(),
            server_port: 8099,
            rejected_language: None,
        }
    }
}

/// Where the configuration was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Defaults => f.write_str("defaults"),
        }
    }
}

/// Empty strings in add-on options mean "not set"
fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Load configuration from an explicit file, the add-on options or a development file
    ///
    /// Environment overrides are applied on top of whichever source was found. The
    /// result is not validated; callers decide how to report issues.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, ConfigOrigin)> {
        let (mut config, origin) = match explicit {
            Some(path) => (Self::from_file(path)?, ConfigOrigin::File(path.to_path_buf())),
            None => Self::load_first(&[
                Path::new(ADDON_OPTIONS_PATH),
                Path::new("config.toml"),
                Path::new("config.json"),
            ])?,
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        Ok((config, origin))
    }

    /// First readable file of `candidates`, or defaults when none exists
    fn load_first(candidates: &[&Path]) -> Result<(Self, ConfigOrigin)> {
        for path in candidates {
            if path.is_file() {
                return Ok((Self::from_file(path)?, ConfigOrigin::File(path.to_path_buf())));
            }
        }
        Ok((Self::default(), ConfigOrigin::Defaults))
    }

    /// Parse a TOML (`.toml`) or JSON (anything else) file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let is_toml = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))
        }
    }

    /// Apply `HA_BASE_URL`, `HA_TOKEN`, `OPENAI_API_KEY`, `REPORT_OUTPUT_DIR` and
    /// `REPORT_LANGUAGE` as returned by `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup("HA_BASE_URL") {
            self.ha_base_url = Some(url);
        }
        if let Some(token) = lookup("HA_TOKEN") {
            self.ha_token = Some(token);
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(dir) = lookup("REPORT_OUTPUT_DIR") {
            self.output_dir = dir;
        }
        if let Some(code) = lookup("REPORT_LANGUAGE") {
            match Language::from_code(&code) {
                Ok(language) => self.language = language,
                Err(_) => self.rejected_language = Some(code),
            }
        }
    }

    fn co2_fields(&self) -> [(&'static str, SensorSource, Option<&String>); 5] {
        [
            ("co2_electricity", SensorSource::Electricity, self.co2_electricity.as_ref()),
            ("co2_gas", SensorSource::Gas, self.co2_gas.as_ref()),
            ("co2_water", SensorSource::Water, self.co2_water.as_ref()),
            ("co2_fuel_oil", SensorSource::FuelOil, self.co2_fuel_oil.as_ref()),
            ("co2_wood", SensorSource::Wood, self.co2_wood.as_ref()),
        ]
    }

    fn price_fields(&self) -> [(&'static str, SensorSource, Option<&String>); 4] {
        [
            (
                "price_electricity_import",
                SensorSource::ElectricityImport,
                self.price_electricity_import.as_ref(),
            ),
            (
                "price_electricity_export",
                SensorSource::ElectricityExport,
                self.price_electricity_export.as_ref(),
            ),
            ("price_gas", SensorSource::Gas, self.price_gas.as_ref()),
            ("price_water", SensorSource::Water, self.price_water.as_ref()),
        ]
    }

    /// Configured CO₂ sensors
    #[must_use]
    pub fn co2_sensors(&self) -> Vec<SourceSensor> {
        self.co2_fields()
            .into_iter()
            .filter_map(|(_, source, entity)| {
                non_empty(entity).map(|entity| SourceSensor::new(source, entity))
            })
            .collect()
    }

    /// Configured price sensors
    #[must_use]
    pub fn price_sensors(&self) -> Vec<SourceSensor> {
        self.price_fields()
            .into_iter()
            .filter_map(|(_, source, entity)| {
                non_empty(entity).map(|entity| SourceSensor::new(source, entity))
            })
            .collect()
    }

    #[must_use]
    pub fn openai_api_key(&self) -> Option<&str> {
        non_empty(self.openai_api_key.as_ref())
    }

    /// Report defaults derived from this configuration
    #[must_use]
    pub fn report_settings(&self) -> ReportSettings {
        ReportSettings {
            output_dir: PathBuf::from(self.output_dir.trim()),
            filename_pattern: self.filename_pattern.trim().to_owned(),
            default_report_type: self.default_report_type,
            language: self.language,
            dashboard: non_empty(self.dashboard.as_ref()).map(str::to_owned),
            co2_enabled: self.co2_enabled,
            price_enabled: self.price_enabled,
            co2_sensors: self.co2_sensors(),
            price_sensors: self.price_sensors(),
            logo_path: non_empty(self.logo_path.as_ref()).map(PathBuf::from),
        }
    }

    /// Validate configuration with detailed error reporting
    #[must_use]
    pub fn validate_detailed(&self) -> ValidationResult {
        let mut result = ValidationResult::success();

        if self.output_dir.trim().is_empty() {
            result.add_error("output_dir", "Output directory cannot be empty");
        }

        let pattern = self.filename_pattern.trim();
        if pattern.is_empty() {
            result.add_error("filename_pattern", "Filename pattern cannot be empty");
        } else {
            if !pattern.to_lowercase().ends_with(".pdf") {
                result.add_warning("filename_pattern", "'.pdf' will be appended to file names");
            }
            if !pattern.contains("{start}") && !pattern.contains("{end}") {
                result.add_warning(
                    "filename_pattern",
                    "Without {start} or {end}, reports of different periods only differ by their random suffix",
                );
            }
        }

        for (field, _, entity) in self.co2_fields().into_iter().chain(self.price_fields()) {
            if let Some(entity) = non_empty(entity)
                && !is_entity_id(entity)
            {
                result.add_error(
                    field,
                    format!("'{entity}' is not an entity ID (expected e.g. sensor.my_sensor)"),
                );
            }
        }

        if let Some(code) = &self.rejected_language {
            result.add_warning(
                "REPORT_LANGUAGE",
                format!(
                    "Unsupported language '{code}' ignored, reports default to {}",
                    self.language
                ),
            );
        }

        if let Some(logo) = non_empty(self.logo_path.as_ref())
            && !Path::new(logo).is_file()
        {
            result.add_warning(
                "logo_path",
                format!("'{logo}' is not a file; the cover will have no logo"),
            );
        }

        if self.co2_enabled && self.co2_sensors().is_empty() {
            result.add_warning("co2_enabled", "CO₂ is enabled but no CO₂ sensor is configured");
        }
        if self.price_enabled && self.price_sensors().is_empty() {
            result.add_warning(
                "price_enabled",
                "Prices are enabled but no price sensor is configured; only energy dashboard costs will be reported",
            );
        }

        if let Some(url) = non_empty(self.ha_base_url.as_ref())
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            result.add_error("ha_base_url", "Must start with http:// or https://");
        }

        if !LOG_LEVELS.contains(&self.log_level.trim().to_lowercase().as_str()) {
            result.add_warning(
                "log_level",
                format!(
                    "Unknown level '{}', expected one of {}",
                    self.log_level,
                    LOG_LEVELS.join(", ")
                ),
            );
        }

        if self.server_port == 0 {
            result.add_error("server_port", "Port must be between 1 and 65535");
        }

        result
    }

    /// Validate configuration, failing on the first set of errors
    pub fn validate(&self) -> Result<()> {
        let result = self.validate_detailed();
        if result.is_valid() {
            Ok(())
        } else {
            anyhow::bail!("Invalid configuration: {}", result.error_summary())
        }
    }
}

fn is_entity_id(value: &str) -> bool {
    value.split_once('.').is_some_and(|(domain, object)| {
        !domain.is_empty()
            && !object.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.output_dir, DEFAULT_OUTPUT_DIR);
        assert_eq!(config.default_report_type, ReportPeriod::Day);
        assert_eq!(config.language, Language::French);
        assert!(config.co2_enabled);
        assert!(config.price_enabled);
        assert_eq!(config.server_port, 8099);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ha_addon_options_format() {
        let options = r#"{
            "output_dir": "/share/energy",
            "filename_pattern": "report_{start}_{end}.pdf",
            "default_report_type": "weekly",
            "language": "nl",
            "co2_electricity": "sensor.co2_electricity",
            "co2_gas": "",
            "price_electricity_import": "sensor.price_import",
            "price_electricity_export": "sensor.price_export",
            "co2_enabled": true,
            "price_enabled": false,
            "dashboard": "Energie",
            "openai_api_key": "",
            "log_level": "debug"
        }"#;
        let config: AppConfig = serde_json::from_str(options).unwrap();

        assert_eq!(config.default_report_type, ReportPeriod::Week);
        assert_eq!(config.language, Language::Dutch);
        assert_eq!(config.openai_api_key(), None);
        assert_eq!(config.server_port, 8099);

        let settings = config.report_settings();
        assert_eq!(settings.output_dir, PathBuf::from("/share/energy"));
        assert_eq!(settings.dashboard.as_deref(), Some("Energie"));
        assert!(!settings.price_enabled);
        assert_eq!(
            settings.co2_sensors,
            vec![SourceSensor::new(SensorSource::Electricity, "sensor.co2_electricity")]
        );
        assert_eq!(
            settings.price_sensors,
            vec![
                SourceSensor::new(SensorSource::ElectricityImport, "sensor.price_import"),
                SourceSensor::new(SensorSource::ElectricityExport, "sensor.price_export"),
            ]
        );
    }

    #[test]
    fn test_toml_serialization() {
        let config = AppConfig {
            co2_gas: Some("sensor.co2_gas".to_owned()),
            dashboard: Some("Home".to_owned()),
            ..AppConfig::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_load_first_existing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("options.json");
        let toml_path = dir.path().join("config.toml");
        std::fs::write(&toml_path, "language = \"en\"\nserver_port = 9000\n").unwrap();

        let (config, origin) =
            AppConfig::load_first(&[missing.as_path(), toml_path.as_path()]).unwrap();
        assert_eq!(origin, ConfigOrigin::File(toml_path));
        assert_eq!(config.language, Language::English);
        assert_eq!(config.server_port, 9000);

        let (config, origin) = AppConfig::load_first(&[missing.as_path()]).unwrap();
        assert_eq!(origin, ConfigOrigin::Defaults);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = AppConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("HA_BASE_URL", "http://ha.lan:8123"),
            ("HA_TOKEN", "env_token"),
            ("OPENAI_API_KEY", "sk-test"),
            ("REPORT_OUTPUT_DIR", "/tmp/reports"),
            ("REPORT_LANGUAGE", "english"),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides(|name| env.get(name).map(|v| (*v).to_owned()));

        assert_eq!(config.ha_base_url.as_deref(), Some("http://ha.lan:8123"));
        assert_eq!(config.ha_token.as_deref(), Some("env_token"));
        assert_eq!(config.openai_api_key(), Some("sk-test"));
        assert_eq!(config.output_dir, "/tmp/reports");
        assert_eq!(config.language, Language::English);
    }

    #[test]
    fn test_unknown_language_override_is_reported() {
        let mut config = AppConfig::default();
        config.apply_overrides(|name| (name == "REPORT_LANGUAGE").then(|| "klingon".to_owned()));
        assert_eq!(config.language, Language::French);
        assert_eq!(config.rejected_language.as_deref(), Some("klingon"));

        let result = config.validate_detailed();
        assert!(result.is_valid());
        let warning = result.warnings.iter().find(|w| w.field == "REPORT_LANGUAGE").unwrap();
        assert!(warning.message.contains("'klingon'"));
        assert!(warning.message.contains("fr"));
    }

    #[test]
    fn test_logo_path() {
        let dir = TempDir::new().unwrap();
        let logo = dir.path().join("logo.png");
        std::fs::write(&logo, b"png").unwrap();

        let config = AppConfig {
            logo_path: Some(logo.display().to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.report_settings().logo_path, Some(logo));
        assert!(config.validate_detailed().warnings.iter().all(|w| w.field != "logo_path"));

        let missing = AppConfig {
            logo_path: Some(dir.path().join("missing.png").display().to_string()),
            ..AppConfig::default()
        };
        let result = missing.validate_detailed();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "logo_path"));

        let blank = AppConfig {
            logo_path: Some(" ".to_owned()),
            ..AppConfig::default()
        };
        assert_eq!(blank.report_settings().logo_path, None);
    }

    #[test]
    fn test_validate_detailed_errors() {
        let config = AppConfig {
            output_dir: "  ".to_owned(),
            co2_gas: Some("not an entity".to_owned()),
            ha_base_url: Some("homeassistant.local".to_owned()),
            server_port: 0,
            ..AppConfig::default()
        };
        let result = config.validate_detailed();

        let fields: Vec<&str> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["output_dir", "co2_gas", "ha_base_url", "server_port"]);
        assert!(!result.is_valid());
        assert!(config.validate().unwrap_err().to_string().contains("co2_gas"));
    }

    #[test]
    fn test_validate_detailed_warnings() {
        let config = AppConfig {
            filename_pattern: "report".to_owned(),
            log_level: "verbose".to_owned(),
            ..AppConfig::default()
        };
        let result = config.validate_detailed();

        assert!(result.is_valid());
        let fields: Vec<&str> = result.warnings.iter().map(|w| w.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "filename_pattern",
                "filename_pattern",
                "co2_enabled",
                "price_enabled",
                "log_level"
            ]
        );
        assert!(result.warnings.iter().all(|w| w.severity == ValidationSeverity::Warning));
    }

    #[test]
    fn test_entity_id_format() {
        assert!(is_entity_id("sensor.co2_intensity"));
        assert!(!is_entity_id("sensor."));
        assert!(!is_entity_id("Sensor.Upper"));
        assert!(!is_entity_id("no_domain"));
    }
}
