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

//! Command line definitions using clap.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use energy_report_core::ReportRequest;

#[derive(Debug, Parser)]
#[command(name = "energy-report")]
#[command(author, version, about = "Energy, CO₂ and price statistics reports for Home Assistant")]
#[command(
    long_about = "Builds PDF reports from Home Assistant long-term statistics.\n\
    \nConfiguration is read from --config, /data/options.json, config.toml or config.json,\n\
    with HA_BASE_URL, HA_TOKEN, OPENAI_API_KEY, REPORT_OUTPUT_DIR and REPORT_LANGUAGE\n\
    taking precedence.\n\
    \nExamples:\n  \
    energy-report generate                               # Today so far, default language\n  \
    energy-report generate --period week --compare       # This week vs the previous one\n  \
    energy-report generate --start 2024-03-01 --end 2024-03-31 --language en\n  \
    energy-report serve --port 8099                      # HTTP service"
)]
pub struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(long, short, global = true, env = "ENERGY_REPORT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate one report and print where it was written
    Generate(GenerateArgs),

    /// Serve report generation over HTTP
    Serve(ServeArgs),

    /// Validate configuration and check Home Assistant connectivity
    Check,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// First day of the report (YYYY-MM-DD)
    #[arg(long = "start", value_name = "DATE")]
    pub start_date: Option<NaiveDate>,

    /// Last day of the report, inclusive (YYYY-MM-DD)
    #[arg(long = "end", value_name = "DATE")]
    pub end_date: Option<NaiveDate>,

    /// Report type when no explicit dates are given (day, week, month)
    #[arg(long)]
    pub period: Option<String>,

    /// Base file name; a random suffix is always appended
    #[arg(long)]
    pub filename: Option<String>,

    /// Output directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Report language (fr, en, nl)
    #[arg(long)]
    pub language: Option<String>,

    /// Dashboard name printed on the cover page
    #[arg(long)]
    pub dashboard: Option<String>,

    /// Include CO₂ sensors
    #[arg(long, overrides_with = "no_co2")]
    pub co2: bool,

    /// Leave CO₂ sensors out
    #[arg(long)]
    pub no_co2: bool,

    /// Include price sensors
    #[arg(long, overrides_with = "no_price")]
    pub price: bool,

    /// Leave price sensors out
    #[arg(long)]
    pub no_price: bool,

    /// Add a comparison with the previous period
    #[arg(long)]
    pub compare: bool,

    /// First day of the comparison period (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub compare_start: Option<NaiveDate>,

    /// Last day of the comparison period (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub compare_end: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen port, overriding `server_port` from the configuration
    #[arg(long, short)]
    pub port: Option<u16>,
}

/// `Some(true)` for `--flag`, `Some(false)` for `--no-flag`, `None` when neither was given
fn tri_state(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

impl From<GenerateArgs> for ReportRequest {
    fn from(args: GenerateArgs) -> Self {
        Self {
            start_date: args.start_date,
            end_date: args.end_date,
            period: args.period,
            filename: args.filename,
            output_dir: args.output_dir,
            language: args.language,
            dashboard: args.dashboard,
            co2_enabled: tri_state(args.co2, args.no_co2),
            price_enabled: tri_state(args.price, args.no_price),
            compare: args.compare.then_some(true),
            compare_start_date: args.compare_start,
            compare_end_date: args.compare_end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_request(args: &[&str]) -> ReportRequest {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Generate(args) => args.into(),
            other => panic!("expected generate, got {other:?}"),
        }
    }

    #[test]
    fn test_generate_without_arguments_uses_defaults() {
        let request = generate_request(&["energy-report", "generate"]);
        assert_eq!(request, ReportRequest::default());
    }

    #[test]
    fn test_generate_with_dates_and_comparison() {
        let request = generate_request(&[
            "energy-report",
            "generate",
            "--start",
            "2024-03-01",
            "--end",
            "2024-03-31",
            "--language",
            "nl",
            "--compare-start",
            "2023-03-01",
            "--compare-end",
            "2023-03-31",
            "--no-price",
        ]);

        assert_eq!(request.start_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(request.end_date, NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(request.language.as_deref(), Some("nl"));
        assert_eq!(request.compare, None);
        assert_eq!(request.compare_start_date, NaiveDate::from_ymd_opt(2023, 3, 1));
        assert_eq!(request.price_enabled, Some(false));
        assert_eq!(request.co2_enabled, None);
    }

    #[test]
    fn test_generate_flags() {
        let request = generate_request(&[
            "energy-report",
            "generate",
            "--period",
            "week",
            "--compare",
            "--co2",
            "--output-dir",
            "/tmp/out",
        ]);

        assert_eq!(request.period.as_deref(), Some("week"));
        assert_eq!(request.compare, Some(true));
        assert_eq!(request.co2_enabled, Some(true));
        assert_eq!(request.output_dir, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        assert!(Cli::try_parse_from(["energy-report", "generate", "--start", "01/03/2024"]).is_err());
    }

    #[test]
    fn test_global_config_and_serve_port() {
        let cli =
            Cli::try_parse_from(["energy-report", "serve", "--port", "9000", "--config", "a.toml"])
                .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("a.toml")));
        assert!(matches!(cli.command, Commands::Serve(ServeArgs { port: Some(9000) })));
    }

    #[test]
    fn test_check_command() {
        let cli = Cli::try_parse_from(["energy-report", "check"]).unwrap();
        assert!(matches!(cli.command, Commands::Check));
    }
}
