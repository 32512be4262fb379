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

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

use energy_report_core::ReportRequest;
use energy_report_main::cli::{Cli, Commands};
use energy_report_main::{AppConfig, ConfigOrigin, build_app, ha_client, server};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (mut config, origin) = AppConfig::load(cli.config.as_deref())?;

    // RUST_LOG wins over the configured level
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.trim())),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🚀 Starting energy-report v{}", env!("CARGO_PKG_VERSION"));
    log_summary(&config, &origin);

    match cli.command {
        Commands::Generate(mut args) => {
            // The local operator may write anywhere; only HTTP requests are confined
            if let Some(dir) = args.output_dir.take() {
                config.output_dir = dir.display().to_string();
            }
            config.validate()?;
            let state = build_app(&config)?;
            let report = state.generator.generate(&ReportRequest::from(args)).await?;
            println!("{}", report.path.display());
        }
        Commands::Serve(args) => {
            config.validate()?;
            let state = build_app(&config)?;
            server::run(args.port.unwrap_or(config.server_port), state).await?;
        }
        Commands::Check => check(&config).await?,
    }

    Ok(())
}

fn log_summary(config: &AppConfig, origin: &ConfigOrigin) {
    info!("📋 Configuration Summary ({origin}):");
    info!("   Output: {}", config.output_dir);
    info!("   Filename pattern: {}", config.filename_pattern);
    info!(
        "   Default report: {}, language: {}",
        config.default_report_type.as_str(),
        config.language.code()
    );
    info!(
        "   CO₂: {} ({} sensors), prices: {} ({} sensors)",
        config.co2_enabled,
        config.co2_sensors().len(),
        config.price_enabled,
        config.price_sensors().len()
    );
    info!("   Advice: {}", config.openai_api_key().is_some());
}

/// Validate the configuration, reach Home Assistant and look up every configured sensor
async fn check(config: &AppConfig) -> Result<()> {
    let validation = config.validate_detailed();
    validation.log();
    if !validation.is_valid() {
        anyhow::bail!("Invalid configuration: {}", validation.error_summary());
    }
    info!("✅ [CHECK] Configuration valid ({} warnings)", validation.warnings.len());

    let client = ha_client(config)?;
    if !client.ping().await? {
        anyhow::bail!("Home Assistant at {} is not reachable", client.base_url());
    }
    info!("✅ [CHECK] Home Assistant reachable at {}", client.base_url());

    match client.get_timezone().await {
        Ok(timezone) => info!("🌍 [CHECK] Home Assistant timezone: {timezone}"),
        Err(e) => warn!("⚠️ [CHECK] Could not read timezone: {e}"),
    }

    let mut missing = 0_usize;
    for sensor in config.co2_sensors().iter().chain(config.price_sensors().iter()) {
        match client.get_state(&sensor.entity_id).await {
            Ok(state) => info!("✅ [CHECK] {} = {}", sensor.entity_id, state.state),
            Err(e) => {
                missing += 1;
                error!("❌ [CHECK] {}: {e}", sensor.entity_id);
            }
        }
    }

    if missing > 0 {
        anyhow::bail!("{missing} configured sensor(s) could not be read");
    }
    info!("✅ [CHECK] All checks passed");
    Ok(())
}
