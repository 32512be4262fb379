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

//! Energy report service: configuration, command line and HTTP endpoint around
//! [`energy_report_core::ReportGenerator`].

pub mod cli;
pub mod config;
pub mod server;

use std::sync::Arc;

use anyhow::Result;
use energy_report_core::{OpenAiAdvisor, ReportGenerator, StatisticsSource};
use energy_report_ha::{HaStatisticsAdapter, HomeAssistantClient};
use tracing::info;

pub use config::{AppConfig, ConfigOrigin};

/// Home Assistant client built from the configuration, falling back to the environment
pub fn ha_client(config: &AppConfig) -> Result<Arc<HomeAssistantClient>> {
    info!("🏠 [HA] Initializing client...");
    let client =
        HomeAssistantClient::from_config(config.ha_base_url.clone(), config.ha_token.clone())?;
    Ok(Arc::new(client))
}

/// Report generator over `source`, with the OpenAI advisor when an API key is configured
pub fn build_generator(
    config: &AppConfig,
    source: Arc<dyn StatisticsSource>,
) -> Result<ReportGenerator> {
    let generator = ReportGenerator::new(source, config.report_settings());

    match config.openai_api_key() {
        Some(key) => {
            info!("🤖 [ADVICE] OpenAI advice enabled");
            Ok(generator.with_advisor(Arc::new(OpenAiAdvisor::new(key)?)))
        }
        None => {
            info!("🤖 [ADVICE] No OpenAI API key, reports will not include advice");
            Ok(generator)
        }
    }
}

/// Statistics source and generator wired to Home Assistant
pub fn build_app(config: &AppConfig) -> Result<server::AppState> {
    let client = ha_client(config)?;
    let source: Arc<dyn StatisticsSource> = Arc::new(HaStatisticsAdapter::new(client));
    let generator = Arc::new(build_generator(config, source.clone())?);
    Ok(server::AppState { generator, source })
}
