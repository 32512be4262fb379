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

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, error, info, trace, warn};

use crate::errors::{HaError, HaResult};
use crate::types::{HaEntityState, HaStatisticMetadata, HaStatisticRow};
use crate::websocket::HaWebSocket;

const DEFAULT_BASE_URL: &str = "http://localhost:8123";
const SUPERVISOR_BASE_URL: &str = "http://supervisor/core";

/// Home Assistant REST + WebSocket API client
#[derive(Clone)]
pub struct HomeAssistantClient {
    base_url: String,
    token: String,
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
    ws_timeout: Duration,
}

impl std::fmt::Debug for HomeAssistantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HomeAssistantClient")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("ws_timeout", &self.ws_timeout)
            .finish_non_exhaustive()
    }
}

impl HomeAssistantClient {
    /// Client for `base_url` (trailing slash ignored) authenticating with a long-lived token
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> HaResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| HaError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self {
            base_url,
            token: token.into(),
            client,
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
            ws_timeout: Duration::from_secs(30),
        })
    }

    /// Client behind the Supervisor proxy, for add-on installs
    pub fn from_supervisor() -> HaResult<Self> {
        let token = std::env::var("SUPERVISOR_TOKEN").map_err(|_| {
            HaError::ConfigError(
                "SUPERVISOR_TOKEN environment variable not set. Are you running as an HA addon?"
                    .to_owned(),
            )
        })?;

        info!("🏠 [HA] Using Supervisor proxy {SUPERVISOR_BASE_URL}");
        Self::new(SUPERVISOR_BASE_URL, token)
    }

    /// Client from `HA_BASE_URL` (default `http://localhost:8123`) and `HA_TOKEN`
    pub fn from_env() -> HaResult<Self> {
        let base_url =
            std::env::var("HA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let token = std::env::var("HA_TOKEN").map_err(|_| {
            HaError::ConfigError("HA_TOKEN environment variable not set".to_owned())
        })?;

        info!("🏠 [HA] Using {base_url} from environment");
        Self::new(base_url, token)
    }

    /// Client from configuration values
    ///
    /// Missing values fall back to `HA_BASE_URL`/`HA_TOKEN`, then to the Supervisor
    /// proxy when `SUPERVISOR_TOKEN` is set.
    pub fn from_config(ha_base_url: Option<String>, ha_token: Option<String>) -> HaResult<Self> {
        let ha_token = ha_token
            .filter(|token| !token.is_empty())
            .or_else(|| std::env::var("HA_TOKEN").ok());
        let ha_base_url = ha_base_url
            .filter(|url| !url.is_empty())
            .or_else(|| std::env::var("HA_BASE_URL").ok());

        let Some(token) = ha_token else {
            if std::env::var("SUPERVISOR_TOKEN").is_ok() {
                return Self::from_supervisor();
            }
            return Err(HaError::ConfigError(
                "HA token not found in config, HA_TOKEN or SUPERVISOR_TOKEN".to_owned(),
            ));
        };

        let base_url = ha_base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        info!("🏠 [HA] Using {base_url}");
        Self::new(base_url, token)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// WebSocket endpoint derived from the REST base URL
    ///
    /// The Supervisor proxy exposes it as `<base>/websocket`, a direct instance as
    /// `<base>/api/websocket`.
    #[must_use]
    pub fn websocket_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };

        if ws_base.ends_with("/core") {
            format!("{ws_base}/websocket")
        } else {
            format!("{ws_base}/api/websocket")
        }
    }

    /// GET `<base><path>` with retries, decoding a 200 body as `T`
    async fn rest_get<T: DeserializeOwned>(&self, path: &str) -> HaResult<T> {
        let url = format!("{}{path}", self.base_url);
        trace!("   GET {url}");

        let response = self
            .retry_request(|| async { self.client.get(&url).bearer_auth(&self.token).send().await })
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json::<T>().await?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("❌ [HA ERROR] Token rejected for {path}");
                Err(HaError::AuthenticationFailed)
            }
            status => Err(HaError::ApiError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Current state of one entity, used to check configured sensors
    pub async fn get_state(&self, entity_id: &str) -> HaResult<HaEntityState> {
        debug!("🔍 [HA QUERY] State of {entity_id}");

        match self.rest_get::<HaEntityState>(&format!("/api/states/{entity_id}")).await {
            Ok(state) => {
                debug!("✅ [HA RESULT] {entity_id} = '{}'", state.state);
                Ok(state)
            }
            Err(HaError::ApiError { status: 404, .. }) => {
                warn!("⚠️ [HA ERROR] Unknown entity: {entity_id}");
                Err(HaError::EntityNotFound(entity_id.to_owned()))
            }
            Err(e) => Err(e),
        }
    }

    /// Whether the REST API answers with a success status; transport errors count as down
    pub async fn ping(&self) -> HaResult<bool> {
        let url = format!("{}/api/", self.base_url);

        let reachable = match self.client.get(&url).bearer_auth(&self.token).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!("⚠️ [HA PING] {} answered {}", self.base_url, response.status());
                false
            }
            Err(e) => {
                warn!("⚠️ [HA PING] {} unreachable: {e}", self.base_url);
                false
            }
        };
        Ok(reachable)
    }

    /// `/api/config` as raw JSON
    pub async fn get_config(&self) -> HaResult<Value> {
        self.rest_get("/api/config").await
    }

    /// IANA timezone name the host uses for calendar days
    pub async fn get_timezone(&self) -> HaResult<String> {
        let config = self.get_config().await?;
        let timezone = config
            .get("time_zone")
            .and_then(Value::as_str)
            .ok_or_else(|| HaError::ConfigError("time_zone missing from /api/config".to_owned()))?;

        debug!("🌍 [HA CONFIG] Timezone {timezone}");
        Ok(timezone.to_owned())
    }

    /// Open an authenticated WebSocket connection
    pub async fn connect_websocket(&self) -> HaResult<HaWebSocket> {
        HaWebSocket::connect(&self.websocket_url(), &self.token, self.ws_timeout).await
    }

    /// Run one WebSocket command on a fresh connection
    async fn ws_command(&self, command: &str, params: Value) -> HaResult<Value> {
        let mut socket = self.connect_websocket().await?;
        let result = socket.command(command, params).await;
        socket.close().await;
        result
    }

    /// Long-term statistics buckets of `[start, end)` at `period` granularity
    pub async fn statistics_during_period(
        &self,
        statistic_ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        period: &str,
    ) -> HaResult<HashMap<String, Vec<HaStatisticRow>>> {
        info!(
            "📊 [HA STATISTICS] {} statistics from {} to {} per {}",
            statistic_ids.len(),
            start,
            end,
            period
        );
        let result = self
            .ws_command(
                "recorder/statistics_during_period",
                json!({
                    "start_time": start.to_rfc3339_opts(SecondsFormat::Secs, true),
                    "end_time": end.to_rfc3339_opts(SecondsFormat::Secs, true),
                    "statistic_ids": statistic_ids,
                    "period": period,
                    "types": ["state", "sum", "change"],
                }),
            )
            .await?;

        if result.is_null() {
            return Ok(HashMap::new());
        }
        let rows: HashMap<String, Vec<HaStatisticRow>> = serde_json::from_value(result)?;
        debug!(
            "✅ [HA STATISTICS] {} buckets for {}/{} statistics",
            rows.values().map(Vec::len).sum::<usize>(),
            rows.len(),
            statistic_ids.len()
        );
        Ok(rows)
    }

    /// Units and names of the given statistics
    pub async fn statistics_metadata(
        &self,
        statistic_ids: &[String],
    ) -> HaResult<Vec<HaStatisticMetadata>> {
        let result = self
            .ws_command(
                "recorder/get_statistics_metadata",
                json!({ "statistic_ids": statistic_ids }),
            )
            .await?;

        if result.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(result)?)
    }

    /// Raw energy dashboard preferences
    pub async fn energy_prefs(&self) -> HaResult<Value> {
        self.ws_command("energy/get_prefs", Value::Null).await
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut>(&self, mut request_fn: F) -> HaResult<reqwest::Response>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempts = 0;
        let mut delay = self.retry_delay;

        loop {
            attempts += 1;
            match request_fn().await {
                Ok(response) => return Ok(response),
                Err(e) if attempts >= self.max_retries => {
                    error!("❌ [HA HTTP] Giving up after {attempts} attempts: {e}");
                    return Err(HaError::HttpError(e));
                }
                Err(e) => {
                    warn!(
                        "⚠️ [HA HTTP] Attempt {attempts}/{} failed: {e}, retrying in {delay:?}",
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }

    /// Attempts per REST request and the first backoff delay
    #[must_use]
    pub fn with_retry_config(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Set how long to wait for each WebSocket reply
    #[must_use]
    pub fn with_websocket_timeout(mut self, timeout: Duration) -> Self {
        self.ws_timeout = timeout;
        self
    }
}
