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

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Map, Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, trace, warn};

use crate::errors::{HaError, HaResult};
use crate::types::WsMessage;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Authenticated connection to the Home Assistant WebSocket API
///
/// Commands are sent one at a time; each reply is matched on its `id` and any
/// interleaved event is skipped.
#[derive(Debug)]
pub struct HaWebSocket {
    stream: WsStream,
    next_id: u64,
    timeout: Duration,
}

impl HaWebSocket {
    /// Connect to `url` and complete the `auth` handshake
    pub async fn connect(url: &str, token: &str, timeout: Duration) -> HaResult<Self> {
        debug!("🔌 [HA WS] Connecting to {}", url);
        let (stream, _) = tokio::time::timeout(timeout, connect_async(url))
            .await
            .map_err(|_| HaError::Timeout(format!("WebSocket connection to {url}")))??;

        let mut socket = Self {
            stream,
            next_id: 1,
            timeout,
        };
        socket.authenticate(token).await?;
        Ok(socket)
    }

    async fn authenticate(&mut self, token: &str) -> HaResult<()> {
        let hello = self.receive("auth_required").await?;
        if hello.kind != "auth_required" {
            return Err(HaError::Protocol(format!(
                "expected auth_required, got {}",
                hello.kind
            )));
        }

        self.send(&json!({"type": "auth", "access_token": token})).await?;
        let reply = self.receive("auth_ok").await?;
        match reply.kind.as_str() {
            "auth_ok" => {
                info!(
                    "✅ [HA WS] Authenticated (Home Assistant {})",
                    reply.ha_version.as_deref().unwrap_or("unknown")
                );
                Ok(())
            }
            "auth_invalid" => {
                error!(
                    "❌ [HA WS] Authentication rejected: {}",
                    reply.message.unwrap_or_default()
                );
                Err(HaError::AuthenticationFailed)
            }
            other => Err(HaError::Protocol(format!("expected auth_ok, got {other}"))),
        }
    }

    /// Run one command and return its `result` payload
    ///
    /// `params` must be a JSON object (or null); `id` and `type` are added here.
    pub async fn command(&mut self, command: &str, params: Value) -> HaResult<Value> {
        let mut payload = match params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(HaError::Protocol(format!(
                    "parameters of {command} must be an object, got {other}"
                )));
            }
        };
        let id = self.next_id;
        self.next_id += 1;
        payload.insert("id".to_owned(), json!(id));
        payload.insert("type".to_owned(), json!(command));

        debug!("🔍 [HA WS] #{} {}", id, command);
        self.send(&Value::Object(payload)).await?;

        loop {
            let message = self.receive(command).await?;
            if message.id != Some(id) || message.kind != "result" {
                trace!("   Skipping {} message (id {:?})", message.kind, message.id);
                continue;
            }

            if message.success == Some(true) {
                debug!("✅ [HA WS] #{} {} succeeded", id, command);
                return Ok(message.result.unwrap_or(Value::Null));
            }

            let failure = message.error.unwrap_or_default();
            warn!(
                "⚠️ [HA WS] #{} {} failed: {} {}",
                id, command, failure.code, failure.message
            );
            return Err(HaError::CommandFailed {
                command: command.to_owned(),
                code: failure.code,
                message: failure.message,
            });
        }
    }

    /// Close the connection; failures are only logged
    pub async fn close(mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!("WebSocket close failed: {}", e);
        }
    }

    async fn send(&mut self, value: &Value) -> HaResult<()> {
        self.stream.send(Message::Text(value.to_string())).await?;
        Ok(())
    }

    async fn receive(&mut self, waiting_for: &str) -> HaResult<WsMessage> {
        loop {
            let next = tokio::time::timeout(self.timeout, self.stream.next())
                .await
                .map_err(|_| HaError::Timeout(waiting_for.to_owned()))?;

            let frame = match next {
                Some(frame) => frame?,
                None => {
                    return Err(HaError::Protocol(format!(
                        "connection closed while waiting for {waiting_for}"
                    )));
                }
            };

            match frame {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Binary(bytes) => return Ok(serde_json::from_slice(&bytes)?),
                Message::Close(_) => {
                    return Err(HaError::Protocol(format!(
                        "Home Assistant closed the connection while waiting for {waiting_for}"
                    )));
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }
}
