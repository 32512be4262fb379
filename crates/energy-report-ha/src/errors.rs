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

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Home Assistant access error types
#[derive(Error, Debug)]
pub enum HaError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),

    #[error("Unexpected WebSocket message: {0}")]
    Protocol(String),

    #[error("Command {command} failed ({code}): {message}")]
    CommandFailed {
        command: String,
        code: String,
        message: String,
    },

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<tungstenite::Error> for HaError {
    fn from(error: tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(error))
    }
}

impl HaError {
    /// Whether a command failed because the requested data does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::EntityNotFound(_) => true,
            Self::CommandFailed { code, .. } => code == "not_found",
            Self::ApiError { status, .. } => *status == 404,
            Self::ConfigError(_)
            | Self::AuthenticationFailed
            | Self::HttpError(_)
            | Self::WebSocket(_)
            | Self::Protocol(_)
            | Self::Timeout(_)
            | Self::Json(_) => false,
        }
    }
}

pub type HaResult<T> = Result<T, HaError>;
