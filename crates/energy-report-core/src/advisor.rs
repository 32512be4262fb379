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

use async_trait::async_trait;
use energy_report_i18n::{I18n, Language};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::traits::AdviceProvider;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const TEMPERATURE: f64 = 0.6;
const MAX_TOKENS: u32 = 600;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

/// Chat-completions client producing advice from a report conclusion
#[derive(Debug, Clone)]
pub struct OpenAiAdvisor {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenAiAdvisor {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key: api_key.into().trim().to_owned(),
            api_url: DEFAULT_API_URL.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
        })
    }

    /// Point the advisor at another chat-completions endpoint
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn payload(&self, conclusion: &str, i18n: &I18n) -> Value {
        let user_message = format!(
            "{}:\n{conclusion}\n\n{}: {}",
            i18n.text("advice-conclusion-label"),
            i18n.text("advice-instruction-label"),
            i18n.text("advice-user-instruction"),
        );
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": i18n.text("advice-system-prompt")},
                {"role": "user", "content": user_message},
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        })
    }
}

#[async_trait]
impl AdviceProvider for OpenAiAdvisor {
    async fn advise(&self, conclusion: &str, language: Language) -> Option<String> {
        let conclusion = conclusion.trim();
        if self.api_key.is_empty() {
            debug!("No OpenAI API key configured, skipping advice");
            return None;
        }
        if conclusion.is_empty() {
            debug!("Empty conclusion, skipping advice");
            return None;
        }

        let i18n = match I18n::new(language) {
            Ok(i18n) => i18n,
            Err(e) => {
                warn!("⚠️ [ADVICE] Failed to load prompts for {language}: {e}");
                return None;
            }
        };

        info!("🤖 [ADVICE] Requesting advice ({language}, model {})", self.model);
        let response = match self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.payload(conclusion, &i18n))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!("⚠️ [ADVICE] OpenAI request timed out");
                return None;
            }
            Err(e) => {
                warn!("⚠️ [ADVICE] OpenAI request failed: {e}");
                return None;
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!("⚠️ [ADVICE] OpenAI API error (status: {status}): {body}");
            return None;
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!("⚠️ [ADVICE] Malformed OpenAI response: {e}");
                return None;
            }
        };

        let advice = extract_advice(&body);
        if advice.is_none() {
            warn!("⚠️ [ADVICE] OpenAI response contained no advice");
        }
        advice
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}

/// Text of the first choice; the content may be a string or a list of text parts
fn extract_advice(body: &Value) -> Option<String> {
    let content = body.pointer("/choices/0/message/content")?;
    let advice = match content {
        Value::String(text) => text.trim().to_owned(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<String>()
            .trim()
            .to_owned(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::Object(_) => String::new(),
    };
    (!advice.is_empty()).then_some(advice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn reply(content: &Value) -> String {
        json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]})
            .to_string()
    }

    #[test]
    fn test_extract_advice_variants() {
        let text = json!({"choices": [{"message": {"content": "  Shift loads to noon. "}}]});
        assert_eq!(extract_advice(&text).as_deref(), Some("Shift loads to noon."));

        let parts = json!({"choices": [{"message": {"content": [
            {"type": "text", "text": "Part one. "},
            {"type": "image"},
            {"type": "text", "text": "Part two."}
        ]}}]});
        assert_eq!(extract_advice(&parts).as_deref(), Some("Part one. Part two."));

        assert_eq!(extract_advice(&json!({"choices": []})), None);
        assert_eq!(
            extract_advice(&json!({"choices": [{"message": {"content": "  "}}]})),
            None
        );
    }

    #[tokio::test]
    async fn test_advise_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "temperature": 0.6,
                "max_tokens": 600
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(reply(&json!("Install a heat pump timer.")))
            .create_async()
            .await;

        let advisor = OpenAiAdvisor::new("sk-test")
            .unwrap()
            .with_api_url(format!("{}/v1/chat/completions", server.url()));
        let advice = advisor
            .advise("Solar production reached 5.000 kWh.", Language::English)
            .await;

        assert_eq!(advice.as_deref(), Some("Install a heat pump timer."));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_prompt_is_localized() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(Matcher::Regex("Nederlands".to_owned()))
            .with_status(200)
            .with_body(reply(&json!("Advies")))
            .create_async()
            .await;

        let advisor = OpenAiAdvisor::new("sk-test")
            .unwrap()
            .with_api_url(format!("{}/v1/chat/completions", server.url()));
        assert!(advisor.advise("Conclusie", Language::Dutch).await.is_some());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_gives_none() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body(r#"{"error": {"message": "invalid key"}}"#)
            .create_async()
            .await;

        let advisor = OpenAiAdvisor::new("sk-bad")
            .unwrap()
            .with_api_url(format!("{}/v1/chat/completions", server.url()));
        assert_eq!(advisor.advise("Conclusion", Language::French).await, None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body_gives_none() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let advisor = OpenAiAdvisor::new("sk-test")
            .unwrap()
            .with_api_url(format!("{}/v1/chat/completions", server.url()));
        assert_eq!(advisor.advise("Conclusion", Language::English).await, None);
    }

    #[tokio::test]
    async fn test_missing_key_or_conclusion_skips_request() {
        let advisor = OpenAiAdvisor::new("  ")
            .unwrap()
            .with_api_url("http://127.0.0.1:9/unreachable");
        assert_eq!(advisor.advise("Conclusion", Language::English).await, None);

        let advisor = OpenAiAdvisor::new("sk-test")
            .unwrap()
            .with_api_url("http://127.0.0.1:9/unreachable");
        assert_eq!(advisor.advise("   ", Language::English).await, None);
    }
}
