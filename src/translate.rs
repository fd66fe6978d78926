//! Text translation through an Azure OpenAI completions deployment.

use anyhow::{bail, Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::{require, CompletionConfig};

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    text: String,
}

pub struct Translator {
    client: reqwest::Client,
    url: String,
    key: String,
    api_version: String,
    max_tokens: u32,
}

impl Translator {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let endpoint = require(&config.endpoint, "AZURE_OPENAI_ENDPOINT")?;
        let key = require(&config.key, "AZURE_OPENAI_KEY")?;
        let api_version = require(&config.api_version, "AZURE_OPENAI_API_VERSION")?;
        anyhow::ensure!(
            config.api_type.eq_ignore_ascii_case("azure"),
            "unsupported completion api type: {}",
            config.api_type
        );
        Ok(Self {
            client: reqwest::Client::new(),
            url: format!(
                "{}/openai/deployments/{}/completions",
                endpoint.trim_end_matches('/'),
                config.deployment
            ),
            key: key.to_string(),
            api_version: api_version.to_string(),
            max_tokens: config.max_tokens,
        })
    }

    /// Translate `text` into `lang` (a language name such as "English" or "Japanese").
    pub async fn translate(&self, text: &str, lang: &str) -> Result<String> {
        tracing::info!(lang, "translating text");
        let body = serde_json::json!({
            "prompt": translation_prompt(text, lang),
            "max_tokens": self.max_tokens,
            "top_p": 1.0,
            "frequency_penalty": 0,
            "presence_penalty": 0,
            "best_of": 1,
            "stop": null,
        });

        let response = self
            .client
            .post(&self.url)
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", &self.key)
            .json(&body)
            .send()
            .await
            .context("completion request failed")?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            bail!("completion service returned HTTP {status}: {body}");
        }
        let parsed: CompletionResponse = response
            .json()
            .await
            .context("malformed completion response")?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .context("completion response has no choices")
    }
}

fn translation_prompt(text: &str, lang: &str) -> String {
    format!("Translate the following text to {lang}: {text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_target_language() {
        assert_eq!(
            translation_prompt("赤いスニーカー", "English"),
            "Translate the following text to English: 赤いスニーカー"
        );
    }

    #[test]
    fn rejects_non_azure_api_type() {
        let config = CompletionConfig {
            endpoint: "https://oai.example.com".into(),
            key: "k".into(),
            api_version: "2024-02-01".into(),
            api_type: "open_ai".into(),
            ..Default::default()
        };
        assert!(Translator::new(&config).is_err());
    }
}
