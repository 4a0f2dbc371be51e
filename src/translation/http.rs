use crate::config::TranslationConfig;
use crate::error::TranslationError;
use crate::model::LangTag;
use crate::translation::Translator;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// HTTP translation backend speaking the LibreTranslate batch API:
/// one POST per batch, an array of source strings in, an array of
/// target strings in the same order out.
pub struct HttpTranslator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a [String],
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: Vec<String>,
}

impl HttpTranslator {
    /// Create a new translation backend from configuration
    pub fn new(config: &TranslationConfig) -> Self {
        HttpTranslator {
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    #[doc(hidden)]
    pub fn with_base_url(base_url: String) -> Self {
        HttpTranslator {
            client: Client::new(),
            base_url,
            api_key: None,
        }
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(
        &self,
        lines: &[String],
        source: &LangTag,
        target: &LangTag,
    ) -> Result<Vec<String>, TranslationError> {
        let response = self
            .client
            .post(format!("{}/translate", self.base_url))
            .json(&TranslateRequest {
                q: lines,
                source: source.as_str(),
                target: target.as_str(),
                format: "text",
                api_key: self.api_key.as_deref(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslationError::Backend(format!("{}: {}", status, body)));
        }

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|e| TranslationError::Backend(format!("Undecodable response: {}", e)))?;

        debug!(
            "Translation service answered with {} lines",
            body.translated_text.len()
        );
        Ok(body.translated_text)
    }
}
