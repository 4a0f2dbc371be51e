use crate::config::BackendConfig;
use crate::error::GenerationError;
use crate::generation::GenerativeModel;
use crate::schema::SchemaId;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

const SYSTEM_PROMPT: &str =
    "Respond with a single JSON object conforming to the requested schema. No prose, no markdown.";

pub struct OpenAiModel {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiModel {
    /// Create a new OpenAI backend from configuration
    pub fn new(config: &BackendConfig) -> Result<Self, GenerationError> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                GenerationError::ModelUnavailable(
                    "OPENAI_API_KEY not found in config or environment".to_string(),
                )
            })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com".to_string());

        Ok(OpenAiModel {
            client: Client::new(),
            api_key,
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        OpenAiModel {
            client: Client::new(),
            api_key,
            base_url,
            model,
            temperature: 0.2,
            max_tokens: 2000,
        }
    }
}

#[async_trait]
impl GenerativeModel for OpenAiModel {
    fn model_name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, prompt: &str, _schema: SchemaId) -> Result<Value, GenerationError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": SYSTEM_PROMPT},
                    {"role": "user", "content": prompt}
                ],
                "response_format": {"type": "json_object"},
                "temperature": self.temperature,
                "max_tokens": self.max_tokens
            }))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 503 || status.as_u16() == 404 {
                return Err(GenerationError::ModelUnavailable(format!(
                    "{}: {}",
                    status, body
                )));
            }
            return Err(GenerationError::Unknown(format!("{}: {}", status, body)));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
        debug!("OpenAI response: {:?}", response_body);

        let content = response_body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                GenerationError::InvalidResponse(
                    "Failed to extract content from response".to_string(),
                )
            })?;

        serde_json::from_str(content)
            .map_err(|e| GenerationError::InvalidResponse(format!("Content is not JSON: {}", e)))
    }
}

/// Map reqwest transport failures onto the generation error taxonomy.
pub(crate) fn map_transport_error(err: reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout
    } else if err.is_connect() {
        GenerationError::ModelUnavailable(err.to_string())
    } else {
        GenerationError::Unknown(err.to_string())
    }
}
