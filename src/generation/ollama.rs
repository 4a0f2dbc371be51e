use crate::config::BackendConfig;
use crate::error::GenerationError;
use crate::generation::open_ai::map_transport_error;
use crate::generation::GenerativeModel;
use crate::schema::SchemaId;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

/// Local-model backend. Plays the role the on-device system model
/// plays on phones: no api key, everything stays on the machine.
pub struct OllamaModel {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaModel {
    /// Create a new Ollama backend from configuration
    pub fn new(config: &BackendConfig) -> Result<Self, GenerationError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string());

        Ok(OllamaModel {
            client: Client::new(),
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(base_url: String, model: String) -> Self {
        OllamaModel {
            client: Client::new(),
            base_url,
            model,
            temperature: 0.2,
        }
    }
}

#[async_trait]
impl GenerativeModel for OllamaModel {
    fn model_name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, prompt: &str, _schema: SchemaId) -> Result<Value, GenerationError> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "format": "json",
                "stream": false,
                "options": {"temperature": self.temperature}
            }))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 404 {
                // Ollama answers 404 when the model is not pulled
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
        debug!("Ollama response: {:?}", response_body);

        if let Some(error) = response_body.get("error").and_then(Value::as_str) {
            return Err(GenerationError::Unknown(format!(
                "Ollama API error: {}",
                error
            )));
        }

        let content = response_body["response"].as_str().ok_or_else(|| {
            GenerationError::InvalidResponse(
                "Failed to extract response field from Ollama reply".to_string(),
            )
        })?;

        serde_json::from_str(content)
            .map_err(|e| GenerationError::InvalidResponse(format!("Content is not JSON: {}", e)))
    }
}
