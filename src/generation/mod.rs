mod factory;
mod ollama;
mod open_ai;

pub use factory::{backend_for, default_backend};
pub use ollama::OllamaModel;
pub use open_ai::OpenAiModel;

use crate::error::GenerationError;
use crate::model::Meal;
use crate::prompts::Prompt;
use crate::schema::{SchemaId, SchemaValidator};
use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;

/// Unified trait for generative-model collaborators.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Get the backend name (e.g., "openai", "ollama")
    fn model_name(&self) -> &str;

    /// Answer a prompt with a value claiming to conform to `schema`.
    async fn generate(&self, prompt: &str, schema: SchemaId) -> Result<Value, GenerationError>;
}

/// Thin wrapper around one generative-model collaborator handle.
///
/// Adds the guarantees the orchestrator relies on: a bounded per-call
/// timeout, a single automatic retry on timeout, schema validation of
/// every success, and serialization of concurrent prompt calls since
/// the collaborator session may not be reentrant. The handle is
/// acquired once per pipeline instance and released with it.
pub struct GenerationClient {
    model: Arc<dyn GenerativeModel>,
    timeout: Duration,
    // One in-flight prompt per collaborator session
    serialize: Mutex<()>,
}

pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

impl GenerationClient {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self::with_timeout(model, DEFAULT_GENERATION_TIMEOUT)
    }

    pub fn with_timeout(model: Arc<dyn GenerativeModel>, timeout: Duration) -> Self {
        GenerationClient {
            model,
            timeout,
            serialize: Mutex::new(()),
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Run one prompt and return the validated meal list.
    ///
    /// A response that validates to an empty list is still a success:
    /// an empty menu is valid, not an error.
    pub async fn generate_meals(&self, prompt: &Prompt) -> Result<Vec<Meal>, GenerationError> {
        let _session = self.serialize.lock().await;

        let value = self.generate_with_retry(prompt).await?;
        let meals = SchemaValidator::validate_meals(&value);
        debug!(
            "{} returned {} well-formed meals",
            self.model.model_name(),
            meals.len()
        );
        Ok(meals)
    }

    /// At most one automatic retry, and only for timeouts. Every
    /// other failure propagates immediately.
    async fn generate_with_retry(&self, prompt: &Prompt) -> Result<Value, GenerationError> {
        let mut retried = false;
        loop {
            let result = match timeout(
                self.timeout,
                self.model.generate(&prompt.text, prompt.schema),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(GenerationError::Timeout),
            };

            match result {
                Err(err) if err.is_timeout() && !retried => {
                    warn!(
                        "{} timed out, retrying once: {}",
                        self.model.model_name(),
                        err
                    );
                    retried = true;
                }
                other => return other,
            }
        }
    }
}
