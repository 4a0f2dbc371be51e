use crate::config::{BackendConfig, MenuConfig};
use crate::error::GenerationError;
use crate::generation::{GenerativeModel, OllamaModel, OpenAiModel};
use std::sync::Arc;

/// Create a generation backend from configuration.
pub fn backend_for(
    name: &str,
    config: &BackendConfig,
) -> Result<Arc<dyn GenerativeModel>, GenerationError> {
    if !config.enabled {
        return Err(GenerationError::ModelUnavailable(format!(
            "Backend '{}' is not enabled in configuration",
            name
        )));
    }

    match name {
        "openai" => Ok(Arc::new(OpenAiModel::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaModel::new(config)?)),
        _ => Err(GenerationError::ModelUnavailable(format!(
            "Unknown backend: {}",
            name
        ))),
    }
}

/// Resolve the configured default backend.
pub fn default_backend(config: &MenuConfig) -> Result<Arc<dyn GenerativeModel>, GenerationError> {
    let name = &config.default_backend;
    let backend_config = config.backends.get(name).ok_or_else(|| {
        GenerationError::ModelUnavailable(format!(
            "Default backend '{}' not found in configuration",
            name
        ))
    })?;

    backend_for(name, backend_config)
}
