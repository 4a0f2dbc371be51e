use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;

/// Main crate configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct MenuConfig {
    /// Generation backend to use when not specified
    #[serde(default = "default_backend")]
    pub default_backend: String,
    /// Map of backend name to backend configuration
    #[serde(default)]
    pub backends: HashMap<String, BackendConfig>,
    /// Translation collaborator configuration
    #[serde(default)]
    pub translation: TranslationConfig,
    /// Per-call timeout in seconds for external collaborators
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Merge dietary evaluation and re-ordering into one model call
    #[serde(default)]
    pub combined_evaluation: bool,
}

/// Configuration for a specific generation backend.
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Whether this backend is enabled
    pub enabled: bool,
    /// Model identifier (e.g., "gpt-4o-mini", "llama3")
    pub model: String,
    /// Temperature for generation (0.0-1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// API key for authentication (can also be set via environment variable)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for custom or proxy endpoints)
    pub base_url: Option<String>,
}

/// Configuration for the translation collaborator.
#[derive(Debug, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Base URL of the translation service
    #[serde(default = "default_translation_url")]
    pub base_url: String,
    /// API key, when the service requires one
    pub api_key: Option<String>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            base_url: default_translation_url(),
            api_key: None,
        }
    }
}

// Default value functions
fn default_backend() -> String {
    "openai".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_timeout() -> u64 {
    30
}

fn default_translation_url() -> String {
    "http://localhost:5000".to_string()
}

impl MenuConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with MENULENS__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: MENULENS__BACKENDS__OPENAI__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            // Optional config file (can be missing)
            .add_source(File::with_name("config").required(false))
            // Use double underscore for nested: MENULENS__BACKENDS__OPENAI__API_KEY
            .add_source(
                Environment::with_prefix("MENULENS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Timeout as a `Duration` for the collaborator clients.
    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout)
    }
}
