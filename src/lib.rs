//! Menu scanning pipeline.
//!
//! Takes the raw text lines an OCR layer scanned off a menu, runs
//! them through translation, meal extraction and dietary evaluation,
//! and produces a ranked, safety-annotated list of distinct meals.
//! OCR, translation and the generative model itself are external
//! collaborators; this crate only orchestrates them.

pub mod builder;
pub mod config;
pub mod error;
pub mod generation;
pub mod model;
pub mod pipeline;
pub mod profile;
pub mod prompts;
pub mod schema;
pub mod translation;

pub use builder::{MenuAnalyzer, MenuAnalyzerBuilder};
pub use config::{BackendConfig, MenuConfig, TranslationConfig};
pub use error::{GenerationError, MenuError, ProfileError, StageError, TranslationError};
pub use generation::{GenerationClient, GenerativeModel, OllamaModel, OpenAiModel};
pub use model::{Diet, LangTag, Meal, MenuAnalysis, Profile, Settings};
pub use pipeline::{MenuPipeline, RunHandle, RunOutcome, RunStatus, Stage};
pub use profile::{JsonFileBackend, MemoryBackend, ProfileStore, SettingsBackend};
pub use prompts::Prompt;
pub use schema::{SchemaId, SchemaValidator};
pub use translation::{HttpTranslator, TranslationStage, Translator};

/// Analyze scanned menu lines with everything resolved from
/// configuration (`config.toml` + `MENULENS__*` environment).
pub async fn analyze_menu(lines: Vec<String>) -> Result<RunOutcome, MenuError> {
    MenuAnalyzer::builder().lines(lines).build().await
}

/// Like [`analyze_menu`], but evaluates the meals against the given
/// dietary profile.
pub async fn analyze_menu_for(
    lines: Vec<String>,
    profile: Profile,
) -> Result<RunOutcome, MenuError> {
    MenuAnalyzer::builder()
        .lines(lines)
        .profile(profile)
        .build()
        .await
}
