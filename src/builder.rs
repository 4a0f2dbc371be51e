use std::sync::Arc;
use std::time::Duration;

use crate::config::MenuConfig;
use crate::error::MenuError;
use crate::generation::{
    self, GenerationClient, GenerativeModel, DEFAULT_GENERATION_TIMEOUT,
};
use crate::model::{LangTag, Profile, Settings};
use crate::pipeline::{MenuPipeline, RunOutcome};
use crate::profile::ProfileStore;
use crate::translation::{HttpTranslator, TranslationStage, Translator};

/// Builder for configuring and executing one menu analysis run
#[derive(Default)]
pub struct MenuAnalyzerBuilder {
    lines: Option<Vec<String>>,
    profile: Option<Profile>,
    source: Option<LangTag>,
    target: Option<LangTag>,
    model: Option<Arc<dyn GenerativeModel>>,
    translator: Option<Box<dyn Translator>>,
    timeout: Option<Duration>,
    combined_evaluation: bool,
    config: Option<MenuConfig>,
}

impl MenuAnalyzerBuilder {
    /// Set the scanned menu lines to analyze
    ///
    /// # Example
    /// ```
    /// use menulens::MenuAnalyzer;
    ///
    /// let builder = MenuAnalyzer::builder()
    ///     .lines(["Primi Piatti", "Carbonara - eggs, pancetta - €12"]);
    /// ```
    pub fn lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines = Some(lines.into_iter().map(Into::into).collect());
        self
    }

    /// Set the dietary profile the meals are evaluated against
    ///
    /// Without a profile the evaluation stage is skipped and every
    /// meal keeps its default eligibility.
    ///
    /// # Example
    /// ```
    /// use menulens::{Diet, MenuAnalyzer, Profile};
    ///
    /// let builder = MenuAnalyzer::builder()
    ///     .lines(["Carbonara - eggs - €12"])
    ///     .profile(Profile::new(Diet::Vegan, vec!["eggs".to_string()]));
    /// ```
    pub fn profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Set the language the menu is written in (default "it")
    pub fn source_language(mut self, tag: impl Into<LangTag>) -> Self {
        self.source = Some(tag.into());
        self
    }

    /// Set the language to translate the menu into (default "en")
    pub fn target_language(mut self, tag: impl Into<LangTag>) -> Self {
        self.target = Some(tag.into());
        self
    }

    /// Use a specific generative-model collaborator instead of the
    /// configured backend. Useful for tests and embedders that manage
    /// their own model session.
    pub fn generative_model(mut self, model: Arc<dyn GenerativeModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Use a specific translation collaborator instead of the
    /// configured HTTP service.
    pub fn translator(mut self, translator: Box<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Set the per-call timeout for external collaborators
    ///
    /// # Example
    /// ```
    /// use menulens::MenuAnalyzer;
    /// use std::time::Duration;
    ///
    /// let builder = MenuAnalyzer::builder()
    ///     .lines(["Carbonara - €12"])
    ///     .timeout(Duration::from_secs(10));
    /// ```
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Merge dietary evaluation and re-ordering into one model call.
    /// The deterministic eligible-first sort still runs afterwards.
    pub fn combined_evaluation(mut self) -> Self {
        self.combined_evaluation = true;
        self
    }

    /// Use an already-loaded configuration instead of reading
    /// `config.toml` and `MENULENS__*` environment variables.
    pub fn config(mut self, config: MenuConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the pipeline, run it once and wait for the outcome
    ///
    /// # Errors
    /// Returns `MenuError` if no lines were provided or the
    /// collaborators cannot be resolved from configuration. Stage
    /// failures inside the run are reported through the returned
    /// `RunOutcome`, not as an `Err`.
    ///
    /// # Example
    /// ```no_run
    /// # use menulens::MenuAnalyzer;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), menulens::MenuError> {
    /// let outcome = MenuAnalyzer::builder()
    ///     .lines(["Primi Piatti", "Carbonara - eggs, pancetta - €12"])
    ///     .build()
    ///     .await?;
    /// println!("{} meals", outcome.meals.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn build(self) -> Result<RunOutcome, MenuError> {
        let lines = self.lines.ok_or_else(|| {
            MenuError::Builder("No scanned lines provided. Use .lines()".to_string())
        })?;

        // Injected collaborators win; anything missing is resolved
        // from configuration.
        let (model, translator, config_timeout, config_combined) =
            match (self.model, self.translator) {
                (Some(model), Some(translator)) => (model, translator, None, false),
                (model, translator) => {
                    let config = match self.config {
                        Some(config) => config,
                        None => MenuConfig::load()?,
                    };
                    let model = match model {
                        Some(model) => model,
                        None => generation::default_backend(&config)?,
                    };
                    let translator: Box<dyn Translator> = match translator {
                        Some(translator) => translator,
                        None => Box::new(HttpTranslator::new(&config.translation)),
                    };
                    (
                        model,
                        translator,
                        Some(config.timeout_duration()),
                        config.combined_evaluation,
                    )
                }
            };

        let timeout = self
            .timeout
            .or(config_timeout)
            .unwrap_or(DEFAULT_GENERATION_TIMEOUT);
        let combined_evaluation = self.combined_evaluation || config_combined;
        let defaults = Settings::default();
        let settings = Settings {
            source_language: self.source.unwrap_or(defaults.source_language),
            target_language: self.target.unwrap_or(defaults.target_language),
            profile: self.profile,
        };

        let pipeline = MenuPipeline::with_options(
            GenerationClient::with_timeout(model, timeout),
            TranslationStage::new(translator),
            Arc::new(ProfileStore::in_memory(settings)),
            combined_evaluation,
        );

        let handle = pipeline.submit(lines).await;
        Ok(handle.wait().await)
    }
}

/// Main entry point for the builder API
pub struct MenuAnalyzer;

impl MenuAnalyzer {
    /// Creates a new builder for one-shot menu analysis
    ///
    /// # Example
    /// ```
    /// use menulens::MenuAnalyzer;
    ///
    /// let builder = MenuAnalyzer::builder();
    /// ```
    pub fn builder() -> MenuAnalyzerBuilder {
        MenuAnalyzerBuilder::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_without_lines_is_a_builder_error() {
        let result = MenuAnalyzer::builder().build().await;

        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("No scanned lines provided"));
    }

    #[tokio::test]
    async fn test_builder_method_chaining() {
        let builder = MenuAnalyzer::builder()
            .lines(["Carbonara - €12"])
            .source_language("it")
            .target_language("en")
            .timeout(Duration::from_secs(5))
            .combined_evaluation();

        assert!(builder.lines.is_some());
        assert!(builder.combined_evaluation);
        assert_eq!(builder.timeout, Some(Duration::from_secs(5)));
    }
}
