//! End-to-end pipeline scenarios over stub collaborators.

use async_trait::async_trait;
use menulens::{
    Diet, GenerationClient, GenerationError, GenerativeModel, LangTag, MenuPipeline, Profile,
    ProfileStore, RunStatus, SchemaId, Settings, Stage, StageError, TranslationError,
    TranslationStage, Translator,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Generation stub answering from a fixed script, one entry per call.
struct ScriptedModel {
    responses: Mutex<VecDeque<Result<Value, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(responses: Vec<Result<Value, GenerationError>>) -> Arc<Self> {
        Arc::new(ScriptedModel {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str, _schema: SchemaId) -> Result<Value, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Unknown("script exhausted".to_string())))
    }
}

/// Generation stub that never answers; only a cancel can end the call.
struct HangingModel;

impl HangingModel {
    fn new() -> Arc<Self> {
        Arc::new(HangingModel)
    }
}

#[async_trait]
impl GenerativeModel for HangingModel {
    fn model_name(&self) -> &str {
        "hanging"
    }

    async fn generate(&self, _prompt: &str, _schema: SchemaId) -> Result<Value, GenerationError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(GenerationError::Unknown("never reached".to_string()))
    }
}

/// Generation stub that must never be reached.
struct UnreachableModel;

#[async_trait]
impl GenerativeModel for UnreachableModel {
    fn model_name(&self) -> &str {
        "unreachable"
    }

    async fn generate(&self, _prompt: &str, _schema: SchemaId) -> Result<Value, GenerationError> {
        panic!("generation collaborator must not be invoked");
    }
}

/// Translation stub echoing the input back unchanged.
struct IdentityTranslator;

impl IdentityTranslator {
    fn boxed() -> Box<Self> {
        Box::new(IdentityTranslator)
    }
}

#[async_trait]
impl Translator for IdentityTranslator {
    async fn translate(
        &self,
        lines: &[String],
        _source: &LangTag,
        _target: &LangTag,
    ) -> Result<Vec<String>, TranslationError> {
        Ok(lines.to_vec())
    }
}

/// Translation stub that always fails.
struct DownTranslator;

#[async_trait]
impl Translator for DownTranslator {
    async fn translate(
        &self,
        _lines: &[String],
        _source: &LangTag,
        _target: &LangTag,
    ) -> Result<Vec<String>, TranslationError> {
        Err(TranslationError::Backend("service down".to_string()))
    }
}

/// Translation stub that must never be reached.
struct UnreachableTranslator;

#[async_trait]
impl Translator for UnreachableTranslator {
    async fn translate(
        &self,
        _lines: &[String],
        _source: &LangTag,
        _target: &LangTag,
    ) -> Result<Vec<String>, TranslationError> {
        panic!("translation collaborator must not be invoked");
    }
}

fn scanned_lines() -> Vec<String> {
    vec![
        "Primi Piatti".to_string(),
        "Carbonara - eggs, pancetta, pecorino - €12".to_string(),
        "Tiramisu - €6".to_string(),
    ]
}

fn extraction_response() -> Value {
    // "Primi Piatti" is a section heading: the model drops it
    json!({"meals": [
        {"name": "Carbonara", "ingredients": ["eggs", "pancetta", "pecorino"], "price": 12.0, "eligible": true},
        {"name": "Tiramisu", "ingredients": ["mascarpone", "coffee", "eggs"], "price": 6.0, "eligible": true}
    ]})
}

fn pipeline_with(
    model: Arc<dyn GenerativeModel>,
    translator: Box<dyn Translator>,
    profile: Option<Profile>,
) -> MenuPipeline {
    let settings = Settings {
        source_language: LangTag::new("it"),
        target_language: LangTag::new("en"),
        profile,
    };
    MenuPipeline::new(
        GenerationClient::with_timeout(model, Duration::from_secs(5)),
        TranslationStage::new(translator),
        Arc::new(ProfileStore::in_memory(settings)),
    )
}

/// Scenario: headings never become meals; without a profile the run
/// skips evaluation and sorts straight away.
#[tokio::test]
async fn test_extraction_drops_headings_and_skips_evaluation_without_profile() {
    init_logging();
    let model = ScriptedModel::new(vec![Ok(extraction_response())]);
    let pipeline = pipeline_with(model.clone(), IdentityTranslator::boxed(), None);

    let outcome = pipeline.submit(scanned_lines()).await.wait().await;

    assert_eq!(outcome.status, RunStatus::Sorted);
    let names: Vec<&str> = outcome.meals.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Carbonara", "Tiramisu"]);
    assert!(outcome.meals.iter().all(|m| m.eligible));

    // Exactly one model call: extraction only
    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Carbonara - eggs, pancetta, pecorino - €12"));
    assert!(prompts[0].contains("IGNORE menu section headers"));
}

/// Scenario: vegan diner allergic to eggs. Carbonara flips to
/// ineligible and the sorted output puts the safe meal first.
#[tokio::test]
async fn test_vegan_profile_puts_safe_meals_first() {
    init_logging();
    let evaluated = json!({"meals": [
        {"name": "Carbonara", "ingredients": ["eggs", "pancetta", "pecorino"], "price": 12.0, "eligible": false},
        {"name": "Tiramisu", "ingredients": ["mascarpone", "coffee"], "price": 6.0, "eligible": true}
    ]});
    let model = ScriptedModel::new(vec![Ok(extraction_response()), Ok(evaluated)]);
    let profile = Profile::new(Diet::Vegan, vec!["eggs".to_string()]);
    let pipeline = pipeline_with(model.clone(), IdentityTranslator::boxed(), Some(profile));

    let outcome = pipeline.submit(scanned_lines()).await.wait().await;

    assert_eq!(outcome.status, RunStatus::Sorted);
    let names: Vec<&str> = outcome.meals.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Tiramisu", "Carbonara"]);
    assert!(outcome.meals[0].eligible);
    assert!(!outcome.meals[1].eligible);

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("Diet: Vegan"));
    assert!(prompts[1].contains("Allergies: eggs"));
}

/// Empty input never reaches any collaborator and stays Idle.
#[tokio::test]
async fn test_empty_input_is_a_no_op() {
    init_logging();
    let pipeline = pipeline_with(
        Arc::new(UnreachableModel),
        Box::new(UnreachableTranslator),
        Some(Profile::new(Diet::Vegan, Vec::new())),
    );

    let handle = pipeline.submit(Vec::new()).await;
    assert_eq!(handle.status(), RunStatus::Idle);

    let outcome = handle.wait().await;
    assert_eq!(outcome.status, RunStatus::Idle);
    assert!(outcome.meals.is_empty());
    assert!(outcome.error.is_none());
}

/// Scenario: a second submission while the first run is extracting
/// cancels the first run. Its final state is Cancelled, never Sorted.
#[tokio::test]
async fn test_second_submission_cancels_in_flight_run() {
    init_logging();
    let hanging = HangingModel::new();
    let settings = Settings {
        source_language: LangTag::new("it"),
        target_language: LangTag::new("en"),
        profile: None,
    };
    let pipeline = MenuPipeline::new(
        GenerationClient::with_timeout(hanging.clone(), Duration::from_secs(3600)),
        TranslationStage::new(IdentityTranslator::boxed()),
        Arc::new(ProfileStore::in_memory(settings)),
    );

    let first = pipeline.submit(scanned_lines()).await;
    let mut status = first.subscribe();
    while *status.borrow() != RunStatus::Running(Stage::Extracting) {
        status.changed().await.unwrap();
    }

    let second = pipeline.submit(scanned_lines()).await;

    let outcome = first.wait().await;
    assert_eq!(outcome.status, RunStatus::Cancelled);
    assert!(outcome.meals.is_empty());

    second.cancel();
    let outcome = second.wait().await;
    assert_eq!(outcome.status, RunStatus::Cancelled);
}

/// Translation failure aborts the run at the Translating stage with
/// nothing to show.
#[tokio::test]
async fn test_translation_failure_fails_the_run() {
    init_logging();
    let model = ScriptedModel::new(Vec::new());
    let pipeline = pipeline_with(model.clone(), Box::new(DownTranslator), None);

    let outcome = pipeline.submit(scanned_lines()).await.wait().await;

    assert_eq!(outcome.status, RunStatus::Failed(Stage::Translating));
    assert!(outcome.meals.is_empty());
    assert!(matches!(outcome.error, Some(StageError::Translation(_))));
    assert!(model.prompts().is_empty());
}

/// Evaluation failure surfaces partial success: the extracted meals
/// survive, unevaluated.
#[tokio::test]
async fn test_evaluation_failure_keeps_extracted_meals() {
    init_logging();
    let model = ScriptedModel::new(vec![
        Ok(extraction_response()),
        Err(GenerationError::ModelUnavailable("model not ready".to_string())),
    ]);
    let profile = Profile::new(Diet::Vegan, vec!["eggs".to_string()]);
    let pipeline = pipeline_with(model, IdentityTranslator::boxed(), Some(profile));

    let outcome = pipeline.submit(scanned_lines()).await.wait().await;

    assert_eq!(outcome.status, RunStatus::Failed(Stage::Evaluating));
    assert_eq!(outcome.meals.len(), 2);
    assert!(outcome.meals.iter().all(|m| m.eligible));
    assert!(matches!(outcome.error, Some(StageError::Generation(_))));
}

/// The combined fast path issues one evaluate+sort call, and the
/// deterministic partition still runs on whatever the model returns.
#[tokio::test]
async fn test_combined_evaluation_still_sorts_deterministically() {
    init_logging();
    // Model answers in menu order, ineligible first: the pipeline
    // must not trust that ordering
    let combined = json!({"meals": [
        {"name": "Carbonara", "ingredients": ["eggs"], "price": 12.0, "eligible": false},
        {"name": "Tiramisu", "ingredients": ["mascarpone"], "price": 6.0, "eligible": true}
    ]});
    let model = ScriptedModel::new(vec![Ok(extraction_response()), Ok(combined)]);
    let settings = Settings {
        source_language: LangTag::new("it"),
        target_language: LangTag::new("en"),
        profile: Some(Profile::new(Diet::Vegan, vec!["eggs".to_string()])),
    };
    let pipeline = MenuPipeline::with_options(
        GenerationClient::with_timeout(model.clone(), Duration::from_secs(5)),
        TranslationStage::new(IdentityTranslator::boxed()),
        Arc::new(ProfileStore::in_memory(settings)),
        true,
    );

    let outcome = pipeline.submit(scanned_lines()).await.wait().await;

    assert_eq!(outcome.status, RunStatus::Sorted);
    let names: Vec<&str> = outcome.meals.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Tiramisu", "Carbonara"]);

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("re-order"));
}

/// Explicit cancel settles the run in Cancelled and discards partials.
#[tokio::test]
async fn test_cancel_discards_partial_results() {
    init_logging();
    let hanging = HangingModel::new();
    let pipeline = pipeline_with(hanging.clone(), IdentityTranslator::boxed(), None);

    let handle = pipeline.submit(scanned_lines()).await;
    let mut status = handle.subscribe();
    while *status.borrow() != RunStatus::Running(Stage::Extracting) {
        status.changed().await.unwrap();
    }

    handle.cancel();
    let outcome = handle.wait().await;
    assert_eq!(outcome.status, RunStatus::Cancelled);
    assert!(outcome.meals.is_empty());
    assert!(outcome.error.is_none());
}
