//! The run orchestrator. Sequences Translation → Extraction →
//! DietEvaluation → Sort, owns the run lifecycle and exposes
//! cancellation at every suspension point.

use crate::error::StageError;
use crate::generation::GenerationClient;
use crate::model::{Meal, Settings};
use crate::profile::ProfileStore;
use crate::prompts;
use crate::translation::TranslationStage;
use log::{debug, info, warn};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// One sequential phase of a run. Each stage awaits exactly one
/// external collaborator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Translating,
    Extracting,
    Evaluating,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Translating => "translating",
            Stage::Extracting => "extracting",
            Stage::Evaluating => "evaluating",
        })
    }
}

/// Observable lifecycle of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Running(Stage),
    Sorted,
    Failed(Stage),
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Sorted | RunStatus::Failed(_) | RunStatus::Cancelled
        )
    }
}

/// Result of one scan-and-analyze cycle.
///
/// `meals` holds the sorted list on success, the best-effort list
/// computed by earlier stages when evaluation failed, and nothing at
/// all for cancelled runs.
#[derive(Debug)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub meals: Vec<Meal>,
    pub error: Option<StageError>,
}

impl RunOutcome {
    fn no_op() -> Self {
        RunOutcome {
            status: RunStatus::Idle,
            meals: Vec::new(),
            error: None,
        }
    }

    fn cancelled() -> Self {
        RunOutcome {
            status: RunStatus::Cancelled,
            meals: Vec::new(),
            error: None,
        }
    }
}

struct CancelSignal(watch::Sender<bool>);

impl CancelSignal {
    fn new() -> (Arc<Self>, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Arc::new(CancelSignal(tx)), rx)
    }

    fn trigger(&self) {
        let _ = self.0.send(true);
    }
}

/// Handle to an in-flight (or no-op) run.
///
/// Dropping the handle cancels the run: a run never outlives its
/// consumer.
pub struct RunHandle {
    status: watch::Receiver<RunStatus>,
    cancel: Arc<CancelSignal>,
    join: Option<JoinHandle<RunOutcome>>,
}

impl RunHandle {
    /// Current status snapshot.
    pub fn status(&self) -> RunStatus {
        self.status.borrow().clone()
    }

    /// A receiver for observing status transitions.
    pub fn subscribe(&self) -> watch::Receiver<RunStatus> {
        self.status.clone()
    }

    /// Request cancellation. Idempotent; the run settles in
    /// `Cancelled` at its next suspension point.
    pub fn cancel(&self) {
        self.cancel.trigger();
    }

    /// Wait for the run to reach a terminal state.
    pub async fn wait(mut self) -> RunOutcome {
        match self.join.take() {
            Some(join) => join.await.unwrap_or_else(|e| {
                warn!("Run task ended abnormally: {}", e);
                RunOutcome::cancelled()
            }),
            None => RunOutcome::no_op(),
        }
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        self.cancel.trigger();
    }
}

struct PipelineInner {
    generation: GenerationClient,
    translation: TranslationStage,
    profiles: Arc<ProfileStore>,
    combined_evaluation: bool,
}

/// Orchestrates scan-and-analyze runs.
///
/// One logical pipeline instance processes one run at a time;
/// submitting while a run is in flight cancels the in-flight run
/// first. Independent instances share nothing and may run
/// concurrently.
pub struct MenuPipeline {
    inner: Arc<PipelineInner>,
    active: Mutex<Option<Arc<CancelSignal>>>,
}

impl MenuPipeline {
    pub fn new(
        generation: GenerationClient,
        translation: TranslationStage,
        profiles: Arc<ProfileStore>,
    ) -> Self {
        Self::with_options(generation, translation, profiles, false)
    }

    /// `combined_evaluation` merges the evaluation and re-ordering
    /// into one model call; the deterministic sort still runs on top.
    pub fn with_options(
        generation: GenerationClient,
        translation: TranslationStage,
        profiles: Arc<ProfileStore>,
        combined_evaluation: bool,
    ) -> Self {
        MenuPipeline {
            inner: Arc::new(PipelineInner {
                generation,
                translation,
                profiles,
                combined_evaluation,
            }),
            active: Mutex::new(None),
        }
    }

    /// Start a run over the scanned lines.
    ///
    /// Empty input is a no-op, not an error: the returned handle is
    /// already settled in `Idle` and no collaborator is ever invoked.
    /// Non-empty input first cancels any in-flight run, then snapshots
    /// the profile and language pair for the whole run.
    pub async fn submit(&self, lines: Vec<String>) -> RunHandle {
        if lines.is_empty() {
            debug!("Ignoring submission with no scanned lines");
            let (cancel, _) = CancelSignal::new();
            let (_tx, status) = watch::channel(RunStatus::Idle);
            return RunHandle {
                status,
                cancel,
                join: None,
            };
        }

        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            info!("New submission supersedes the in-flight run");
            previous.trigger();
        }

        let settings = self.inner.profiles.snapshot().await;
        let (cancel, cancel_rx) = CancelSignal::new();
        let (status_tx, status_rx) = watch::channel(RunStatus::Idle);
        let inner = Arc::clone(&self.inner);
        let join = tokio::spawn(run(inner, lines, settings, status_tx, cancel_rx));
        *active = Some(Arc::clone(&cancel));

        RunHandle {
            status: status_rx,
            cancel,
            join: Some(join),
        }
    }

    /// Cancel the in-flight run, if any. Releases without side
    /// effects; the cancelled run's partial results are discarded.
    pub async fn cancel(&self) {
        if let Some(active) = self.active.lock().await.take() {
            active.trigger();
        }
    }
}

/// Stable partition: eligible meals first, ineligible second, each
/// group keeping the relative order the evaluation stage produced.
pub fn sort_eligible_first(meals: Vec<Meal>) -> Vec<Meal> {
    let (eligible, ineligible): (Vec<Meal>, Vec<Meal>) =
        meals.into_iter().partition(|meal| meal.eligible);
    eligible.into_iter().chain(ineligible).collect()
}

enum StageCall<T> {
    Done(T),
    Cancelled,
}

/// Await one collaborator call, abandoning it the moment cancellation
/// is requested.
async fn guarded<F, T>(cancel: &mut watch::Receiver<bool>, call: F) -> StageCall<T>
where
    F: Future<Output = T>,
{
    tokio::select! {
        _ = wait_cancelled(cancel) => StageCall::Cancelled,
        result = call => StageCall::Done(result),
    }
}

async fn wait_cancelled(cancel: &mut watch::Receiver<bool>) {
    while !*cancel.borrow() {
        // A dropped sender means every holder of the run is gone;
        // treat it the same as an explicit cancel.
        if cancel.changed().await.is_err() {
            return;
        }
    }
}

async fn run(
    inner: Arc<PipelineInner>,
    lines: Vec<String>,
    settings: Settings,
    status: watch::Sender<RunStatus>,
    mut cancel: watch::Receiver<bool>,
) -> RunOutcome {
    let _ = status.send(RunStatus::Running(Stage::Translating));
    let translated = match guarded(
        &mut cancel,
        inner
            .translation
            .translate(&lines, &settings.source_language, &settings.target_language),
    )
    .await
    {
        StageCall::Cancelled => return settle_cancelled(&status),
        StageCall::Done(Err(e)) => {
            return settle_failed(&status, Stage::Translating, e.into(), Vec::new())
        }
        StageCall::Done(Ok(translated)) => translated,
    };

    let _ = status.send(RunStatus::Running(Stage::Extracting));
    let prompt = prompts::extraction_prompt(&translated);
    let extracted = match guarded(&mut cancel, inner.generation.generate_meals(&prompt)).await {
        StageCall::Cancelled => return settle_cancelled(&status),
        StageCall::Done(Err(e)) => {
            return settle_failed(&status, Stage::Extracting, e.into(), Vec::new())
        }
        StageCall::Done(Ok(meals)) => meals,
    };
    debug!("Extraction produced {} meals", extracted.len());

    // Dietary evaluation is optional: with no profile to evaluate
    // against, every meal keeps its default eligibility.
    let Some(profile) = settings.profile else {
        debug!("No profile stored, skipping dietary evaluation");
        return settle_sorted(&status, extracted);
    };

    let _ = status.send(RunStatus::Running(Stage::Evaluating));
    let prompt = if inner.combined_evaluation {
        prompts::combined_sort_prompt(&extracted, &profile)
    } else {
        prompts::evaluation_prompt(&extracted, &profile)
    };
    match guarded(&mut cancel, inner.generation.generate_meals(&prompt)).await {
        StageCall::Cancelled => settle_cancelled(&status),
        StageCall::Done(Ok(evaluated)) => settle_sorted(&status, evaluated),
        StageCall::Done(Err(e)) => {
            // Partial success is surfaced, not swallowed: the
            // extracted facts are still worth showing.
            warn!("Evaluation failed, keeping extracted meals: {}", e);
            settle_failed(&status, Stage::Evaluating, e.into(), extracted)
        }
    }
}

fn settle_sorted(status: &watch::Sender<RunStatus>, meals: Vec<Meal>) -> RunOutcome {
    let meals = sort_eligible_first(meals);
    let _ = status.send(RunStatus::Sorted);
    RunOutcome {
        status: RunStatus::Sorted,
        meals,
        error: None,
    }
}

fn settle_failed(
    status: &watch::Sender<RunStatus>,
    stage: Stage,
    error: StageError,
    meals: Vec<Meal>,
) -> RunOutcome {
    let _ = status.send(RunStatus::Failed(stage));
    RunOutcome {
        status: RunStatus::Failed(stage),
        meals,
        error: Some(error),
    }
}

fn settle_cancelled(status: &watch::Sender<RunStatus>) -> RunOutcome {
    let _ = status.send(RunStatus::Cancelled);
    RunOutcome::cancelled()
}
