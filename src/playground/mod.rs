use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::bindings::BindingSet;
use crate::config::{ConfigError, DEFAULT_HEIGHT, PlaygroundDefinition, SandboxConfig};
use crate::sandbox::{self, Interpreter, Outcome, QuickJs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Succeeded => "succeeded",
            RunState::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaygroundError {
    #[error("a run is already in progress")]
    AlreadyRunning,
    #[error("no run is in progress")]
    NotRunning,
}

/// A run that has been started but not executed yet. Holds its own copy of
/// the snippet, so edits made while it runs do not affect it.
///
/// Dropping it before it produces an outcome (including cancelling the
/// future returned by [`run`](Self::run)) puts the playground back to `Idle`.
pub struct PendingRun {
    source: String,
    bindings: Arc<BindingSet>,
    interpreter: Arc<dyn Interpreter>,
    abandoned: Arc<AtomicBool>,
    settled: bool,
}

impl PendingRun {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Execute on the current thread.
    pub fn execute(mut self) -> Outcome {
        let outcome = sandbox::execute_with(self.interpreter.as_ref(), &self.source, &self.bindings);
        self.settled = true;
        outcome
    }

    /// Execute on the blocking pool.
    pub async fn run(mut self) -> Outcome {
        let outcome = sandbox::run_with(
            Arc::clone(&self.interpreter),
            self.source.clone(),
            Arc::clone(&self.bindings),
        )
        .await;
        self.settled = true;
        outcome
    }
}

impl Drop for PendingRun {
    fn drop(&mut self) {
        if !self.settled {
            self.abandoned.store(true, Ordering::Release);
            tracing::debug!("run abandoned before producing an outcome");
        }
    }
}

/// One embedded playground: an editable snippet, the bindings it runs
/// against and the outcome of its latest run. Instances share nothing but
/// their (read-only) bindings.
pub struct Playground {
    title: String,
    height: u32,
    initial: String,
    snippet: String,
    bindings: Arc<BindingSet>,
    interpreter: Arc<dyn Interpreter>,
    state: RunState,
    abandoned: Arc<AtomicBool>,
    outcome: Option<Outcome>,
}

impl Playground {
    pub fn new(title: impl Into<String>, initial: impl Into<String>, bindings: Arc<BindingSet>) -> Self {
        let initial = initial.into();
        Self {
            title: title.into(),
            height: DEFAULT_HEIGHT,
            snippet: initial.clone(),
            initial,
            bindings,
            interpreter: Arc::new(QuickJs::default()),
            state: RunState::Idle,
            abandoned: Arc::new(AtomicBool::new(false)),
            outcome: None,
        }
    }

    pub fn from_definition(
        definition: &PlaygroundDefinition,
        config: SandboxConfig,
    ) -> Result<Self, ConfigError> {
        let bindings = Arc::new(definition.binding_set()?);
        Ok(Self::new(definition.title.clone(), definition.code.clone(), bindings)
            .with_height(definition.height)
            .with_interpreter(Arc::new(QuickJs::new(config))))
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn with_interpreter(mut self, interpreter: Arc<dyn Interpreter>) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    pub fn snippet(&self) -> &str {
        &self.snippet
    }

    pub fn set_snippet(&mut self, snippet: impl Into<String>) {
        self.snippet = snippet.into();
    }

    /// Restore the snippet to the text the playground was created with.
    pub fn reset(&mut self) {
        self.snippet.clone_from(&self.initial);
    }

    pub fn state(&self) -> RunState {
        // A dropped `PendingRun` never reports back
        if self.state == RunState::Running && self.abandoned.load(Ordering::Acquire) {
            return RunState::Idle;
        }
        self.state
    }

    pub fn can_run(&self) -> bool {
        self.state() != RunState::Running
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Move to `Running` and clear the previous outcome.
    pub fn begin_run(&mut self) -> Result<PendingRun, PlaygroundError> {
        if !self.can_run() {
            return Err(PlaygroundError::AlreadyRunning);
        }
        self.state = RunState::Running;
        self.abandoned = Arc::new(AtomicBool::new(false));
        self.outcome = None;
        tracing::debug!(title = %self.title, "run started");

        Ok(PendingRun {
            source: self.snippet.clone(),
            bindings: Arc::clone(&self.bindings),
            interpreter: Arc::clone(&self.interpreter),
            abandoned: Arc::clone(&self.abandoned),
            settled: false,
        })
    }

    /// Publish the outcome of the run started by [`begin_run`](Self::begin_run).
    pub fn finish_run(&mut self, outcome: Outcome) -> Result<&Outcome, PlaygroundError> {
        if self.state() != RunState::Running {
            return Err(PlaygroundError::NotRunning);
        }
        self.state = if outcome.is_success() {
            RunState::Succeeded
        } else {
            RunState::Failed
        };
        tracing::debug!(title = %self.title, state = self.state.as_str(), "run finished");
        Ok(self.outcome.insert(outcome))
    }

    /// Begin, execute and finish one run.
    pub async fn run(&mut self) -> Result<&Outcome, PlaygroundError> {
        let pending = self.begin_run()?;
        let outcome = pending.run().await;
        self.finish_run(outcome)
    }

    /// Blocking variant of [`run`](Self::run).
    pub fn run_blocking(&mut self) -> Result<&Outcome, PlaygroundError> {
        let pending = self.begin_run()?;
        let outcome = pending.execute();
        self.finish_run(outcome)
    }
}

impl fmt::Debug for Playground {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Playground")
            .field("title", &self.title)
            .field("height", &self.height)
            .field("bindings", &self.bindings)
            .field("state", &self.state())
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playground() -> Playground {
        Playground::new("Scratch", "console.log('hi');", Arc::new(BindingSet::new()))
    }

    #[test]
    fn test_begin_run_blocks_second_trigger() {
        let mut pg = playground();
        let _pending = pg.begin_run().unwrap();
        assert_eq!(pg.state(), RunState::Running);
        assert!(!pg.can_run());
        assert_eq!(pg.begin_run().err(), Some(PlaygroundError::AlreadyRunning));
    }

    #[test]
    fn test_begin_run_clears_previous_outcome() {
        let mut pg = playground();
        let _first = pg.begin_run().unwrap();
        pg.finish_run(Outcome::failure("old")).unwrap();
        assert_eq!(pg.state(), RunState::Failed);

        let _second = pg.begin_run().unwrap();
        assert!(pg.outcome().is_none());
    }

    #[test]
    fn test_dropped_run_returns_to_idle() {
        let mut pg = playground();
        drop(pg.begin_run().unwrap());
        assert_eq!(pg.state(), RunState::Idle);
        assert!(pg.can_run());
        assert_eq!(
            pg.finish_run(Outcome::success(vec![])).err(),
            Some(PlaygroundError::NotRunning)
        );

        let outcome = pg.run_blocking().unwrap();
        assert_eq!(outcome, &Outcome::success(vec!["hi".into()]));
        assert_eq!(pg.state(), RunState::Succeeded);
    }

    #[test]
    fn test_executed_run_is_not_abandoned() {
        let mut pg = playground();
        let outcome = pg.begin_run().unwrap().execute();
        assert_eq!(pg.state(), RunState::Running);
        pg.finish_run(outcome).unwrap();
        assert_eq!(pg.state(), RunState::Succeeded);
    }

    #[test]
    fn test_default_height() {
        assert_eq!(playground().height(), DEFAULT_HEIGHT);
    }

    #[test]
    fn test_finish_without_begin() {
        let mut pg = playground();
        assert_eq!(
            pg.finish_run(Outcome::success(vec![])).err(),
            Some(PlaygroundError::NotRunning)
        );
    }

    #[test]
    fn test_pending_run_keeps_snapshot() {
        let mut pg = playground();
        let pending = pg.begin_run().unwrap();
        pg.set_snippet("console.log('edited');");
        assert_eq!(pending.source(), "console.log('hi');");
    }
}
