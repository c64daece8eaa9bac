mod capture;
mod error;
mod outcome;
mod prelude;
mod quickjs;

pub use capture::{Level, OutputCapture};
pub use error::{ExecutionError, UNKNOWN_ERROR_MESSAGE};
pub use outcome::{Outcome, Transcript};
pub use quickjs::QuickJs;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::bindings::BindingSet;
use crate::config::SandboxConfig;
use crate::normalize;

/// Something that can run a normalized snippet body.
///
/// The body is called with the captured console under
/// [`CONSOLE_NAME`](crate::bindings::CONSOLE_NAME) followed by every binding,
/// in binding order. Implementations must report faults as errors rather than
/// unwinding.
pub trait Interpreter: Send + Sync {
    fn execute(
        &self,
        body: &str,
        bindings: &BindingSet,
        capture: &OutputCapture,
    ) -> Result<(), ExecutionError>;
}

/// Execute a snippet with the QuickJS interpreter.
///
/// Blocks until the snippet's asynchronous work settles (or the configured
/// timeout interrupts it). Imports are stripped first.
pub fn execute_snippet(source: &str, bindings: &BindingSet, config: &SandboxConfig) -> Outcome {
    execute_with(&QuickJs::new(config.clone()), source, bindings)
}

/// Execute a snippet with any interpreter. Never panics and never returns a
/// partial transcript alongside an error.
pub fn execute_with<I>(interpreter: &I, source: &str, bindings: &BindingSet) -> Outcome
where
    I: Interpreter + ?Sized,
{
    let body = normalize::strip_imports(source);
    let capture = OutputCapture::new();
    tracing::debug!(bytes = body.len(), bindings = bindings.len(), "running snippet");

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        interpreter.execute(&body, bindings, &capture)
    }));

    match result {
        Ok(Ok(())) => {
            tracing::debug!(lines = capture.len(), "snippet finished");
            Outcome::success(capture.transcript())
        }
        Ok(Err(e)) => {
            tracing::warn!(discarded_lines = capture.len(), "snippet failed: {}", e);
            Outcome::failure(e.to_string())
        }
        Err(_) => {
            tracing::error!("interpreter panicked while running snippet");
            Outcome::failure(ExecutionError::Runtime("interpreter panicked".into()).to_string())
        }
    }
}

/// Async wrapper around [`execute_with`]. The run happens on tokio's
/// blocking pool; awaiting this is the only suspension point of a run.
pub async fn run_with(
    interpreter: Arc<dyn Interpreter>,
    source: String,
    bindings: Arc<BindingSet>,
) -> Outcome {
    let task = tokio::task::spawn_blocking(move || {
        execute_with(interpreter.as_ref(), &source, &bindings)
    });

    match task.await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("snippet worker failed: {}", e);
            Outcome::failure(ExecutionError::Runtime(e.to_string()).to_string())
        }
    }
}

/// Async counterpart of [`execute_snippet`].
pub async fn run_snippet(
    source: impl Into<String>,
    bindings: Arc<BindingSet>,
    config: SandboxConfig,
) -> Outcome {
    run_with(Arc::new(QuickJs::new(config)), source.into(), bindings).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records the body it was handed and replays a fixed script of calls.
    struct Scripted {
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    impl Interpreter for Scripted {
        fn execute(
            &self,
            body: &str,
            _bindings: &BindingSet,
            capture: &OutputCapture,
        ) -> Result<(), ExecutionError> {
            self.seen.lock().unwrap().push(body.to_string());
            capture.info(&["before"]);
            if self.fail {
                return Err(ExecutionError::Execution("boom".into()));
            }
            Ok(())
        }
    }

    struct Panicking;

    impl Interpreter for Panicking {
        fn execute(&self, _: &str, _: &BindingSet, _: &OutputCapture) -> Result<(), ExecutionError> {
            panic!("engine bug");
        }
    }

    #[test]
    fn test_body_is_normalized_before_execution() {
        let interpreter = Scripted { seen: Mutex::new(Vec::new()), fail: false };
        let outcome = execute_with(
            &interpreter,
            "import { a } from 'x';\nconsole.log(a);\n",
            &BindingSet::new(),
        );
        assert_eq!(outcome, Outcome::success(vec!["before".into()]));
        assert_eq!(interpreter.seen.lock().unwrap()[0], "console.log(a);");
    }

    #[test]
    fn test_failure_discards_partial_transcript() {
        let interpreter = Scripted { seen: Mutex::new(Vec::new()), fail: true };
        let outcome = execute_with(&interpreter, "ignored", &BindingSet::new());
        assert_eq!(outcome, Outcome::failure("boom"));
    }

    #[test]
    fn test_panic_becomes_failure() {
        let outcome = execute_with(&Panicking, "ignored", &BindingSet::new());
        assert!(outcome.error().unwrap().contains("panicked"));
    }
}
