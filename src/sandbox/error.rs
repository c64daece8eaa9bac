/// Reported when a thrown value is not an `Error` instance.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred while running the snippet";

/// Why a run produced no transcript.
///
/// The snippet-facing variants display as the interpreter's own message so
/// that the text shown to the user matches what the snippet threw.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// The snippet could not be compiled into a callable
    #[error("{0}")]
    Construction(String),
    /// A binding value could not be built
    #[error("binding `{name}`: {message}")]
    Binding { name: String, message: String },
    /// The snippet threw or its promise rejected
    #[error("{0}")]
    Execution(String),
    /// The snippet's promise is still pending and nothing is left to run
    #[error("snippet finished with asynchronous work that can never settle")]
    Unsettled,
    /// The configured time budget ran out
    #[error("interrupted: the snippet ran past its time limit")]
    Interrupted,
    /// The interpreter itself failed
    #[error("interpreter error: {0}")]
    Runtime(String),
}
