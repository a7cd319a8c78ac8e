use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("A run can only be started from inside a tokio runtime.")]
    NoRuntime,
    #[error("Run ended without signaling completion.")]
    CompletionDropped,
}
