use thiserror::Error;

/// Errors surfaced by pipeline orchestration.
///
/// Per-source collection and enrichment failures are handled in place (log
/// and skip); only failures that should stop the caller appear here.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A discovery run is already active.
    #[error("a discovery run is already in progress")]
    AlreadyRunning,

    #[error(transparent)]
    Config(#[from] appscout_core::ConfigError),

    #[error(transparent)]
    Store(#[from] appscout_store::StoreError),

    #[error(transparent)]
    Judge(#[from] appscout_judge::JudgeError),

    #[error(transparent)]
    Db(#[from] appscout_db::DbError),
}
