use thiserror::Error;

/// Errors surfaced by the structural indexer, locator, and hot-address table.
///
/// These are the per-block / per-lookup failure modes described in the error
/// taxonomy: everything here is recoverable by the caller (log and move on),
/// never a reason to abort the process.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("hot-address seed file error: {0}")]
    Seed(String),

    #[error("sink rejected batch: {0}")]
    Sink(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
