use thiserror::Error;

/// Fatal dispatcher conditions.  Everything transient (placement conflicts,
/// slow pools) is absorbed by the retry machinery and never surfaces here.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The pool configuration can never supply this train; retrying cannot
    /// help, so the session must abort rather than run a broken schedule.
    #[error("session aborted - pool {pool:?} cannot supply train {train:?}")]
    PoolUnsatisfiable { train: String, pool: String },
}

pub type DispatchResult<T> = Result<T, DispatchError>;
