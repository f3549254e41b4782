use thiserror::Error;

use rw_core::TrainId;
use rw_dispatch::DispatchError;

/// Fatal pre-run conditions.  Each readiness path gets its own timeout
/// cause so a broken schedule is diagnosable from the message alone.
#[derive(Debug, Error)]
pub enum PreRunError {
    #[error("session aborted - incoming train {train} has not run at all")]
    IncomingNeverRan { train: TrainId },

    #[error("session aborted - incoming train {train} has not arrived before the end of the schedule day")]
    IncomingNeverArrived { train: TrainId },

    #[error("session aborted - track for the primary train was not cleared before the end of the schedule day")]
    TrackNeverCleared,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

pub type PreRunResult<T> = Result<T, PreRunError>;
