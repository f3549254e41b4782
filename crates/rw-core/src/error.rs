//! Framework error type.
//!
//! Sub-crates may define their own error enums and convert them into
//! `CoreError` via `From` impls, or keep them separate and wrap `CoreError`
//! as one variant.  Both patterns are acceptable; prefer whichever keeps
//! error sites clean.

use thiserror::Error;

use crate::{SectionId, TrainId};

/// The top-level error type for `rw-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("train {0} not found")]
    TrainNotFound(TrainId),

    #[error("section {0} not found")]
    SectionNotFound(SectionId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `rw-*` crates.
pub type CoreResult<T> = Result<T, CoreError>;
