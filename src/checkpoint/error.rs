//! Errors raised while saving or restoring chart history.

use crate::core::StatechartError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The checkpoint could not be written as JSON or bincode
    #[error("Could not encode checkpoint: {0}")]
    Encode(String),

    /// The input is not a well-formed checkpoint
    #[error("Could not decode checkpoint: {0}")]
    Decode(String),

    #[error("Checkpoint format {found} is not supported (expected {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// A history entry names a state the chart does not have
    #[error("History entry '{parent}' -> '{child}' names unknown state '{missing}'")]
    UnknownHistoryState {
        parent: String,
        child: String,
        missing: String,
    },

    /// A history entry pairs states that are not parent and substate
    #[error("History entry '{parent}' -> '{child}': '{child}' is not a substate of '{parent}'")]
    HistoryNotASubstate { parent: String, child: String },

    /// The chart refused the restore, e.g. because it is active
    #[error(transparent)]
    Statechart(#[from] StatechartError),
}
