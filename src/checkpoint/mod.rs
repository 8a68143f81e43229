//! Checkpoint and restore of history substates.
//!
//! A checkpoint captures which substate each state would recall on re-entry,
//! plus the active configuration for inspection. Restoring installs the
//! recorded history into an inactive chart so that the next `activate()`
//! recalls it. Handlers are not serializable and are never captured.

use crate::core::{ChartId, StatechartError};
use crate::runtime::Statechart;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a statechart's history and configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// Chart the checkpoint was taken from
    pub chart: ChartId,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Names of the active states when the checkpoint was taken, root first.
    ///
    /// Informational only: [`Statechart::restore_history`] does not read it,
    /// and the next `activate()` enters the default configuration that the
    /// restored history selects.
    pub active: Vec<String>,

    /// Recorded history substate per state name
    pub history: BTreeMap<String, String>,
}

impl Checkpoint {
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string(self).map_err(|e| CheckpointError::Encode(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::Decode(e.to_string()))?;
        checkpoint.check_version()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::Encode(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::Decode(e.to_string()))?;
        checkpoint.check_version()
    }

    fn check_version(self) -> Result<Self, CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(self)
    }
}

impl Statechart {
    /// Capture the active configuration and every recorded history substate.
    pub fn checkpoint(&self) -> Result<Checkpoint, StatechartError> {
        let tree = self.tree().ok_or(StatechartError::NoRoot)?;
        let history = tree
            .states()
            .filter_map(|state| {
                let child = tree.state(state.history_child()?)?;
                Some((state.name().to_string(), child.name().to_string()))
            })
            .collect();

        Ok(Checkpoint {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            chart: tree.id(),
            timestamp: Utc::now(),
            active: self
                .active_state_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            history,
        })
    }

    /// Install the history substates recorded in `checkpoint`.
    ///
    /// The chart must be inactive. Every entry is validated before any is
    /// applied; states not mentioned keep their current history.
    pub fn restore_history(&mut self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        if self.is_active() {
            return Err(StatechartError::ReshapeWhileActive.into());
        }
        let tree = self.tree().ok_or(StatechartError::NoRoot)?;

        let mut entries = Vec::with_capacity(checkpoint.history.len());
        for (parent_name, child_name) in &checkpoint.history {
            let unknown = |missing: &String| CheckpointError::UnknownHistoryState {
                parent: parent_name.clone(),
                child: child_name.clone(),
                missing: missing.clone(),
            };
            let parent = tree.find(parent_name).ok_or_else(|| unknown(parent_name))?;
            let child = tree.find(child_name).ok_or_else(|| unknown(child_name))?;
            if tree.state(child).and_then(|c| c.parent()) != Some(parent) {
                return Err(CheckpointError::HistoryNotASubstate {
                    parent: parent_name.clone(),
                    child: child_name.clone(),
                });
            }
            entries.push((parent, child));
        }

        for (parent, child) in entries {
            self.set_history_child(parent, Some(child))?;
        }
        tracing::debug!(
            checkpoint = %checkpoint.id,
            entries = checkpoint.history.len(),
            "Restored history substates"
        );
        Ok(())
    }
}
