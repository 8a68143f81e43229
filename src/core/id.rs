//! Identities for statecharts and the states attached to them.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a statechart's attached state tree.
///
/// A fresh id is minted every time a root is attached, so handles issued
/// for a previous tree are recognised as foreign.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ChartId(Uuid);

impl ChartId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a state attached to a statechart.
///
/// Handles are cheap to copy and only valid for the chart that issued them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct StateId {
    chart: ChartId,
    index: usize,
}

impl StateId {
    pub(crate) fn new(chart: ChartId, index: usize) -> Self {
        Self { chart, index }
    }

    /// The chart this state is attached to.
    pub fn chart(&self) -> ChartId {
        self.chart
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }
}
