//! Record of executed transitions.
//!
//! Every activation that changes the active configuration produces a
//! [`Transition`]; the chart keeps the most recent ones in a bounded
//! [`TransitionJournal`] for diagnostics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// What caused a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionKind {
    /// The chart entered its default configuration.
    Activate,
    /// The chart exited its whole configuration.
    Deactivate,
    /// A state was activated inside an active chart.
    Move,
}

/// Record of a single executed transition.
///
/// # Example
///
/// ```rust
/// use hsm_chart::{Statechart, StateNode, TransitionKind};
///
/// let mut root = StateNode::new("Root");
/// root.set_initial_child(StateNode::new("Idle")).unwrap();
///
/// let mut chart = Statechart::new();
/// chart.set_root(root).unwrap();
/// let transition = chart.activate().unwrap();
///
/// assert_eq!(transition.kind, TransitionKind::Activate);
/// assert_eq!(transition.entered, ["Root", "Idle"]);
/// assert!(transition.exited.is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub kind: TransitionKind,
    /// The requested state, if any
    pub target: Option<String>,
    /// States exited, in exit order
    pub exited: Vec<String>,
    /// States entered, in enter order
    pub entered: Vec<String>,
    /// When the transition was executed
    pub timestamp: DateTime<Utc>,
}

impl Transition {
    pub(crate) fn unchanged(target: Option<String>) -> Self {
        Self {
            kind: TransitionKind::Move,
            target,
            exited: Vec::new(),
            entered: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// True when the active configuration did not change.
    pub fn is_noop(&self) -> bool {
        self.exited.is_empty() && self.entered.is_empty()
    }
}

/// Bounded, ordered log of recent transitions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionJournal {
    capacity: usize,
    transitions: VecDeque<Transition>,
}

impl TransitionJournal {
    /// Create a journal keeping at most `capacity` transitions. Zero disables it.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            transitions: VecDeque::with_capacity(capacity.min(64)),
        }
    }

    pub(crate) fn record(&mut self, transition: Transition) {
        if self.capacity == 0 {
            return;
        }
        while self.transitions.len() >= self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Recorded transitions, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &Transition> + '_ {
        self.transitions.iter()
    }

    pub fn last(&self) -> Option<&Transition> {
        self.transitions.back()
    }

    /// Requested targets of the recorded moves, oldest first.
    pub fn targets(&self) -> Vec<&str> {
        self.transitions
            .iter()
            .filter_map(|t| t.target.as_deref())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn clear(&mut self) {
        self.transitions.clear();
    }
}

impl Default for TransitionJournal {
    fn default() -> Self {
        Self::new(crate::builder::DEFAULT_JOURNAL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moved(target: &str) -> Transition {
        Transition {
            kind: TransitionKind::Move,
            target: Some(target.to_string()),
            exited: vec!["A".into()],
            entered: vec![target.to_string()],
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_journal_is_empty() {
        let journal = TransitionJournal::new(4);
        assert!(journal.is_empty());
        assert!(journal.last().is_none());
        assert_eq!(journal.capacity(), 4);
    }

    #[test]
    fn record_keeps_most_recent() {
        let mut journal = TransitionJournal::new(2);
        journal.record(moved("B"));
        journal.record(moved("C"));
        journal.record(moved("D"));

        assert_eq!(journal.len(), 2);
        assert_eq!(journal.targets(), ["C", "D"]);
        assert_eq!(journal.last().unwrap().target.as_deref(), Some("D"));
    }

    #[test]
    fn zero_capacity_disables_recording() {
        let mut journal = TransitionJournal::new(0);
        journal.record(moved("B"));
        assert!(journal.is_empty());
    }

    #[test]
    fn unchanged_transition_is_noop() {
        assert!(Transition::unchanged(Some("A".into())).is_noop());
        assert!(!moved("B").is_noop());
    }

    #[test]
    fn journal_serializes_correctly() {
        let mut journal = TransitionJournal::new(8);
        journal.record(moved("B"));

        let json = serde_json::to_string(&journal).unwrap();
        let deserialized: TransitionJournal = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.len(), 1);
        assert_eq!(deserialized.last(), journal.last());
    }

    #[test]
    fn clear_empties_journal() {
        let mut journal = TransitionJournal::new(8);
        journal.record(moved("B"));
        journal.clear();
        assert!(journal.is_empty());
    }
}
