//! Completeness checks for statechart configuration.
//!
//! Validation accumulates every issue instead of stopping at the first, so
//! a host can fix a whole tree in one pass. It never changes runtime
//! behavior: activation still reports the first problem it actually hits.
//!
//! # Example
//!
//! ```rust
//! use hsm_chart::{ConfigIssue, Statechart, StateNode};
//! use stillwater::validation::Validation;
//!
//! let mut root = StateNode::new("Root");
//! root.add_children([StateNode::new("A"), StateNode::new("B")]).unwrap();
//!
//! let mut chart = Statechart::new();
//! chart.set_root(root).unwrap();
//!
//! match chart.validate() {
//!     Validation::Failure(issues) => assert_eq!(issues.len(), 1),
//!     Validation::Success(_) => panic!("Root has no initial substate"),
//! }
//! assert!(!chart.is_fully_defined());
//! ```

use crate::core::{StateRef, StateTree};
use crate::runtime::Statechart;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;
use tracing::warn;

/// A configuration gap found by [`Statechart::validate`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigIssue {
    #[error("'{path}' has {substates} substates but no initial substate")]
    MissingInitialState { path: String, substates: usize },

    #[error("'{path}' uses history but its substates are orthogonal; history is ignored")]
    HistoryOnOrthogonal { path: String },
}

/// Check every state of `tree`, accumulating ALL issues.
pub fn validate_tree(tree: &StateTree) -> Validation<(), NonEmptyVec<ConfigIssue>> {
    let checks: Vec<Validation<(), NonEmptyVec<ConfigIssue>>> =
        tree.states().flat_map(check_state).collect();

    if checks.is_empty() {
        return Validation::success(());
    }
    Validation::all_vec(checks).map(|_| ())
}

fn check_state(state: StateRef<'_>) -> Vec<Validation<(), NonEmptyVec<ConfigIssue>>> {
    let mut checks = Vec::new();
    let substates = state.children().len();

    if !state.is_orthogonal() && substates > 1 && state.initial_child().is_none() {
        checks.push(Validation::fail(ConfigIssue::MissingInitialState {
            path: state.path(),
            substates,
        }));
    }
    if state.is_orthogonal() && state.uses_history() {
        checks.push(Validation::fail(ConfigIssue::HistoryOnOrthogonal {
            path: state.path(),
        }));
    }
    checks
}

impl Statechart {
    /// Report every state that is not fully configured.
    ///
    /// A chart without a root has nothing to check and validates. Each issue
    /// is also logged as a warning.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigIssue>> {
        let Some(tree) = self.tree() else {
            return Validation::success(());
        };
        let result = validate_tree(tree);
        if let Validation::Failure(issues) = &result {
            for issue in issues.iter() {
                warn!(chart = %tree.id(), %issue, "Statechart is not fully defined");
            }
        }
        result
    }

    /// True when [`validate`](Self::validate) finds no issues.
    pub fn is_fully_defined(&self) -> bool {
        self.validate().is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateNode;

    fn tree(root: StateNode) -> StateTree {
        StateTree::new(root).unwrap()
    }

    #[test]
    fn complete_tree_validates() {
        let mut root = StateNode::new("Root");
        root.set_initial_child(StateNode::new("A"))
            .unwrap()
            .add_child(StateNode::new("B"))
            .unwrap();

        assert!(validate_tree(&tree(root)).is_success());
    }

    #[test]
    fn validation_accumulates_all_issues() {
        let mut inner = StateNode::new("Inner");
        inner
            .add_children([StateNode::new("X"), StateNode::new("Y")])
            .unwrap();
        let mut split = StateNode::new("Split");
        split
            .set_orthogonal(true)
            .set_use_history(true)
            .add_children([StateNode::new("L"), StateNode::new("R")])
            .unwrap();
        let mut root = StateNode::new("Root");
        root.add_children([inner, split]).unwrap();

        match validate_tree(&tree(root)) {
            Validation::Failure(issues) => {
                assert_eq!(issues.len(), 3);

                let has_root = issues.iter().any(|i| {
                    matches!(i, ConfigIssue::MissingInitialState { path, .. } if path == "Root")
                });
                let has_inner = issues.iter().any(|i| {
                    matches!(i, ConfigIssue::MissingInitialState { path, .. } if path == "Root.Inner")
                });
                let has_history = issues
                    .iter()
                    .any(|i| matches!(i, ConfigIssue::HistoryOnOrthogonal { .. }));

                assert!(has_root);
                assert!(has_inner);
                assert!(has_history);
            }
            Validation::Success(_) => panic!("Expected failures, got success"),
        }
    }

    #[test]
    fn single_substate_needs_no_initial() {
        let mut root = StateNode::new("Root");
        root.add_child(StateNode::new("Only")).unwrap();

        assert!(validate_tree(&tree(root)).is_success());
    }

    #[test]
    fn chart_without_root_is_fully_defined() {
        assert!(Statechart::new().is_fully_defined());
    }

    #[test]
    fn chart_validation_reports_missing_initial() {
        let mut root = StateNode::new("Root");
        root.add_children([StateNode::new("A"), StateNode::new("B")])
            .unwrap();
        let mut chart = Statechart::new();
        chart.set_root(root).unwrap();

        assert!(chart.validate().is_failure());
        assert!(!chart.is_fully_defined());
    }
}
