//! Errors reported by statechart construction, activation and dispatch.

use super::id::ChartId;
use thiserror::Error;

/// Errors that can occur while building, reshaping or driving a statechart.
///
/// Variants fall into two families: configuration errors (the tree or the
/// requested target is malformed) and precondition violations (the call is
/// not valid in the chart's current lifecycle phase). Neither family is ever
/// partially applied.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatechartError {
    #[error("State name must not be empty")]
    EmptyName,

    #[error("Duplicate state name '{name}'. State names must be unique within a statechart")]
    DuplicateName { name: String },

    #[error("State '{state}' has {substates} substates but no initial substate. Call set_initial_child()")]
    MissingInitialState { state: String, substates: usize },

    #[error("State '{child}' is not a substate of '{parent}'")]
    NotASubstate { parent: String, child: String },

    #[error("No state named '{name}' in this statechart")]
    UnknownState { name: String },

    #[error("State belongs to statechart {found}, not {expected}")]
    ForeignState { expected: ChartId, found: ChartId },

    #[error("Statechart has no root state. Call set_root() first")]
    NoRoot,

    #[error("Statechart is not active. Call activate() first")]
    NotActive,

    #[error("Statechart is already active")]
    AlreadyActive,

    #[error("Cannot reshape the state tree while the statechart is active")]
    ReshapeWhileActive,
}

impl StatechartError {
    /// True for errors caused by a malformed tree or target.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyName
                | Self::DuplicateName { .. }
                | Self::MissingInitialState { .. }
                | Self::NotASubstate { .. }
                | Self::UnknownState { .. }
                | Self::ForeignState { .. }
                | Self::NoRoot
        )
    }

    /// True for calls made in the wrong lifecycle phase.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            Self::NotActive | Self::AlreadyActive | Self::ReshapeWhileActive
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn families_are_disjoint() {
        let errors = vec![
            StatechartError::EmptyName,
            StatechartError::DuplicateName { name: "A".into() },
            StatechartError::MissingInitialState {
                state: "A".into(),
                substates: 2,
            },
            StatechartError::NotActive,
            StatechartError::AlreadyActive,
            StatechartError::ReshapeWhileActive,
        ];

        for error in errors {
            assert_ne!(
                error.is_configuration_error(),
                error.is_precondition_violation(),
                "{error}"
            );
        }
    }

    #[test]
    fn messages_name_the_offending_state() {
        let error = StatechartError::MissingInitialState {
            state: "Running".into(),
            substates: 2,
        };
        assert!(error.to_string().contains("Running"));

        let error = StatechartError::DuplicateName {
            name: "Idle".into(),
        };
        assert!(error.to_string().contains("'Idle'"));
    }
}
