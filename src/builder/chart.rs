//! Builder for constructing statecharts.

use crate::builder::config::StatechartConfig;
use crate::core::{StateNode, StatechartError};
use crate::runtime::Statechart;

/// Builder for constructing statecharts with a fluent API.
pub struct StatechartBuilder {
    root: Option<StateNode>,
    config: StatechartConfig,
    start_active: bool,
}

impl StatechartBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            root: None,
            config: StatechartConfig::default(),
            start_active: false,
        }
    }

    /// Set the root state (required).
    pub fn root(mut self, root: StateNode) -> Self {
        self.root = Some(root);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: StatechartConfig) -> Self {
        self.config = config;
        self
    }

    pub fn journal_capacity(mut self, capacity: usize) -> Self {
        self.config.journal_capacity = capacity;
        self
    }

    /// Activate the chart as the last build step.
    pub fn start_active(mut self, start_active: bool) -> Self {
        self.start_active = start_active;
        self
    }

    /// Build the statechart.
    /// Returns an error if the root is missing or the tree is malformed.
    pub fn build(self) -> Result<Statechart, StatechartError> {
        let root = self.root.ok_or(StatechartError::NoRoot)?;

        let mut chart = Statechart::with_config(self.config);
        chart.set_root(root)?;
        if self.start_active {
            chart.activate()?;
        }
        Ok(chart)
    }
}

impl Default for StatechartBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_root() {
        let result = StatechartBuilder::new().build();
        assert!(matches!(result, Err(StatechartError::NoRoot)));
    }

    #[test]
    fn builder_applies_config() {
        let chart = StatechartBuilder::new()
            .root(StateNode::new("Root"))
            .journal_capacity(2)
            .build()
            .unwrap();

        assert_eq!(chart.journal().capacity(), 2);
        assert!(!chart.is_active());
    }

    #[test]
    fn builder_can_start_active() {
        let mut root = StateNode::new("Root");
        root.add_child(StateNode::new("Only")).unwrap();

        let chart = StatechartBuilder::new()
            .root(root)
            .start_active(true)
            .build()
            .unwrap();

        assert!(chart.is_active());
        assert_eq!(chart.active_state_names(), ["Root", "Only"]);
    }

    #[test]
    fn builder_reports_activation_errors() {
        let mut root = StateNode::new("Root");
        root.add_children([StateNode::new("A"), StateNode::new("B")])
            .unwrap();

        let result = StatechartBuilder::new()
            .root(root)
            .start_active(true)
            .build();

        assert!(matches!(
            result,
            Err(StatechartError::MissingInitialState { .. })
        ));
    }
}
