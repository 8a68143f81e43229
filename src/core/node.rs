//! Detached state nodes.
//!
//! A [`StateNode`] is built by the host before it is attached to a
//! statechart. Children are owned by value, so attaching a root moves the
//! whole subtree into the chart and no node can be attached twice.

use super::error::StatechartError;
use super::id::StateId;
use crate::runtime::Statechart;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// Event name used for the handler invoked when a state is entered.
pub const ENTER_STATE: &str = "enter_state";

/// Event name used for the handler invoked when a state is exited.
pub const EXIT_STATE: &str = "exit_state";

/// Payload forwarded to handlers.
pub type Payload = serde_json::Value;

/// Event handler stored on a state.
///
/// Handlers receive the chart mutably so they can activate states or
/// dispatch further events. Such nested calls run to completion before the
/// triggering call resumes.
pub type Handler = Rc<dyn Fn(&mut Statechart, StateId, Option<&Payload>)>;

/// A state that has not been attached to a statechart yet.
///
/// # Example
///
/// ```rust
/// use hsm_chart::StateNode;
///
/// let mut running = StateNode::new("Running");
/// running
///     .set_use_history(true)
///     .add_children([StateNode::new("Paused"), StateNode::new("Playing")])
///     .unwrap()
///     .set_initial("Playing")
///     .unwrap();
///
/// assert_eq!(running.initial_child(), Some("Playing"));
/// assert_eq!(running.children().len(), 2);
/// ```
pub struct StateNode {
    pub(crate) name: String,
    pub(crate) children: Vec<StateNode>,
    pub(crate) initial: Option<String>,
    pub(crate) use_history: bool,
    pub(crate) orthogonal: bool,
    pub(crate) handlers: HashMap<String, Handler>,
}

impl StateNode {
    /// Create a detached, inactive state.
    ///
    /// Names are checked when the node is added to a tree: they must be
    /// non-empty and unique across the statechart.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            initial: None,
            use_history: false,
            orthogonal: false,
            handlers: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[StateNode] {
        &self.children
    }

    pub fn initial_child(&self) -> Option<&str> {
        self.initial.as_deref()
    }

    pub fn uses_history(&self) -> bool {
        self.use_history
    }

    pub fn is_orthogonal(&self) -> bool {
        self.orthogonal
    }

    /// Whether a handler is registered for `event` on this node.
    pub fn handles(&self, event: &str) -> bool {
        self.handlers.contains_key(event)
    }

    /// Add `child` as a substate.
    ///
    /// Fails if any name in `child`'s subtree is empty or already used in
    /// this node's subtree.
    pub fn add_child(&mut self, child: StateNode) -> Result<&mut Self, StatechartError> {
        let mut names = HashSet::new();
        self.collect_names(&mut names);
        child.check_names(&mut names)?;
        self.children.push(child);
        Ok(self)
    }

    /// Add several substates, stopping at the first rejected one.
    pub fn add_children<I>(&mut self, children: I) -> Result<&mut Self, StatechartError>
    where
        I: IntoIterator<Item = StateNode>,
    {
        for child in children {
            self.add_child(child)?;
        }
        Ok(self)
    }

    /// Make the existing substate named `name` the initial substate.
    pub fn set_initial(&mut self, name: &str) -> Result<&mut Self, StatechartError> {
        if !self.children.iter().any(|c| c.name == name) {
            return Err(StatechartError::NotASubstate {
                parent: self.name.clone(),
                child: name.to_string(),
            });
        }
        self.initial = Some(name.to_string());
        Ok(self)
    }

    /// Add `child` as a substate and make it the initial substate.
    pub fn set_initial_child(&mut self, child: StateNode) -> Result<&mut Self, StatechartError> {
        let name = child.name.clone();
        self.add_child(child)?;
        self.initial = Some(name);
        Ok(self)
    }

    pub fn set_use_history(&mut self, use_history: bool) -> &mut Self {
        self.use_history = use_history;
        self
    }

    pub fn set_orthogonal(&mut self, orthogonal: bool) -> &mut Self {
        self.orthogonal = orthogonal;
        self
    }

    /// Register `handler` for `event`, replacing any previous handler.
    pub fn on<F>(&mut self, event: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&mut Statechart, StateId, Option<&Payload>) + 'static,
    {
        self.handlers.insert(event.into(), Rc::new(handler));
        self
    }

    pub fn on_enter<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Statechart, StateId, Option<&Payload>) + 'static,
    {
        self.on(ENTER_STATE, handler)
    }

    pub fn on_exit<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Statechart, StateId, Option<&Payload>) + 'static,
    {
        self.on(EXIT_STATE, handler)
    }

    /// Remove the handler for `event`. No-op when none is registered.
    pub fn remove_handler(&mut self, event: &str) -> &mut Self {
        self.handlers.remove(event);
        self
    }

    pub(crate) fn collect_names<'a>(&'a self, names: &mut HashSet<&'a str>) {
        names.insert(&self.name);
        for child in &self.children {
            child.collect_names(names);
        }
    }

    /// Check this subtree's names against `taken`, adding them as it goes.
    pub(crate) fn check_names<'a>(
        &'a self,
        taken: &mut HashSet<&'a str>,
    ) -> Result<(), StatechartError> {
        if self.name.is_empty() {
            return Err(StatechartError::EmptyName);
        }
        if !taken.insert(&self.name) {
            return Err(StatechartError::DuplicateName {
                name: self.name.clone(),
            });
        }
        for child in &self.children {
            child.check_names(taken)?;
        }
        Ok(())
    }
}

impl fmt::Debug for StateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut events: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        events.sort_unstable();
        f.debug_struct("StateNode")
            .field("name", &self.name)
            .field("initial", &self.initial)
            .field("use_history", &self.use_history)
            .field("orthogonal", &self.orthogonal)
            .field("handlers", &events)
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_has_defaults() {
        let node = StateNode::new("Idle");

        assert_eq!(node.name(), "Idle");
        assert!(node.children().is_empty());
        assert_eq!(node.initial_child(), None);
        assert!(!node.uses_history());
        assert!(!node.is_orthogonal());
    }

    #[test]
    fn add_child_rejects_duplicate_names_in_subtree() {
        let mut root = StateNode::new("Root");
        let mut running = StateNode::new("Running");
        running.add_child(StateNode::new("Idle")).unwrap();
        root.add_child(running).unwrap();

        let result = root.add_child(StateNode::new("Idle"));
        assert_eq!(
            result.unwrap_err(),
            StatechartError::DuplicateName {
                name: "Idle".into()
            }
        );
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn add_child_rejects_own_name() {
        let mut root = StateNode::new("Root");
        assert!(root.add_child(StateNode::new("Root")).is_err());
    }

    #[test]
    fn add_child_rejects_empty_names() {
        let mut root = StateNode::new("Root");
        assert_eq!(
            root.add_child(StateNode::new("")).unwrap_err(),
            StatechartError::EmptyName
        );
    }

    #[test]
    fn set_initial_requires_existing_substate() {
        let mut root = StateNode::new("Root");
        root.add_child(StateNode::new("A")).unwrap();

        assert!(root.set_initial("A").is_ok());
        assert!(matches!(
            root.set_initial("B"),
            Err(StatechartError::NotASubstate { .. })
        ));
        assert_eq!(root.initial_child(), Some("A"));
    }

    #[test]
    fn set_initial_child_adds_the_substate() {
        let mut root = StateNode::new("Root");
        root.set_initial_child(StateNode::new("A")).unwrap();

        assert_eq!(root.children().len(), 1);
        assert_eq!(root.initial_child(), Some("A"));
    }

    #[test]
    fn registering_twice_replaces_handler() {
        let mut node = StateNode::new("A");
        node.on("go", |_, _, _| {});
        node.on("go", |_, _, _| {});

        assert_eq!(node.handlers.len(), 1);
        assert!(node.handles("go"));
    }

    #[test]
    fn remove_handler_is_noop_when_missing() {
        let mut node = StateNode::new("A");
        node.on_enter(|_, _, _| {}).remove_handler("go");
        assert!(node.handles(ENTER_STATE));

        node.remove_handler(ENTER_STATE);
        assert!(!node.handles(ENTER_STATE));
    }

    #[test]
    fn debug_lists_handler_events() {
        let mut node = StateNode::new("A");
        node.on_exit(|_, _, _| {});
        let output = format!("{node:?}");
        assert!(output.contains("exit_state"));
    }
}
