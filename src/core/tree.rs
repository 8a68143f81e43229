//! Attached state trees.
//!
//! [`StateTree`] stores the states of one chart in an arena. Parent links
//! are plain indices into the arena and never own anything; children are
//! owned by the arena as a whole.

use super::error::StatechartError;
use super::id::{ChartId, StateId};
use super::node::{Handler, StateNode};
use std::collections::{HashMap, HashSet};

pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    pub(crate) initial: Option<usize>,
    pub(crate) history: Option<usize>,
    pub(crate) use_history: bool,
    pub(crate) orthogonal: bool,
    pub(crate) active: bool,
    pub(crate) handlers: HashMap<String, Handler>,
}

/// The states reachable from a chart's root, indexed by name.
pub struct StateTree {
    id: ChartId,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl StateTree {
    pub(crate) const ROOT: usize = 0;

    /// Attach a detached tree, validating every name before anything is built.
    pub fn new(root: StateNode) -> Result<Self, StatechartError> {
        root.check_names(&mut HashSet::new())?;

        let mut tree = Self {
            id: ChartId::new(),
            nodes: Vec::new(),
            index: HashMap::new(),
        };
        tree.attach(root, None);
        Ok(tree)
    }

    pub fn id(&self) -> ChartId {
        self.id
    }

    pub fn root(&self) -> StateId {
        StateId::new(self.id, Self::ROOT)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look a state up by name. Absence is not an error.
    pub fn find(&self, name: &str) -> Option<StateId> {
        self.index.get(name).map(|&index| self.id_of(index))
    }

    /// Read-only view of an attached state, if `id` belongs to this tree.
    pub fn state(&self, id: StateId) -> Option<StateRef<'_>> {
        self.resolve(id).ok().map(|index| StateRef { tree: self, index })
    }

    /// All states in attachment order (pre-order from the root).
    pub fn states(&self) -> impl Iterator<Item = StateRef<'_>> + '_ {
        (0..self.nodes.len()).map(move |index| StateRef { tree: self, index })
    }

    pub(crate) fn id_of(&self, index: usize) -> StateId {
        StateId::new(self.id, index)
    }

    pub(crate) fn resolve(&self, id: StateId) -> Result<usize, StatechartError> {
        if id.chart() != self.id {
            return Err(StatechartError::ForeignState {
                expected: self.id,
                found: id.chart(),
            });
        }
        if id.index() >= self.nodes.len() {
            return Err(StatechartError::UnknownState {
                name: format!("#{}", id.index()),
            });
        }
        Ok(id.index())
    }

    pub(crate) fn index_of(&self, name: &str) -> Result<usize, StatechartError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| StatechartError::UnknownState {
                name: name.to_string(),
            })
    }

    pub(crate) fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub(crate) fn node_mut(&mut self, index: usize) -> &mut Node {
        &mut self.nodes[index]
    }

    pub(crate) fn handler(&self, index: usize, event: &str) -> Option<Handler> {
        self.nodes[index].handlers.get(event).cloned()
    }

    /// Attach `child` under `parent`, checking names against the whole tree.
    pub(crate) fn add_child(
        &mut self,
        parent: usize,
        child: StateNode,
    ) -> Result<usize, StatechartError> {
        let mut taken: HashSet<&str> = self.index.keys().map(String::as_str).collect();
        child.check_names(&mut taken)?;

        let index = self.attach(child, Some(parent));
        self.nodes[parent].children.push(index);
        Ok(index)
    }

    pub(crate) fn set_initial(
        &mut self,
        parent: usize,
        child: usize,
    ) -> Result<(), StatechartError> {
        self.ensure_substate(parent, child)?;
        self.nodes[parent].initial = Some(child);
        Ok(())
    }

    pub(crate) fn set_history(
        &mut self,
        parent: usize,
        child: Option<usize>,
    ) -> Result<(), StatechartError> {
        if let Some(child) = child {
            self.ensure_substate(parent, child)?;
        }
        self.nodes[parent].history = child;
        Ok(())
    }

    fn ensure_substate(&self, parent: usize, child: usize) -> Result<(), StatechartError> {
        if self.nodes[child].parent == Some(parent) {
            Ok(())
        } else {
            Err(StatechartError::NotASubstate {
                parent: self.nodes[parent].name.clone(),
                child: self.nodes[child].name.clone(),
            })
        }
    }

    /// Dotted path from the root, e.g. `Root.Running.Paused`.
    pub(crate) fn path(&self, index: usize) -> String {
        let mut names: Vec<&str> = self
            .ancestry(index)
            .map(|i| self.nodes[i].name.as_str())
            .collect();
        names.reverse();
        names.join(".")
    }

    /// `index` followed by each of its ancestors up to the root.
    pub(crate) fn ancestry(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(Some(index), move |&i| self.nodes[i].parent)
    }

    /// Indices of all active states in pre-order.
    pub(crate) fn active_states(&self) -> Vec<usize> {
        let mut active = Vec::new();
        if self.nodes[Self::ROOT].active {
            self.collect_active(Self::ROOT, &mut active);
        }
        active
    }

    fn collect_active(&self, index: usize, out: &mut Vec<usize>) {
        out.push(index);
        for &child in &self.nodes[index].children {
            if self.nodes[child].active {
                self.collect_active(child, out);
            }
        }
    }

    /// Active states with no active substates, in child order.
    pub(crate) fn active_leaves(&self) -> Vec<usize> {
        self.active_states()
            .into_iter()
            .filter(|&i| !self.nodes[i].children.iter().any(|&c| self.nodes[c].active))
            .collect()
    }

    /// Active states strictly below `index`, latest attachments first.
    ///
    /// A child is always attached after its parent, so substates come
    /// before their parents in the result.
    pub(crate) fn active_below(&self, index: usize) -> Vec<usize> {
        (index + 1..self.nodes.len())
            .rev()
            .filter(|&i| self.nodes[i].active && self.ancestry(i).skip(1).any(|a| a == index))
            .collect()
    }

    /// Whether entering `index` keeps the configuration connected: the state
    /// is inactive, its parent is active, and a non-orthogonal parent has no
    /// other active substate.
    pub(crate) fn can_enter(&self, index: usize) -> bool {
        let node = &self.nodes[index];
        if node.active {
            return false;
        }
        match node.parent {
            None => true,
            Some(parent) => {
                let parent = &self.nodes[parent];
                let occupied = parent.children.iter().any(|&c| self.nodes[c].active);
                parent.active && (parent.orthogonal || !occupied)
            }
        }
    }

    fn attach(&mut self, node: StateNode, parent: Option<usize>) -> usize {
        let StateNode {
            name,
            children,
            initial,
            use_history,
            orthogonal,
            handlers,
        } = node;

        let index = self.nodes.len();
        self.index.insert(name.clone(), index);
        self.nodes.push(Node {
            name,
            parent,
            children: Vec::with_capacity(children.len()),
            initial: None,
            history: None,
            use_history,
            orthogonal,
            active: false,
            handlers,
        });

        for child in children {
            let is_initial = initial.as_deref() == Some(child.name.as_str());
            let child_index = self.attach(child, Some(index));
            self.nodes[index].children.push(child_index);
            if is_initial {
                self.nodes[index].initial = Some(child_index);
            }
        }
        index
    }
}

/// Read-only view of an attached state.
#[derive(Clone, Copy)]
pub struct StateRef<'a> {
    tree: &'a StateTree,
    index: usize,
}

impl<'a> StateRef<'a> {
    pub fn id(&self) -> StateId {
        self.tree.id_of(self.index)
    }

    pub fn name(&self) -> &'a str {
        &self.node().name
    }

    pub fn is_active(&self) -> bool {
        self.node().active
    }

    /// The chart this state is attached to.
    pub fn statechart(&self) -> ChartId {
        self.tree.id
    }

    pub fn parent(&self) -> Option<StateId> {
        self.node().parent.map(|i| self.tree.id_of(i))
    }

    pub fn children(&self) -> Vec<StateId> {
        self.node()
            .children
            .iter()
            .map(|&i| self.tree.id_of(i))
            .collect()
    }

    pub fn initial_child(&self) -> Option<StateId> {
        self.node().initial.map(|i| self.tree.id_of(i))
    }

    pub fn history_child(&self) -> Option<StateId> {
        self.node().history.map(|i| self.tree.id_of(i))
    }

    pub fn uses_history(&self) -> bool {
        self.node().use_history
    }

    pub fn is_orthogonal(&self) -> bool {
        self.node().orthogonal
    }

    pub fn handles(&self, event: &str) -> bool {
        self.node().handlers.contains_key(event)
    }

    /// Dotted path from the root to this state.
    pub fn path(&self) -> String {
        self.tree.path(self.index)
    }

    fn node(&self) -> &'a Node {
        &self.tree.nodes[self.index]
    }
}

impl std::fmt::Debug for StateRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateRef")
            .field("path", &self.path())
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StateNode {
        let mut running = StateNode::new("Running");
        running
            .add_children([StateNode::new("Paused"), StateNode::new("Active")])
            .unwrap()
            .set_initial("Active")
            .unwrap();

        let mut root = StateNode::new("Root");
        root.set_initial_child(StateNode::new("Idle"))
            .unwrap()
            .add_child(running)
            .unwrap();
        root
    }

    fn activate(tree: &mut StateTree, names: &[&str]) {
        for name in names {
            let index = tree.index_of(name).unwrap();
            tree.node_mut(index).active = true;
        }
    }

    #[test]
    fn active_below_lists_substates_first() {
        let mut tree = StateTree::new(sample()).unwrap();
        activate(&mut tree, &["Root", "Running", "Paused"]);

        let names: Vec<&str> = tree
            .active_below(StateTree::ROOT)
            .into_iter()
            .map(|i| tree.node(i).name.as_str())
            .collect();
        assert_eq!(names, ["Paused", "Running"]);

        let idle = tree.index_of("Idle").unwrap();
        assert!(tree.active_below(idle).is_empty());
    }

    #[test]
    fn can_enter_requires_active_parent_and_free_slot() {
        let mut tree = StateTree::new(sample()).unwrap();
        let root = StateTree::ROOT;
        let running = tree.index_of("Running").unwrap();
        let paused = tree.index_of("Paused").unwrap();
        let active = tree.index_of("Active").unwrap();

        assert!(tree.can_enter(root));
        assert!(!tree.can_enter(running));

        activate(&mut tree, &["Root", "Running", "Active"]);
        assert!(!tree.can_enter(root));
        assert!(!tree.can_enter(active));
        assert!(!tree.can_enter(paused));

        tree.node_mut(running).orthogonal = true;
        assert!(tree.can_enter(paused));
    }

    #[test]
    fn attach_builds_name_index() {
        let tree = StateTree::new(sample()).unwrap();

        assert_eq!(tree.len(), 5);
        for name in ["Root", "Idle", "Running", "Paused", "Active"] {
            let id = tree.find(name).unwrap();
            assert_eq!(tree.state(id).unwrap().name(), name);
        }
        assert!(tree.find("Missing").is_none());
    }

    #[test]
    fn attach_links_parents_and_initial_children() {
        let tree = StateTree::new(sample()).unwrap();
        let running = tree.state(tree.find("Running").unwrap()).unwrap();

        assert_eq!(running.parent(), Some(tree.root()));
        assert_eq!(running.initial_child(), tree.find("Active"));
        assert_eq!(running.children().len(), 2);
        assert_eq!(running.statechart(), tree.id());
        assert!(!running.is_active());
    }

    #[test]
    fn attach_rejects_duplicate_names() {
        let mut a = StateNode::new("A");
        a.add_child(StateNode::new("X")).unwrap();
        let mut b = StateNode::new("B");
        b.add_child(StateNode::new("X")).unwrap();
        let mut root = StateNode::new("Root");
        root.add_children([a, b]).unwrap_err();

        let mut a = StateNode::new("A");
        a.add_child(StateNode::new("Root")).unwrap();
        let mut root = StateNode::new("Root");
        root.children.push(a);

        assert_eq!(
            StateTree::new(root).err(),
            Some(StatechartError::DuplicateName {
                name: "Root".into()
            })
        );
    }

    #[test]
    fn add_child_checks_names_against_whole_tree() {
        let mut tree = StateTree::new(sample()).unwrap();
        let running = tree.index_of("Running").unwrap();

        let result = tree.add_child(running, StateNode::new("Idle"));
        assert!(matches!(result, Err(StatechartError::DuplicateName { .. })));
        assert_eq!(tree.len(), 5);

        let stopped = tree.add_child(running, StateNode::new("Stopped")).unwrap();
        assert_eq!(tree.node(stopped).parent, Some(running));
        assert_eq!(tree.find("Stopped"), Some(tree.id_of(stopped)));
    }

    #[test]
    fn set_initial_rejects_non_substates() {
        let mut tree = StateTree::new(sample()).unwrap();
        let running = tree.index_of("Running").unwrap();
        let idle = tree.index_of("Idle").unwrap();
        let paused = tree.index_of("Paused").unwrap();

        assert!(tree.set_initial(running, idle).is_err());
        assert!(tree.set_initial(running, paused).is_ok());
        assert_eq!(tree.node(running).initial, Some(paused));
    }

    #[test]
    fn foreign_ids_are_rejected() {
        let tree = StateTree::new(sample()).unwrap();
        let other = StateTree::new(StateNode::new("Other")).unwrap();

        assert!(tree.state(other.root()).is_none());
        assert!(matches!(
            tree.resolve(other.root()),
            Err(StatechartError::ForeignState { .. })
        ));
    }

    #[test]
    fn path_joins_names_from_root() {
        let tree = StateTree::new(sample()).unwrap();
        let paused = tree.state(tree.find("Paused").unwrap()).unwrap();

        assert_eq!(paused.path(), "Root.Running.Paused");
        assert_eq!(tree.state(tree.root()).unwrap().path(), "Root");
    }
}
