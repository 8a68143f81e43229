//! Event routing over the active configuration.

use super::tree::StateTree;

/// The states whose handlers receive one dispatched event.
///
/// Each active leaf bubbles the event toward the root and stops at the first
/// state with a handler for it. Orthogonal branches bubble independently; a
/// state reached from several branches appears once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct DispatchRoute {
    pub(crate) targets: Vec<usize>,
}

impl DispatchRoute {
    pub(crate) fn resolve(tree: &StateTree, event: &str) -> Self {
        let mut targets: Vec<usize> = Vec::new();
        for leaf in tree.active_leaves() {
            let handler = tree
                .ancestry(leaf)
                .find(|&i| tree.node(i).handlers.contains_key(event));
            if let Some(index) = handler {
                if !targets.contains(&index) {
                    targets.push(index);
                }
            }
        }
        Self { targets }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
