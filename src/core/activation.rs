//! Activation planning.
//!
//! Planning is pure: it reads the tree and produces the ordered enter/exit
//! steps that move the active configuration, or an error. Nothing is
//! mutated until a complete plan exists, so a rejected activation leaves
//! the chart untouched.

use super::error::StatechartError;
use super::tree::StateTree;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    Enter(usize),
    Exit(usize),
}

/// Ordered enter/exit steps for one activation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ActivationPlan {
    pub(crate) steps: Vec<Step>,
}

impl ActivationPlan {
    /// Enter the root and its default configuration.
    pub(crate) fn enter_chart(tree: &StateTree) -> Result<Self, StatechartError> {
        let mut plan = Self::default();
        plan.enter_default(tree, StateTree::ROOT)?;
        Ok(plan)
    }

    /// Exit every active state, leaves first, root last.
    pub(crate) fn exit_chart(tree: &StateTree) -> Self {
        let mut plan = Self::default();
        if tree.node(StateTree::ROOT).active {
            plan.exit_subtree(tree, StateTree::ROOT);
        }
        plan
    }

    /// Exit every active state, reachable from the root or not.
    pub(crate) fn exit_all(tree: &StateTree) -> Self {
        let mut steps: Vec<Step> = tree
            .active_below(StateTree::ROOT)
            .into_iter()
            .map(Step::Exit)
            .collect();
        if tree.node(StateTree::ROOT).active {
            steps.push(Step::Exit(StateTree::ROOT));
        }
        Self { steps }
    }

    /// Enter the default configuration wherever an active state lacks the
    /// active substates it needs: every region of an orthogonal state, one
    /// substate of any other composite state.
    ///
    /// States whose default cannot be resolved are left as they are.
    pub(crate) fn settle(tree: &StateTree) -> Self {
        let mut plan = Self::default();
        for index in tree.active_states() {
            let node = tree.node(index);
            let missing: Vec<usize> = if node.orthogonal {
                node.children
                    .iter()
                    .copied()
                    .filter(|&c| !tree.node(c).active)
                    .collect()
            } else if node.children.iter().any(|&c| tree.node(c).active) {
                Vec::new()
            } else {
                default_child(tree, index).ok().flatten().into_iter().collect()
            };

            for child in missing {
                let mut branch = Self::default();
                if branch.enter_default(tree, child).is_ok() {
                    plan.steps.extend(branch.steps);
                }
            }
        }
        plan
    }

    /// Move the active configuration so that `target` becomes active.
    ///
    /// The pivot is the nearest active ancestor of `target`. Only the active
    /// branch below the pivot is exited; the pivot itself and any orthogonal
    /// regions outside it are left alone. An already active target yields an
    /// empty plan.
    pub(crate) fn transition(tree: &StateTree, target: usize) -> Result<Self, StatechartError> {
        let mut plan = Self::default();
        if tree.node(target).active {
            return Ok(plan);
        }

        let mut path: Vec<usize> = tree
            .ancestry(target)
            .take_while(|&i| !tree.node(i).active)
            .collect();
        let pivot = path
            .last()
            .and_then(|&top| tree.node(top).parent)
            .ok_or(StatechartError::NotActive)?;
        path.reverse();

        for &child in tree.node(pivot).children.iter().rev() {
            if tree.node(child).active {
                plan.exit_subtree(tree, child);
            }
        }
        plan.enter_along(tree, &path)?;
        Ok(plan)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub(crate) fn exited(&self) -> impl Iterator<Item = usize> + '_ {
        self.steps.iter().filter_map(|step| match step {
            Step::Exit(i) => Some(*i),
            Step::Enter(_) => None,
        })
    }

    pub(crate) fn entered(&self) -> impl Iterator<Item = usize> + '_ {
        self.steps.iter().filter_map(|step| match step {
            Step::Enter(i) => Some(*i),
            Step::Exit(_) => None,
        })
    }

    fn exit_subtree(&mut self, tree: &StateTree, index: usize) {
        for &child in tree.node(index).children.iter().rev() {
            if tree.node(child).active {
                self.exit_subtree(tree, child);
            }
        }
        self.steps.push(Step::Exit(index));
    }

    /// Enter `path[0]` and walk down to the last element, fanning out into
    /// orthogonal siblings on the way and expanding defaults below the end.
    fn enter_along(&mut self, tree: &StateTree, path: &[usize]) -> Result<(), StatechartError> {
        let Some((&head, rest)) = path.split_first() else {
            return Ok(());
        };
        let Some(&next) = rest.first() else {
            return self.enter_default(tree, head);
        };

        self.steps.push(Step::Enter(head));
        let node = tree.node(head);
        if node.orthogonal {
            for &child in &node.children {
                if child == next {
                    self.enter_along(tree, rest)?;
                } else {
                    self.enter_default(tree, child)?;
                }
            }
            Ok(())
        } else {
            self.enter_along(tree, rest)
        }
    }

    fn enter_default(&mut self, tree: &StateTree, index: usize) -> Result<(), StatechartError> {
        self.steps.push(Step::Enter(index));
        let node = tree.node(index);
        if node.orthogonal {
            for &child in &node.children {
                self.enter_default(tree, child)?;
            }
            return Ok(());
        }
        match default_child(tree, index)? {
            Some(child) => self.enter_default(tree, child),
            None => Ok(()),
        }
    }
}

/// History if recorded and enabled, else the initial substate, else the only
/// substate. Leaves have no default child.
fn default_child(tree: &StateTree, index: usize) -> Result<Option<usize>, StatechartError> {
    let node = tree.node(index);
    if node.use_history {
        if let Some(history) = node.history {
            return Ok(Some(history));
        }
    }
    if let Some(initial) = node.initial {
        return Ok(Some(initial));
    }
    match node.children.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some(*only)),
        children => Err(StatechartError::MissingInitialState {
            state: node.name.clone(),
            substates: children.len(),
        }),
    }
}
