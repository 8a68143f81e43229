//! The statechart facade.

use crate::builder::StatechartConfig;
use crate::core::activation::{ActivationPlan, Step};
use crate::core::dispatch::DispatchRoute;
use crate::core::{
    ChartId, Payload, StateId, StateNode, StateRef, StateTree, StatechartError, ENTER_STATE,
    EXIT_STATE,
};
use crate::runtime::journal::{Transition, TransitionJournal, TransitionKind};
use chrono::Utc;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, trace};

/// A hierarchical state machine with a single root state.
///
/// The chart owns its state tree, executes activation plans and routes
/// events to the handlers of active states. All calls run synchronously to
/// completion; handlers may call back into the chart, and such nested calls
/// finish before the outer call resumes.
///
/// # Example
///
/// ```rust
/// use hsm_chart::{Statechart, StateNode};
///
/// let mut running = StateNode::new("Running");
/// running
///     .set_use_history(true)
///     .add_children([StateNode::new("Paused"), StateNode::new("Active")])
///     .unwrap()
///     .set_initial("Active")
///     .unwrap();
///
/// let mut root = StateNode::new("Root");
/// root.set_initial_child(StateNode::new("Idle"))
///     .unwrap()
///     .add_child(running)
///     .unwrap();
///
/// let mut chart = Statechart::new();
/// chart.set_root(root).unwrap();
/// chart.activate().unwrap();
///
/// chart.activate_by_name("Paused").unwrap();
/// chart.activate_by_name("Idle").unwrap();
/// chart.activate_by_name("Running").unwrap();
///
/// assert_eq!(chart.active_state_names(), ["Root", "Running", "Paused"]);
/// ```
pub struct Statechart {
    tree: Option<StateTree>,
    active: bool,
    journal: TransitionJournal,
}

impl Statechart {
    /// Create an empty, inactive chart with default configuration.
    pub fn new() -> Self {
        Self::with_config(StatechartConfig::default())
    }

    pub fn with_config(config: StatechartConfig) -> Self {
        Self {
            tree: None,
            active: false,
            journal: TransitionJournal::new(config.journal_capacity),
        }
    }

    /// Attach `root` and every state below it, replacing any previous tree.
    ///
    /// The chart gets a fresh [`ChartId`]; ids issued for a previous tree
    /// become foreign.
    pub fn set_root(&mut self, root: StateNode) -> Result<StateId, StatechartError> {
        self.ensure_inactive()?;
        let tree = StateTree::new(root)?;
        let id = tree.root();
        debug!(chart = %tree.id(), states = tree.len(), "Attached state tree");
        self.tree = Some(tree);
        Ok(id)
    }

    pub fn root(&self) -> Option<StateId> {
        self.tree.as_ref().map(StateTree::root)
    }

    /// Identity of the attached tree.
    pub fn id(&self) -> Option<ChartId> {
        self.tree.as_ref().map(StateTree::id)
    }

    pub fn tree(&self) -> Option<&StateTree> {
        self.tree.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn find_state(&self, name: &str) -> Option<StateId> {
        self.tree.as_ref()?.find(name)
    }

    pub fn state(&self, id: StateId) -> Option<StateRef<'_>> {
        self.tree.as_ref()?.state(id)
    }

    pub fn state_named(&self, name: &str) -> Option<StateRef<'_>> {
        let tree = self.tree.as_ref()?;
        tree.state(tree.find(name)?)
    }

    /// Active states in pre-order, root first.
    pub fn active_states(&self) -> Vec<StateId> {
        match &self.tree {
            Some(tree) => tree
                .active_states()
                .into_iter()
                .map(|i| tree.id_of(i))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn active_state_names(&self) -> Vec<&str> {
        match &self.tree {
            Some(tree) => tree
                .active_states()
                .into_iter()
                .map(|i| tree.node(i).name.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Active states without active substates.
    pub fn active_leaves(&self) -> Vec<StateId> {
        match &self.tree {
            Some(tree) => tree
                .active_leaves()
                .into_iter()
                .map(|i| tree.id_of(i))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn journal(&self) -> &TransitionJournal {
        &self.journal
    }

    pub fn journal_mut(&mut self) -> &mut TransitionJournal {
        &mut self.journal
    }

    /// Enter the root and its default configuration.
    pub fn activate(&mut self) -> Result<Transition, StatechartError> {
        self.activate_with(None)
    }

    /// Like [`activate`](Self::activate), forwarding `payload` to enter handlers.
    pub fn activate_with(
        &mut self,
        payload: Option<&Payload>,
    ) -> Result<Transition, StatechartError> {
        let tree = self.tree.as_ref().ok_or(StatechartError::NoRoot)?;
        if self.active {
            return Err(StatechartError::AlreadyActive);
        }
        let plan = ActivationPlan::enter_chart(tree)?;

        debug!(chart = %tree.id(), "Activating statechart");
        self.active = true;
        Ok(self.execute(TransitionKind::Activate, None, plan, true, payload))
    }

    /// Exit the whole active configuration, recording history on the way.
    pub fn deactivate(&mut self) -> Result<Transition, StatechartError> {
        self.deactivate_with(None)
    }

    pub fn deactivate_with(
        &mut self,
        payload: Option<&Payload>,
    ) -> Result<Transition, StatechartError> {
        let tree = self.tree.as_ref().ok_or(StatechartError::NoRoot)?;
        if !self.active {
            return Err(StatechartError::NotActive);
        }
        let plan = ActivationPlan::exit_chart(tree);

        debug!(chart = %tree.id(), "Deactivating statechart");
        let mut changes = Changes::default();
        self.run(plan, true, payload, &mut changes);
        self.active = false;

        // Exit handlers may have activated states through nested calls.
        if let Some(tree) = self.tree.as_ref() {
            let rest = ActivationPlan::exit_all(tree);
            if !rest.is_empty() {
                debug!(states = rest.steps.len(), "Exiting states entered while deactivating");
                self.run(rest, true, payload, &mut changes);
            }
        }
        Ok(self.record(TransitionKind::Deactivate, None, changes))
    }

    /// Activate the state named `name`, saving history.
    pub fn activate_by_name(&mut self, name: &str) -> Result<Transition, StatechartError> {
        self.activate_by_name_with(name, true, None)
    }

    pub fn activate_by_name_with(
        &mut self,
        name: &str,
        save_history: bool,
        payload: Option<&Payload>,
    ) -> Result<Transition, StatechartError> {
        let tree = self.tree.as_ref().ok_or(StatechartError::NoRoot)?;
        let target = tree.index_of(name)?;
        self.transition_to(target, save_history, payload)
    }

    /// Activate `state`, saving history.
    pub fn activate_state(&mut self, state: StateId) -> Result<Transition, StatechartError> {
        self.activate_state_with(state, true, None)
    }

    /// Activate `state`.
    ///
    /// Exits the active branch below the nearest active ancestor of `state`,
    /// enters the states down to `state` and then its default configuration.
    /// When `save_history` is false no history substates are recorded.
    /// Activating an already active state changes nothing.
    pub fn activate_state_with(
        &mut self,
        state: StateId,
        save_history: bool,
        payload: Option<&Payload>,
    ) -> Result<Transition, StatechartError> {
        let tree = self.tree.as_ref().ok_or(StatechartError::NoRoot)?;
        let target = tree.resolve(state)?;
        self.transition_to(target, save_history, payload)
    }

    /// Dispatch `event` to the active states.
    ///
    /// Returns the number of handlers invoked. Unhandled events are dropped.
    pub fn dispatch(&mut self, event: &str) -> Result<usize, StatechartError> {
        self.dispatch_with(event, None)
    }

    pub fn dispatch_with(
        &mut self,
        event: &str,
        payload: Option<&Payload>,
    ) -> Result<usize, StatechartError> {
        let tree = self.tree.as_ref().ok_or(StatechartError::NoRoot)?;
        if !self.active {
            return Err(StatechartError::NotActive);
        }
        let route = DispatchRoute::resolve(tree, event);
        if route.is_empty() {
            trace!(event, "No active state handles event");
            return Ok(0);
        }

        let mut handled = 0;
        for index in route.targets {
            let Some(tree) = self.tree.as_ref() else {
                break;
            };
            if !tree.node(index).active {
                continue;
            }
            let Some(handler) = tree.handler(index, event) else {
                continue;
            };
            let id = tree.id_of(index);
            trace!(event, state = %tree.node(index).name, "Invoking handler");
            handler(self, id, payload);
            handled += 1;
        }
        debug!(event, handled, "Dispatched event");
        Ok(handled)
    }

    /// Attach `child` below `parent`. The chart must be inactive.
    pub fn add_child(
        &mut self,
        parent: StateId,
        child: StateNode,
    ) -> Result<StateId, StatechartError> {
        self.ensure_inactive()?;
        let tree = self.tree_mut()?;
        let parent = tree.resolve(parent)?;
        let index = tree.add_child(parent, child)?;
        Ok(tree.id_of(index))
    }

    /// Make `child` the initial substate of `parent`. The chart must be inactive.
    pub fn set_initial_child(
        &mut self,
        parent: StateId,
        child: StateId,
    ) -> Result<(), StatechartError> {
        self.ensure_inactive()?;
        let tree = self.tree_mut()?;
        let parent = tree.resolve(parent)?;
        let child = tree.resolve(child)?;
        tree.set_initial(parent, child)
    }

    /// Overwrite the recorded history substate of `parent`.
    pub fn set_history_child(
        &mut self,
        parent: StateId,
        child: Option<StateId>,
    ) -> Result<(), StatechartError> {
        let tree = self.tree_mut()?;
        let parent = tree.resolve(parent)?;
        let child = child.map(|c| tree.resolve(c)).transpose()?;
        tree.set_history(parent, child)
    }

    pub fn set_use_history(
        &mut self,
        state: StateId,
        use_history: bool,
    ) -> Result<(), StatechartError> {
        let tree = self.tree_mut()?;
        let index = tree.resolve(state)?;
        tree.node_mut(index).use_history = use_history;
        Ok(())
    }

    /// Change whether the substates of `state` are orthogonal. The chart must be inactive.
    pub fn set_orthogonal(
        &mut self,
        state: StateId,
        orthogonal: bool,
    ) -> Result<(), StatechartError> {
        self.ensure_inactive()?;
        let tree = self.tree_mut()?;
        let index = tree.resolve(state)?;
        tree.node_mut(index).orthogonal = orthogonal;
        Ok(())
    }

    /// Register `handler` for `event` on `state`, replacing any previous one.
    pub fn on<F>(&mut self, state: StateId, event: &str, handler: F) -> Result<(), StatechartError>
    where
        F: Fn(&mut Statechart, StateId, Option<&Payload>) + 'static,
    {
        let tree = self.tree_mut()?;
        let index = tree.resolve(state)?;
        tree.node_mut(index)
            .handlers
            .insert(event.to_string(), Rc::new(handler));
        Ok(())
    }

    pub fn on_enter<F>(&mut self, state: StateId, handler: F) -> Result<(), StatechartError>
    where
        F: Fn(&mut Statechart, StateId, Option<&Payload>) + 'static,
    {
        self.on(state, ENTER_STATE, handler)
    }

    pub fn on_exit<F>(&mut self, state: StateId, handler: F) -> Result<(), StatechartError>
    where
        F: Fn(&mut Statechart, StateId, Option<&Payload>) + 'static,
    {
        self.on(state, EXIT_STATE, handler)
    }

    /// Remove the handler for `event` on `state`. No-op when none is registered.
    pub fn remove_handler(&mut self, state: StateId, event: &str) -> Result<(), StatechartError> {
        let tree = self.tree_mut()?;
        let index = tree.resolve(state)?;
        tree.node_mut(index).handlers.remove(event);
        Ok(())
    }

    fn transition_to(
        &mut self,
        target: usize,
        save_history: bool,
        payload: Option<&Payload>,
    ) -> Result<Transition, StatechartError> {
        if !self.active {
            return Err(StatechartError::NotActive);
        }
        let tree = self.tree.as_ref().ok_or(StatechartError::NoRoot)?;
        let name = tree.node(target).name.clone();
        let plan = ActivationPlan::transition(tree, target)?;
        if plan.is_empty() {
            trace!(state = %name, "State already active");
            return Ok(Transition::unchanged(Some(name)));
        }

        debug!(
            state = %name,
            exits = plan.exited().count(),
            enters = plan.entered().count(),
            save_history,
            "Activating state"
        );
        Ok(self.execute(TransitionKind::Move, Some(name), plan, save_history, payload))
    }

    /// Run `plan` and journal what it changed.
    fn execute(
        &mut self,
        kind: TransitionKind,
        target: Option<String>,
        plan: ActivationPlan,
        save_history: bool,
        payload: Option<&Payload>,
    ) -> Transition {
        let mut changes = Changes::default();
        self.run(plan, save_history, payload, &mut changes);
        self.record(kind, target, changes)
    }

    /// Apply `plan` step by step against the live tree, calling handlers.
    ///
    /// Handlers may move the configuration through nested calls, so every
    /// step is checked before it runs. An enter is skipped when it would
    /// disconnect the configuration or give a composite state a second
    /// active substate. An exit is skipped for an inactive state, and
    /// exiting a state first exits anything entered below it.
    /// While the chart is active the run ends by entering whatever default
    /// substates the resulting configuration is missing.
    fn run(
        &mut self,
        plan: ActivationPlan,
        save_history: bool,
        payload: Option<&Payload>,
        changes: &mut Changes,
    ) {
        let mut steps: VecDeque<Step> = plan.steps.into();
        loop {
            while let Some(step) = steps.pop_front() {
                let Some(tree) = self.tree.as_mut() else {
                    return;
                };
                let (index, event) = match step {
                    Step::Exit(index) => {
                        if !tree.node(index).active {
                            trace!(state = %tree.node(index).name, "Skipping stale exit");
                            continue;
                        }
                        let below = tree.active_below(index);
                        if !below.is_empty() {
                            steps.push_front(Step::Exit(index));
                            for &child in below.iter().rev() {
                                steps.push_front(Step::Exit(child));
                            }
                            continue;
                        }
                        tree.node_mut(index).active = false;
                        if save_history {
                            record_history(tree, index);
                        }
                        changes.exited.push(tree.node(index).name.clone());
                        (index, EXIT_STATE)
                    }
                    Step::Enter(index) => {
                        if !tree.can_enter(index) {
                            trace!(state = %tree.node(index).name, "Skipping stale enter");
                            continue;
                        }
                        tree.node_mut(index).active = true;
                        changes.entered.push(tree.node(index).name.clone());
                        (index, ENTER_STATE)
                    }
                };
                trace!(state = %tree.node(index).name, event, "Step");

                if let Some(handler) = tree.handler(index, event) {
                    let id = tree.id_of(index);
                    handler(self, id, payload);
                }
            }

            let Some(tree) = self.tree.as_ref() else {
                return;
            };
            if !self.active {
                return;
            }
            let settle = ActivationPlan::settle(tree);
            if settle.is_empty() {
                return;
            }
            debug!(enters = settle.steps.len(), "Completing default configuration");
            steps.extend(settle.steps);
        }
    }

    fn record(
        &mut self,
        kind: TransitionKind,
        target: Option<String>,
        changes: Changes,
    ) -> Transition {
        let transition = Transition {
            kind,
            target,
            exited: changes.exited,
            entered: changes.entered,
            timestamp: Utc::now(),
        };
        self.journal.record(transition.clone());
        transition
    }

    fn ensure_inactive(&self) -> Result<(), StatechartError> {
        if self.active {
            Err(StatechartError::ReshapeWhileActive)
        } else {
            Ok(())
        }
    }

    fn tree_mut(&mut self) -> Result<&mut StateTree, StatechartError> {
        self.tree.as_mut().ok_or(StatechartError::NoRoot)
    }
}

impl Default for Statechart {
    fn default() -> Self {
        Self::new()
    }
}

/// Names exited and entered while running plans.
#[derive(Default)]
struct Changes {
    exited: Vec<String>,
    entered: Vec<String>,
}

/// Record `index` as its parent's history substate when the parent tracks it.
fn record_history(tree: &mut StateTree, index: usize) {
    let Some(parent) = tree.node(index).parent else {
        return;
    };
    let parent = tree.node_mut(parent);
    if parent.use_history && !parent.orthogonal {
        parent.history = Some(index);
    }
}
