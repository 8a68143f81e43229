//! hsm-chart: a hierarchical statechart runtime
//!
//! A statechart is a tree of named states. Activating a state enters it and
//! all of its ancestors, exits whatever was active on the way, and expands
//! the default configuration below it. Events dispatched to the chart bubble
//! from each active leaf to the nearest state that handles them.
//!
//! The crate follows a "pure core, imperative shell" split: the core plans
//! enter/exit cascades and event routes without side effects, and the
//! runtime executes those plans and invokes handlers.
//!
//! # Core Concepts
//!
//! - **States**: built detached as [`StateNode`] values, then attached to a
//!   [`Statechart`] and addressed by [`StateId`]
//! - **Orthogonal regions**: states whose substates are all active together
//! - **History**: states that recall their last active substate on re-entry
//! - **Handlers**: closures keyed by event name, including the
//!   [`ENTER_STATE`] and [`EXIT_STATE`] pseudo-events
//!
//! # Example
//!
//! ```rust
//! use hsm_chart::{Statechart, StateNode};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let presses = Rc::new(Cell::new(0));
//! let counter = presses.clone();
//!
//! let mut root = StateNode::new("Root");
//! root.on("press", move |chart, _, _| {
//!     counter.set(counter.get() + 1);
//!     chart.activate_by_name("On").unwrap();
//! });
//! root.set_initial_child(StateNode::new("Off"))
//!     .unwrap()
//!     .add_child(StateNode::new("On"))
//!     .unwrap();
//!
//! let mut chart = Statechart::new();
//! chart.set_root(root).unwrap();
//! chart.activate().unwrap();
//! assert_eq!(chart.active_state_names(), ["Root", "Off"]);
//!
//! chart.dispatch("press").unwrap();
//! assert_eq!(chart.active_state_names(), ["Root", "On"]);
//! assert_eq!(presses.get(), 1);
//! ```

pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod diagnostics;
pub mod runtime;

// Re-export commonly used types
pub use builder::{StatechartBuilder, StatechartConfig};
pub use checkpoint::{Checkpoint, CheckpointError};
pub use core::{
    ChartId, Handler, Payload, StateId, StateNode, StateRef, StateTree, StatechartError,
    ENTER_STATE, EXIT_STATE,
};
pub use diagnostics::ConfigIssue;
pub use runtime::{EventTrigger, Statechart, Transition, TransitionJournal, TransitionKind};
