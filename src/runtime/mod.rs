//! The imperative shell around the pure core.
//!
//! # Key Concepts
//!
//! - **Statechart**: owns the tree, executes activation plans, invokes handlers
//! - **Journal**: bounded record of executed transitions
//! - **Event triggers**: symbolic names bound to `dispatch`

mod adapter;
mod journal;
mod statechart;

pub use adapter::EventTrigger;
pub use journal::{Transition, TransitionJournal, TransitionKind};
pub use statechart::Statechart;
