//! Core statechart types and logic.
//!
//! This module contains the pure core of the runtime:
//! - State identities and the detached `StateNode` builder
//! - The attached `StateTree` arena with its name index
//! - Activation planning and event routing
//!
//! Planning never mutates the tree. The `runtime` module executes plans and
//! invokes handlers.

pub(crate) mod activation;
pub(crate) mod dispatch;
mod error;
mod id;
mod node;
mod tree;

pub use error::StatechartError;
pub use id::{ChartId, StateId};
pub use node::{Handler, Payload, StateNode, ENTER_STATE, EXIT_STATE};
pub use tree::{StateRef, StateTree};
