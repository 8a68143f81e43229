//! Binding symbolic event names to dispatch.
//!
//! Hosts that wire widgets to named actions can store an [`EventTrigger`]
//! per action and fire it against the chart.

use crate::core::{Payload, StatechartError};
use crate::runtime::Statechart;

/// A stored event name that dispatches itself to a chart.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventTrigger {
    event: String,
}

impl EventTrigger {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
        }
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// Dispatch the event, returning the number of handlers invoked.
    pub fn fire(&self, chart: &mut Statechart) -> Result<usize, StatechartError> {
        chart.dispatch(&self.event)
    }

    pub fn fire_with(
        &self,
        chart: &mut Statechart,
        payload: &Payload,
    ) -> Result<usize, StatechartError> {
        chart.dispatch_with(&self.event, Some(payload))
    }
}

impl From<&str> for EventTrigger {
    fn from(event: &str) -> Self {
        Self::new(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateNode;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn fire_dispatches_named_event() {
        let pressed = Rc::new(RefCell::new(Vec::new()));
        let mut root = StateNode::new("Root");
        let sink = pressed.clone();
        root.on("button_up", move |_, _, payload| {
            sink.borrow_mut().push(payload.cloned())
        });
        let mut chart = Statechart::new();
        chart.set_root(root).unwrap();
        chart.activate().unwrap();

        let trigger = EventTrigger::from("button_up");
        assert_eq!(trigger.event(), "button_up");
        assert_eq!(trigger.fire(&mut chart).unwrap(), 1);
        assert_eq!(
            trigger
                .fire_with(&mut chart, &serde_json::json!("x"))
                .unwrap(),
            1
        );

        assert_eq!(
            *pressed.borrow(),
            [None, Some(serde_json::json!("x"))]
        );
    }

    #[test]
    fn fire_on_inactive_chart_fails() {
        let mut chart = Statechart::new();
        chart.set_root(StateNode::new("Root")).unwrap();

        let trigger = EventTrigger::new("anything");
        assert_eq!(
            trigger.fire(&mut chart).unwrap_err(),
            StatechartError::NotActive
        );
    }
}
