//! Media Player Statechart
//!
//! This example demonstrates a hierarchical statechart with history and an
//! orthogonal region.
//!
//! Key concepts:
//! - Nested states with initial substates
//! - History recall when re-entering `Playing`
//! - Orthogonal `Volume` and `Track` regions active together
//! - Events bubbling from active leaves to the nearest handler
//!
//! Run with: cargo run --example media_player

use hsm_chart::{EventTrigger, StateNode, StatechartBuilder};

fn leaf(name: &'static str) -> StateNode {
    let mut node = StateNode::new(name);
    node.on_enter(move |_, _, _| println!("  enter {name}"))
        .on_exit(move |_, _, _| println!("  exit  {name}"));
    node
}

fn main() {
    println!("=== Media Player Statechart ===\n");

    let mut volume = StateNode::new("Volume");
    volume
        .set_initial_child(leaf("Normal"))
        .unwrap()
        .add_child(leaf("Muted"))
        .unwrap()
        .on("mute", |chart, _, _| {
            chart.activate_by_name("Muted").unwrap();
        });

    let mut track = StateNode::new("Track");
    track
        .set_use_history(true)
        .set_initial_child(leaf("Intro"))
        .unwrap()
        .add_child(leaf("Chorus"))
        .unwrap()
        .on("next", |chart, _, _| {
            chart.activate_by_name("Chorus").unwrap();
        });

    let mut playing = StateNode::new("Playing");
    playing
        .set_orthogonal(true)
        .add_children([volume, track])
        .unwrap()
        .on("stop", |chart, _, _| {
            chart.activate_by_name("Stopped").unwrap();
        });

    let mut root = StateNode::new("Player");
    root.set_initial_child(leaf("Stopped"))
        .unwrap()
        .add_child(playing)
        .unwrap()
        .on("play", |chart, _, _| {
            chart.activate_by_name("Playing").unwrap();
        });

    let mut chart = StatechartBuilder::new()
        .root(root)
        .journal_capacity(16)
        .build()
        .unwrap();

    println!("Activating:");
    chart.activate().unwrap();

    for event in ["play", "next", "mute", "stop", "play"] {
        println!("\nDispatch '{event}':");
        EventTrigger::new(event).fire(&mut chart).unwrap();
        println!("  active: {}", chart.active_state_names().join(", "));
    }

    println!("\nJournal:");
    for transition in chart.journal().transitions() {
        println!(
            "  {:?} {:?}: -{} +{}",
            transition.kind,
            transition.target,
            transition.exited.len(),
            transition.entered.len()
        );
    }

    println!("\nKey Characteristics:");
    println!("- Track recalls Chorus after Playing is re-entered (history)");
    println!("- Volume restarts at Normal (no history)");
    println!("- 'stop' is handled by Playing while either region is active");

    println!("\n=== Example Complete ===");
}
