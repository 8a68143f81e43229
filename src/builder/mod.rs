//! Builder API and configuration for statecharts.

mod chart;
mod config;

pub use chart::StatechartBuilder;
pub use config::{StatechartConfig, DEFAULT_JOURNAL_CAPACITY};
