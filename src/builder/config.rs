//! Statechart configuration.

use serde::{Deserialize, Serialize};

/// Number of transitions kept in the journal unless configured otherwise.
pub const DEFAULT_JOURNAL_CAPACITY: usize = 64;

/// Runtime configuration for a [`Statechart`](crate::Statechart).
///
/// Missing fields take their defaults, so a partial document is accepted:
///
/// ```rust
/// use hsm_chart::StatechartConfig;
///
/// let config: StatechartConfig = serde_json::from_str("{}").unwrap();
/// assert_eq!(config, StatechartConfig::default());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatechartConfig {
    /// Maximum number of transitions kept in the journal. Zero disables it.
    pub journal_capacity: usize,
}

impl Default for StatechartConfig {
    fn default() -> Self {
        Self {
            journal_capacity: DEFAULT_JOURNAL_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_deserializes_overrides() {
        let config: StatechartConfig =
            serde_json::from_str(r#"{"journal_capacity": 3}"#).unwrap();
        assert_eq!(config.journal_capacity, 3);
    }

    #[test]
    fn default_config_keeps_journal() {
        assert_eq!(
            StatechartConfig::default().journal_capacity,
            DEFAULT_JOURNAL_CAPACITY
        );
    }
}
