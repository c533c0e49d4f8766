//! Evaluation policies.

use serde::{Deserialize, Serialize};

/// When records start being yielded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmupPolicy {
    /// Hold records back until every root has left warm-up.
    #[default]
    AllRoots,
    /// Yield every tick; roots still warming up are left out of the record.
    Partial,
}

/// What a failing root does to its output lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Report the fault on the failing tick and keep the lane open.
    #[default]
    Mark,
    /// Report the fault once, then drop the root from later records.
    CloseLane,
}

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub warmup: WarmupPolicy,
    #[serde(default)]
    pub on_error: ErrorPolicy,
    /// Emit a progress event every this many ticks (0 disables it).
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,
}

fn default_progress_every() -> u64 {
    10_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            warmup: WarmupPolicy::default(),
            on_error: ErrorPolicy::default(),
            progress_every: default_progress_every(),
        }
    }
}

impl EngineConfig {
    pub fn with_warmup(mut self, warmup: WarmupPolicy) -> Self {
        self.warmup = warmup;
        self
    }

    pub fn with_error_policy(mut self, on_error: ErrorPolicy) -> Self {
        self.on_error = on_error;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.warmup, WarmupPolicy::AllRoots);
        assert_eq!(config.on_error, ErrorPolicy::Mark);
        assert_eq!(config.progress_every, 10_000);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"warmup": "partial", "on_error": "close_lane"}"#).unwrap();
        assert_eq!(config.warmup, WarmupPolicy::Partial);
        assert_eq!(config.on_error, ErrorPolicy::CloseLane);
        assert_eq!(config.progress_every, 10_000);
    }
}
