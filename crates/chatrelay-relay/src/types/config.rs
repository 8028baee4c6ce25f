use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning for the per-turn loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// How many recent messages are sent as context
    pub context_messages: u32,
    /// Delay after each forwarded fragment; zero disables pacing
    pub pacing_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            context_messages: 10,
            pacing_ms: 10,
        }
    }
}

impl RelayConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn without_pacing(mut self) -> Self {
        self.pacing_ms = 0;
        self
    }
}
