//! Per-deployment session settings.

use std::time::Duration;

use crate::domain::scenario::ScenarioScript;

/// Deadline for one decision call unless configured otherwise.
pub const DEFAULT_DECISION_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings shared by every session handler.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Setup of every new session.
    pub script: ScenarioScript,
    /// How long a decision call may take before it is abandoned.
    pub decision_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            script: ScenarioScript::default(),
            decision_timeout: DEFAULT_DECISION_TIMEOUT,
        }
    }
}
