//! Engine tuning handed in by the composition root.

use std::time::Duration;

/// What to do with a matched rule whose conditions do not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmetConditionsPolicy {
    /// Emit nothing for the rule.
    #[default]
    Skip,
    /// Emit an unsuccessful result with the message `"conditions not met"`.
    Report,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Per-dispatch timeout when the caller does not supply one.
    pub dispatch_timeout: Duration,
    /// Overall budget for one rule firing, measured from event arrival.
    pub rule_deadline: Option<Duration>,
    pub unmet_conditions: UnmetConditionsPolicy,
    /// Extra attempts for a device action that failed with a transient code.
    pub command_retries: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            dispatch_timeout: Duration::from_secs(5),
            rule_deadline: None,
            unmet_conditions: UnmetConditionsPolicy::default(),
            command_retries: 0,
        }
    }
}
