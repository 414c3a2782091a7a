//! Execution results: immutable snapshots produced once per dispatch,
//! action, rule firing or scene activation.
//!
//! Fields are private and exposed through getters so a result can never be
//! changed after it has been reported.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::id::{DeviceId, RuleId, SceneId};
use crate::time::{Timestamp, now};

/// Machine-readable reason for an unsuccessful result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The device or scene is unknown.
    NotFound,
    /// The device's capability set does not allow the command.
    UnsupportedCapability,
    /// The device is offline or its transport could not reach it.
    Unreachable,
    /// The connector did not answer within the dispatch timeout.
    Timeout,
    /// The connector refused the command.
    ConnectorRejected,
    /// No connector is registered for the device's protocol.
    NoConnector,
    /// The authorization hook vetoed the action.
    Denied,
    /// The rule's overall deadline passed before the action could finish.
    DeadlineExceeded,
    /// The command's values are out of range.
    InvalidCommand,
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::UnsupportedCapability => "UNSUPPORTED_CAPABILITY",
            Self::Unreachable => "UNREACHABLE",
            Self::Timeout => "TIMEOUT",
            Self::ConnectorRejected => "CONNECTOR_REJECTED",
            Self::NoConnector => "NO_CONNECTOR",
            Self::Denied => "DENIED",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::InvalidCommand => "INVALID_COMMAND",
        }
    }

    /// Failures worth another attempt.
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Timeout | Self::Unreachable)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one command sent to one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceCommandResult {
    success: bool,
    message: String,
    device_id: DeviceId,
    command_type: String,
    timestamp: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<ErrorCode>,
}

impl DeviceCommandResult {
    #[must_use]
    pub fn succeeded(
        device_id: DeviceId,
        command_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            message: message.into(),
            device_id,
            command_type: command_type.into(),
            timestamp: now(),
            error_code: None,
        }
    }

    #[must_use]
    pub fn failed(
        device_id: DeviceId,
        command_type: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            device_id,
            command_type: command_type.into(),
            timestamp: now(),
            error_code: Some(code),
        }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    #[must_use]
    pub fn command_type(&self) -> &str {
        &self.command_type
    }

    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    #[must_use]
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error_code
    }
}

/// Outcome of one action of a rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    action_type: String,
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<ErrorCode>,
}

impl ActionResult {
    #[must_use]
    pub fn new(action_type: impl Into<String>, success: bool, message: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            success,
            message: message.into(),
            error_code: None,
        }
    }

    #[must_use]
    pub fn succeeded(action_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            success: true,
            message: message.into(),
            error_code: None,
        }
    }

    #[must_use]
    pub fn failed(
        action_type: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            action_type: action_type.into(),
            success: false,
            message: message.into(),
            error_code: Some(code),
        }
    }

    /// An action that never started because the rule ran out of time.
    #[must_use]
    pub fn cancelled(action_type: impl Into<String>) -> Self {
        Self::failed(
            action_type,
            ErrorCode::DeadlineExceeded,
            "cancelled: deadline exceeded",
        )
    }

    #[must_use]
    pub fn action_type(&self) -> &str {
        &self.action_type
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error_code
    }
}

impl From<DeviceCommandResult> for ActionResult {
    fn from(result: DeviceCommandResult) -> Self {
        Self {
            action_type: result.command_type,
            success: result.success,
            message: result.message,
            error_code: result.error_code,
        }
    }
}

/// Outcome of one rule firing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleExecutionResult {
    success: bool,
    message: String,
    rule_id: RuleId,
    action_results: Vec<ActionResult>,
    timestamp: Timestamp,
}

impl RuleExecutionResult {
    /// Aggregate the per-action results of a firing.
    ///
    /// The rule succeeds iff every action succeeded.
    #[must_use]
    pub fn new(rule_id: RuleId, action_results: Vec<ActionResult>, timestamp: Timestamp) -> Self {
        let failed = action_results.iter().filter(|r| !r.success).count();
        let message = if failed == 0 {
            format!("{} action(s) executed", action_results.len())
        } else {
            format!("{failed} of {} action(s) failed", action_results.len())
        };
        Self {
            success: failed == 0,
            message,
            rule_id,
            action_results,
            timestamp,
        }
    }

    /// A matched rule whose conditions did not hold.
    #[must_use]
    pub fn conditions_not_met(rule_id: RuleId, timestamp: Timestamp) -> Self {
        Self {
            success: false,
            message: "conditions not met".to_string(),
            rule_id,
            action_results: Vec::new(),
            timestamp,
        }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn rule_id(&self) -> &RuleId {
        &self.rule_id
    }

    #[must_use]
    pub fn action_results(&self) -> &[ActionResult] {
        &self.action_results
    }

    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Outcome of one scene activation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneExecutionResult {
    success: bool,
    message: String,
    scene_id: SceneId,
    device_results: BTreeMap<DeviceId, bool>,
    timestamp: Timestamp,
}

impl SceneExecutionResult {
    /// Aggregate per-device outcomes. Success iff every device succeeded.
    #[must_use]
    pub fn new(scene_id: SceneId, device_results: BTreeMap<DeviceId, bool>) -> Self {
        let failed: Vec<&str> = device_results
            .iter()
            .filter(|(_, ok)| !**ok)
            .map(|(id, _)| id.as_str())
            .collect();
        let message = if failed.is_empty() {
            format!("{} device(s) updated", device_results.len())
        } else {
            format!(
                "{} of {} device(s) failed: {}",
                failed.len(),
                device_results.len(),
                failed.join(", ")
            )
        };
        Self {
            success: failed.is_empty(),
            message,
            scene_id,
            device_results,
            timestamp: now(),
        }
    }

    /// An activation that never reached any device.
    #[must_use]
    pub fn failed(scene_id: SceneId, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            scene_id,
            device_results: BTreeMap::new(),
            timestamp: now(),
        }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn scene_id(&self) -> &SceneId {
        &self.scene_id
    }

    #[must_use]
    pub fn device_results(&self) -> &BTreeMap<DeviceId, bool> {
        &self.device_results
    }

    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Something worth telling logging and UI collaborators about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Report {
    RuleExecuted(RuleExecutionResult),
    SceneActivated(SceneExecutionResult),
    Notification {
        #[serde(skip_serializing_if = "Option::is_none")]
        rule_id: Option<RuleId>,
        message: String,
    },
}
