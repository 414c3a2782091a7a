//! Action: a step performed when a rule fires.

use serde::{Deserialize, Serialize};

use crate::automation::Condition;
use crate::command::DeviceCommand;
use crate::error::ValidationError;
use crate::id::{DeviceId, SceneId};

/// One step of a rule. Actions form a tree through [`Action::Conditional`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Send a command to a device.
    Device {
        device_id: DeviceId,
        command: DeviceCommand,
    },
    /// Activate a stored scene.
    Scene { scene_id: SceneId },
    /// Emit a message to the notification collaborator.
    Notification { message: String },
    /// Wait before continuing with the next action.
    Delay { seconds: u64 },
    /// Branch on a condition. A false condition without an `otherwise`
    /// branch is a skipped branch, not a failure.
    Conditional {
        condition: Condition,
        then: Box<Action>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        otherwise: Option<Box<Action>>,
    },
}

impl Action {
    /// Short name of the action kind. Device actions report the command kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Device { command, .. } => command.kind(),
            Self::Scene { .. } => "scene",
            Self::Notification { .. } => "notification",
            Self::Delay { .. } => "delay",
            Self::Conditional { .. } => "conditional",
        }
    }

    /// Nesting depth across both action and condition trees; a leaf has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Conditional {
                condition,
                then,
                otherwise,
            } => {
                let branches = then
                    .depth()
                    .max(otherwise.as_ref().map_or(0, |a| a.depth()));
                1 + branches.max(condition.depth())
            }
            _ => 1,
        }
    }

    /// Validate every node of the tree.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Device { device_id, command } => {
                if device_id.as_str().trim().is_empty() {
                    return Err(ValidationError::EmptyId);
                }
                command.validate()
            }
            Self::Scene { scene_id } if scene_id.as_str().trim().is_empty() => {
                Err(ValidationError::EmptyId)
            }
            Self::Scene { .. } | Self::Notification { .. } | Self::Delay { .. } => Ok(()),
            Self::Conditional {
                condition,
                then,
                otherwise,
            } => {
                condition.validate()?;
                then.validate()?;
                otherwise.as_ref().map_or(Ok(()), |a| a.validate())
            }
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Device { device_id, command } => write!(f, "{command} -> {device_id}"),
            Self::Scene { scene_id } => write!(f, "scene({scene_id})"),
            Self::Notification { message } => write!(f, "notify({message:?})"),
            Self::Delay { seconds } => write!(f, "delay({seconds}s)"),
            Self::Conditional { condition, .. } => write!(f, "if({condition})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn power_on(device: &str) -> Action {
        Action::Device {
            device_id: DeviceId::from(device),
            command: DeviceCommand::Power { on: true },
        }
    }

    #[test]
    fn should_report_command_kind_for_device_actions() {
        assert_eq!(power_on("fan").kind(), "power");
        assert_eq!(Action::Delay { seconds: 1 }.kind(), "delay");
    }

    #[test]
    fn should_display_delay_action() {
        assert_eq!(Action::Delay { seconds: 30 }.to_string(), "delay(30s)");
    }

    #[test]
    fn should_measure_depth_through_nested_conditionals() {
        let inner = Action::Conditional {
            condition: Condition::and(vec![]),
            then: Box::new(power_on("fan")),
            otherwise: None,
        };
        let outer = Action::Conditional {
            condition: Condition::or(vec![]),
            then: Box::new(Action::Delay { seconds: 1 }),
            otherwise: Some(Box::new(inner)),
        };
        assert_eq!(outer.depth(), 3);
    }

    #[test]
    fn should_reject_out_of_range_command_inside_branch() {
        let action = Action::Conditional {
            condition: Condition::and(vec![]),
            then: Box::new(Action::Device {
                device_id: DeviceId::from("lamp"),
                command: DeviceCommand::Volume { level: 200 },
            }),
            otherwise: None,
        };
        assert!(matches!(
            action.validate(),
            Err(ValidationError::OutOfRange { field: "volume", .. })
        ));
    }

    #[test]
    fn should_reject_conditional_without_condition() {
        let json = serde_json::json!({
            "type": "conditional",
            "then": {"type": "delay", "seconds": 1}
        });
        let result: Result<Action, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn should_deserialize_conditional_with_default_otherwise() {
        let json = serde_json::json!({
            "type": "conditional",
            "condition": {"type": "and", "conditions": []},
            "then": {"type": "notification", "message": "hi"}
        });
        let a: Action = serde_json::from_value(json).unwrap();
        assert!(matches!(a, Action::Conditional { otherwise: None, .. }));
    }
}
