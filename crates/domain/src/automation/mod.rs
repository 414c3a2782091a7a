//! Automation rules: trigger → condition → action trees.
//!
//! Each rule has one [`Trigger`] that makes it a candidate for an event,
//! a list of [`Condition`]s that must all hold, and an ordered list of
//! [`Action`]s. Rules are validated once when built or stored so that a
//! firing never meets a malformed tree.

mod action;
mod condition;
mod trigger;

pub use action::Action;
pub use condition::{Condition, StateCondition};
pub use trigger::Trigger;

use serde::{Deserialize, Serialize};

use crate::error::{HomeCoreError, ValidationError};
use crate::id::RuleId;
use crate::time::{Timestamp, now};

/// Deepest condition or action tree a rule may contain.
pub const MAX_TREE_DEPTH: usize = 16;

/// A rule that reacts to events by executing actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationRule {
    #[serde(default)]
    pub id: RuleId,
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub trigger: Trigger,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
    #[serde(default = "now")]
    pub created_at: Timestamp,
    #[serde(default = "now")]
    pub updated_at: Timestamp,
    #[serde(default)]
    pub last_executed: Option<Timestamp>,
}

fn enabled_by_default() -> bool {
    true
}

impl AutomationRule {
    /// Create a builder for constructing an [`AutomationRule`].
    #[must_use]
    pub fn builder() -> AutomationRuleBuilder {
        AutomationRuleBuilder::default()
    }

    /// Check domain invariants over the whole rule.
    ///
    /// # Errors
    ///
    /// Returns [`HomeCoreError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - `actions` is empty ([`ValidationError::NoActions`])
    /// - a condition or action tree is deeper than [`MAX_TREE_DEPTH`]
    /// - any trigger, condition or action leaf is invalid
    pub fn validate(&self) -> Result<(), HomeCoreError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.actions.is_empty() {
            return Err(ValidationError::NoActions.into());
        }
        self.trigger.validate()?;

        let depth = self
            .conditions
            .iter()
            .map(Condition::depth)
            .chain(self.actions.iter().map(Action::depth))
            .max()
            .unwrap_or(0);
        if depth > MAX_TREE_DEPTH {
            return Err(ValidationError::TreeTooDeep {
                depth,
                max: MAX_TREE_DEPTH,
            }
            .into());
        }

        for condition in &self.conditions {
            condition.validate()?;
        }
        for action in &self.actions {
            action.validate()?;
        }
        Ok(())
    }
}

/// Step-by-step builder for [`AutomationRule`].
#[derive(Debug, Default)]
pub struct AutomationRuleBuilder {
    id: Option<RuleId>,
    name: Option<String>,
    enabled: Option<bool>,
    trigger: Option<Trigger>,
    conditions: Vec<Condition>,
    actions: Vec<Action>,
    last_executed: Option<Timestamp>,
}

impl AutomationRuleBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<RuleId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn last_executed(mut self, ts: Timestamp) -> Self {
        self.last_executed = Some(ts);
        self
    }

    /// Consume the builder, validate, and return an [`AutomationRule`].
    ///
    /// A rule without an explicit trigger listens for a user command equal
    /// to its name.
    ///
    /// # Errors
    ///
    /// Returns [`HomeCoreError::Validation`] if required fields are missing or
    /// any tree is invalid.
    pub fn build(self) -> Result<AutomationRule, HomeCoreError> {
        let name = self.name.unwrap_or_default();
        let created = now();
        let rule = AutomationRule {
            id: self.id.unwrap_or_default(),
            trigger: self.trigger.unwrap_or_else(|| Trigger::UserCommand {
                command: name.clone(),
            }),
            name,
            enabled: self.enabled.unwrap_or(true),
            conditions: self.conditions,
            actions: self.actions,
            created_at: created,
            updated_at: created,
            last_executed: self.last_executed,
        };
        rule.validate()?;
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::DeviceCommand;
    use crate::event::Event;
    use crate::id::DeviceId;
    use crate::value::PropertyValue;

    fn fan_on() -> Action {
        Action::Device {
            device_id: DeviceId::from("fan-a"),
            command: DeviceCommand::Power { on: true },
        }
    }

    fn hot_room_rule() -> AutomationRule {
        AutomationRule::builder()
            .name("Cool down")
            .trigger(Trigger::DeviceState {
                device_id: DeviceId::from("thermostat-a"),
                property: "temp".to_string(),
                condition: StateCondition::GreaterThan { value: 28.0 },
            })
            .condition(Condition::TimeWindow {
                start: "08:00".parse().unwrap(),
                end: "22:00".parse().unwrap(),
            })
            .action(fan_on())
            .build()
            .unwrap()
    }

    fn nested_not(depth: usize) -> Condition {
        let mut c = Condition::and(vec![]);
        for _ in 1..depth {
            c = Condition::not(c);
        }
        c
    }

    #[test]
    fn should_build_valid_rule_when_required_fields_provided() {
        let rule = hot_room_rule();
        assert_eq!(rule.name, "Cool down");
        assert!(rule.enabled);
        assert_eq!(rule.conditions.len(), 1);
        assert_eq!(rule.actions.len(), 1);
        assert!(rule.last_executed.is_none());
        assert_eq!(rule.created_at, rule.updated_at);
    }

    #[test]
    fn should_default_to_user_command_trigger_named_after_rule() {
        let rule = AutomationRule::builder()
            .name("movie time")
            .action(fan_on())
            .build()
            .unwrap();
        assert!(rule.trigger.matches(&Event::UserCommand {
            command: "Movie Time".to_string()
        }));
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = AutomationRule::builder().action(fan_on()).build();
        assert!(matches!(
            result,
            Err(HomeCoreError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_return_validation_error_when_actions_is_empty() {
        let result = AutomationRule::builder().name("No actions").build();
        assert!(matches!(
            result,
            Err(HomeCoreError::Validation(ValidationError::NoActions))
        ));
    }

    #[test]
    fn should_accept_tree_at_maximum_depth() {
        let result = AutomationRule::builder()
            .name("Deep but fine")
            .condition(nested_not(MAX_TREE_DEPTH))
            .action(fan_on())
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn should_reject_tree_deeper_than_maximum() {
        let result = AutomationRule::builder()
            .name("Too deep")
            .condition(nested_not(MAX_TREE_DEPTH + 1))
            .action(fan_on())
            .build();
        assert!(matches!(
            result,
            Err(HomeCoreError::Validation(ValidationError::TreeTooDeep { .. }))
        ));
    }

    #[test]
    fn should_reject_invalid_command_in_actions() {
        let result = AutomationRule::builder()
            .name("Too bright")
            .action(Action::Device {
                device_id: DeviceId::from("lamp"),
                command: DeviceCommand::Brightness { level: 140 },
            })
            .build();
        assert!(matches!(
            result,
            Err(HomeCoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn should_reject_invalid_trigger() {
        let result = AutomationRule::builder()
            .name("Bad trigger")
            .trigger(Trigger::DeviceState {
                device_id: DeviceId::from("t"),
                property: "temp".to_string(),
                condition: StateCondition::Between {
                    min: 30.0,
                    max: 10.0,
                },
            })
            .action(fan_on())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn should_roundtrip_rule_through_serde_json() {
        let rule = hot_room_rule();
        let json = serde_json::to_string(&rule).unwrap();
        let parsed: AutomationRule = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rule);
    }

    #[test]
    fn should_fill_defaults_when_deserializing_hand_written_rule() {
        let json = serde_json::json!({
            "name": "Doorbell",
            "trigger": {"type": "external_event", "source": "doorbell", "event_type": "ring"},
            "actions": [{"type": "notification", "message": "someone is at the door"}]
        });
        let rule: AutomationRule = serde_json::from_value(json).unwrap();
        assert!(rule.enabled);
        assert!(rule.conditions.is_empty());
        assert!(rule.last_executed.is_none());
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn should_match_trigger_against_matching_event() {
        let rule = hot_room_rule();
        let event = Event::StateChanged {
            device_id: DeviceId::from("thermostat-a"),
            property: "temp".to_string(),
            value: PropertyValue::Int(30),
        };
        assert!(rule.trigger.matches(&event));
    }
}
