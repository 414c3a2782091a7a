//! Trigger: the event pattern that makes a rule a candidate for firing.

use serde::{Deserialize, Serialize};

use crate::automation::StateCondition;
use crate::error::ValidationError;
use crate::event::Event;
use crate::id::DeviceId;
use crate::time::TimeOfDay;

/// Describes what event pattern should activate a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Fires when the schedule collaborator reports this cron-like expression.
    Schedule { cron: String },
    /// Fires when a device reports `property` and the new value satisfies `condition`.
    DeviceState {
        device_id: DeviceId,
        property: String,
        condition: StateCondition,
    },
    /// Fires when the clock reaches `time`.
    TimeOfDay { time: TimeOfDay },
    /// Fires on an external event with the same source and type.
    ExternalEvent { source: String, event_type: String },
    /// Fires when a user issues the named command.
    UserCommand { command: String },
}

impl Trigger {
    /// Check whether this trigger matches a given event.
    ///
    /// Matching is structural: the event must be of the trigger's kind and
    /// carry the same identifying payload.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        match (self, event) {
            (Self::Schedule { cron }, Event::ScheduleTick { expression }) => {
                cron.trim() == expression.trim()
            }
            (
                Self::DeviceState {
                    device_id,
                    property,
                    condition,
                },
                Event::StateChanged {
                    device_id: event_device,
                    property: event_property,
                    value,
                },
            ) => device_id == event_device && property == event_property && condition.matches(value),
            (Self::TimeOfDay { time }, Event::ClockTick { time: now }) => time.matches(now.as_time()),
            (
                Self::ExternalEvent { source, event_type },
                Event::External {
                    source: event_source,
                    event_type: event_kind,
                },
            ) => source == event_source && event_type == event_kind,
            (Self::UserCommand { command }, Event::UserCommand { command: issued }) => {
                command.eq_ignore_ascii_case(issued.trim())
            }
            _ => false,
        }
    }

    /// # Errors
    ///
    /// Returns a [`ValidationError`] for empty identifying fields or an
    /// invalid state predicate.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let non_empty = |field: &'static str, value: &str| {
            if value.trim().is_empty() {
                Err(ValidationError::EmptyField { field })
            } else {
                Ok(())
            }
        };
        match self {
            Self::Schedule { cron } => non_empty("cron", cron),
            Self::DeviceState {
                device_id,
                property,
                condition,
            } => {
                non_empty("device_id", device_id.as_str())?;
                non_empty("property", property)?;
                condition.validate()
            }
            Self::TimeOfDay { .. } => Ok(()),
            Self::ExternalEvent { source, event_type } => {
                non_empty("source", source)?;
                non_empty("event_type", event_type)
            }
            Self::UserCommand { command } => non_empty("command", command),
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schedule { cron } => write!(f, "schedule({cron})"),
            Self::DeviceState {
                device_id,
                property,
                condition,
            } => write!(f, "device_state({device_id}.{property} {condition})"),
            Self::TimeOfDay { time } => write!(f, "time_of_day({time})"),
            Self::ExternalEvent { source, event_type } => {
                write!(f, "external_event({source}/{event_type})")
            }
            Self::UserCommand { command } => write!(f, "user_command({command})"),
        }
    }
}
