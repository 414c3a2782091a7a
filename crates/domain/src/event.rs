//! Event: an inbound occurrence the rule engine reacts to.

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;
use crate::time::TimeOfDay;
use crate::value::PropertyValue;

/// Something that happened outside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A device reported a new value for one of its properties.
    StateChanged {
        device_id: DeviceId,
        property: String,
        value: PropertyValue,
    },
    /// The schedule collaborator fired the given cron-like expression.
    ScheduleTick { expression: String },
    /// The wall clock reached a new minute.
    ClockTick { time: TimeOfDay },
    /// A user issued a named command (voice, UI, shortcut).
    UserCommand { command: String },
    /// An event from some other system.
    External { source: String, event_type: String },
}

impl Event {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => "state_changed",
            Self::ScheduleTick { .. } => "schedule_tick",
            Self::ClockTick { .. } => "clock_tick",
            Self::UserCommand { .. } => "user_command",
            Self::External { .. } => "external",
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StateChanged {
                device_id,
                property,
                value,
            } => write!(f, "state_changed({device_id}.{property} = {value})"),
            Self::ScheduleTick { expression } => write!(f, "schedule_tick({expression})"),
            Self::ClockTick { time } => write!(f, "clock_tick({time})"),
            Self::UserCommand { command } => write!(f, "user_command({command})"),
            Self::External { source, event_type } => write!(f, "external({source}/{event_type})"),
        }
    }
}
