//! Condition: a guard tree that must hold for a rule (or a conditional
//! action) to proceed.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::DeviceId;
use crate::time::TimeOfDay;
use crate::value::PropertyValue;

/// A predicate over a single property value.
///
/// Shared by device-state triggers and device conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StateCondition {
    Equals { value: PropertyValue },
    GreaterThan { value: f64 },
    LessThan { value: f64 },
    /// Inclusive on both ends.
    Between { min: f64, max: f64 },
    /// Substring test on the stringified value.
    Contains { value: String },
}

impl StateCondition {
    /// Test `actual` against this predicate.
    ///
    /// Ordering predicates need a numeric reading; anything else is `false`.
    #[must_use]
    pub fn matches(&self, actual: &PropertyValue) -> bool {
        match self {
            Self::Equals { value } => actual.loosely_equals(value),
            Self::GreaterThan { value } => actual.as_number().is_some_and(|n| n > *value),
            Self::LessThan { value } => actual.as_number().is_some_and(|n| n < *value),
            Self::Between { min, max } => actual
                .as_number()
                .is_some_and(|n| (*min..=*max).contains(&n)),
            Self::Contains { value } => actual.to_string().contains(value.as_str()),
        }
    }

    /// # Errors
    ///
    /// Returns a [`ValidationError`] for non-finite thresholds or inverted
    /// `between` bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let finite = |field: &'static str, n: f64| {
            if n.is_finite() {
                Ok(())
            } else {
                Err(ValidationError::NotFinite { field })
            }
        };
        match self {
            Self::GreaterThan { value } => finite("greater_than", *value),
            Self::LessThan { value } => finite("less_than", *value),
            Self::Between { min, max } => {
                finite("between.min", *min)?;
                finite("between.max", *max)?;
                if min > max {
                    return Err(ValidationError::InvertedBounds {
                        min: *min,
                        max: *max,
                    });
                }
                Ok(())
            }
            Self::Equals { .. } | Self::Contains { .. } => Ok(()),
        }
    }
}

impl std::fmt::Display for StateCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Equals { value } => write!(f, "== {value}"),
            Self::GreaterThan { value } => write!(f, "> {value}"),
            Self::LessThan { value } => write!(f, "< {value}"),
            Self::Between { min, max } => write!(f, "in {min}..={max}"),
            Self::Contains { value } => write!(f, "contains {value:?}"),
        }
    }
}

/// A boolean predicate tree evaluated against device state and the clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Tests a property on a device's last-known state.
    Device {
        device_id: DeviceId,
        property: String,
        condition: StateCondition,
    },
    /// Requires the local time of day to be within `[start, end)`.
    TimeWindow { start: TimeOfDay, end: TimeOfDay },
    /// All children must hold. Empty is `true`.
    And { conditions: Vec<Condition> },
    /// At least one child must hold. Empty is `false`.
    Or { conditions: Vec<Condition> },
    Not { condition: Box<Condition> },
}

impl Condition {
    #[must_use]
    pub fn and(conditions: Vec<Condition>) -> Self {
        Self::And { conditions }
    }

    #[must_use]
    pub fn or(conditions: Vec<Condition>) -> Self {
        Self::Or { conditions }
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        Self::Not {
            condition: Box::new(condition),
        }
    }

    /// Nesting depth; a leaf has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Device { .. } | Self::TimeWindow { .. } => 1,
            Self::And { conditions } | Self::Or { conditions } => {
                1 + conditions.iter().map(Self::depth).max().unwrap_or(0)
            }
            Self::Not { condition } => 1 + condition.depth(),
        }
    }

    /// Validate every node of the tree.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found in a leaf.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Device {
                property,
                condition,
                ..
            } => {
                if property.is_empty() {
                    return Err(ValidationError::EmptyField { field: "property" });
                }
                condition.validate()
            }
            Self::TimeWindow { .. } => Ok(()),
            Self::And { conditions } | Self::Or { conditions } => {
                conditions.iter().try_for_each(Self::validate)
            }
            Self::Not { condition } => condition.validate(),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Device {
                device_id,
                property,
                condition,
            } => write!(f, "{device_id}.{property} {condition}"),
            Self::TimeWindow { start, end } => write!(f, "time_window({start}..{end})"),
            Self::And { conditions } => write!(f, "and[{}]", conditions.len()),
            Self::Or { conditions } => write!(f, "or[{}]", conditions.len()),
            Self::Not { condition } => write!(f, "not({condition})"),
        }
    }
}
