//! Condition evaluation against device state and the time of day.
//!
//! Evaluation is pure: it reads through [`DeviceLookup`] and never writes,
//! so previews and tests can call it freely. A missing device or property
//! makes a device condition false instead of raising an error.

use chrono::NaiveTime;
use homecore_domain::automation::Condition;
use homecore_domain::time::TimeOfDay;

use crate::registry::DeviceLookup;

/// What a condition can observe.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    devices: &'a dyn DeviceLookup,
    now: NaiveTime,
}

impl<'a> EvalContext<'a> {
    #[must_use]
    pub fn new(devices: &'a dyn DeviceLookup, now: NaiveTime) -> Self {
        Self { devices, now }
    }

    #[must_use]
    pub fn now(&self) -> NaiveTime {
        self.now
    }
}

/// Evaluate a condition tree. `and` / `or` short-circuit left to right.
#[must_use]
pub fn evaluate(condition: &Condition, ctx: &EvalContext<'_>) -> bool {
    match condition {
        Condition::Device {
            device_id,
            property,
            condition,
        } => ctx
            .devices
            .property(device_id, property)
            .is_some_and(|value| condition.matches(&value)),
        Condition::TimeWindow { start, end } => TimeOfDay::window_contains(*start, *end, ctx.now),
        Condition::And { conditions } => conditions.iter().all(|c| evaluate(c, ctx)),
        Condition::Or { conditions } => conditions.iter().any(|c| evaluate(c, ctx)),
        Condition::Not { condition } => !evaluate(condition, ctx),
    }
}

/// Implicit AND over a rule's top-level condition list.
#[must_use]
pub fn evaluate_all(conditions: &[Condition], ctx: &EvalContext<'_>) -> bool {
    conditions.iter().all(|c| evaluate(c, ctx))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use homecore_domain::automation::StateCondition;
    use homecore_domain::device::Device;
    use homecore_domain::id::DeviceId;
    use homecore_domain::value::PropertyValue;

    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn home() -> HashMap<DeviceId, Device> {
        let thermostat = Device::builder()
            .id("thermostat-a")
            .name("Thermostat")
            .state("temp", 30_i64)
            .state("mode", "Heat")
            .build()
            .unwrap();
        HashMap::from([(thermostat.id.clone(), thermostat)])
    }

    fn temp(condition: StateCondition) -> Condition {
        Condition::Device {
            device_id: DeviceId::from("thermostat-a"),
            property: "temp".to_string(),
            condition,
        }
    }

    fn window(start: &str, end: &str) -> Condition {
        Condition::TimeWindow {
            start: start.parse().unwrap(),
            end: end.parse().unwrap(),
        }
    }

    /// Counts how many device lookups an evaluation performs.
    struct CountingLookup {
        inner: HashMap<DeviceId, Device>,
        reads: AtomicUsize,
    }

    impl DeviceLookup for CountingLookup {
        fn property(&self, device_id: &DeviceId, property: &str) -> Option<PropertyValue> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.property(device_id, property)
        }
    }

    #[test]
    fn should_hold_when_device_property_satisfies_predicate() {
        let devices = home();
        let ctx = EvalContext::new(&devices, at(10, 0));
        assert!(evaluate(&temp(StateCondition::GreaterThan { value: 28.0 }), &ctx));
        assert!(!evaluate(&temp(StateCondition::LessThan { value: 28.0 }), &ctx));
    }

    #[test]
    fn should_be_false_when_device_or_property_is_absent() {
        let devices = home();
        let ctx = EvalContext::new(&devices, at(10, 0));
        let missing_device = Condition::Device {
            device_id: DeviceId::from("ghost"),
            property: "temp".to_string(),
            condition: StateCondition::Equals {
                value: PropertyValue::Int(30),
            },
        };
        let missing_property = Condition::Device {
            device_id: DeviceId::from("thermostat-a"),
            property: "humidity".to_string(),
            condition: StateCondition::LessThan { value: 100.0 },
        };
        assert!(!evaluate(&missing_device, &ctx));
        assert!(!evaluate(&missing_property, &ctx));
        assert!(evaluate(&Condition::not(missing_device), &ctx));
    }

    #[test]
    fn should_compare_equals_with_coercion() {
        let devices = home();
        let ctx = EvalContext::new(&devices, at(10, 0));
        let numeric_string = temp(StateCondition::Equals {
            value: PropertyValue::from("30"),
        });
        let mode = Condition::Device {
            device_id: DeviceId::from("thermostat-a"),
            property: "mode".to_string(),
            condition: StateCondition::Equals {
                value: PropertyValue::from("heat"),
            },
        };
        assert!(evaluate(&numeric_string, &ctx));
        assert!(evaluate(&mode, &ctx));
    }

    #[test]
    fn should_treat_empty_and_as_true_and_empty_or_as_false() {
        let devices = home();
        let ctx = EvalContext::new(&devices, at(10, 0));
        assert!(evaluate(&Condition::and(vec![]), &ctx));
        assert!(!evaluate(&Condition::or(vec![]), &ctx));
        assert!(evaluate_all(&[], &ctx));
    }

    #[test]
    fn should_equal_original_after_double_negation() {
        let devices = home();
        let conditions = [
            temp(StateCondition::GreaterThan { value: 28.0 }),
            temp(StateCondition::Between {
                min: 0.0,
                max: 10.0,
            }),
            window("08:00", "22:00"),
            window("22:00", "06:00"),
            Condition::and(vec![]),
            Condition::or(vec![]),
        ];
        for time in [at(0, 30), at(10, 0), at(23, 0)] {
            let ctx = EvalContext::new(&devices, time);
            for c in &conditions {
                let double = Condition::not(Condition::not(c.clone()));
                assert_eq!(evaluate(&double, &ctx), evaluate(c, &ctx), "{c} at {time}");
            }
        }
    }

    #[test]
    fn should_evaluate_time_window_against_context_time() {
        let devices = home();
        let day = window("08:00", "22:00");
        assert!(evaluate(&day, &EvalContext::new(&devices, at(10, 0))));
        assert!(!evaluate(&day, &EvalContext::new(&devices, at(23, 0))));

        let night = window("22:00", "06:00");
        assert!(evaluate(&night, &EvalContext::new(&devices, at(23, 0))));
        assert!(!evaluate(&night, &EvalContext::new(&devices, at(10, 0))));
    }

    #[test]
    fn should_short_circuit_and_on_first_false() {
        let lookup = CountingLookup {
            inner: home(),
            reads: AtomicUsize::new(0),
        };
        let ctx = EvalContext::new(&lookup, at(10, 0));
        let tree = Condition::and(vec![
            temp(StateCondition::LessThan { value: 0.0 }),
            temp(StateCondition::GreaterThan { value: 0.0 }),
        ]);
        assert!(!evaluate(&tree, &ctx));
        assert_eq!(lookup.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn should_short_circuit_or_on_first_true() {
        let lookup = CountingLookup {
            inner: home(),
            reads: AtomicUsize::new(0),
        };
        let ctx = EvalContext::new(&lookup, at(10, 0));
        let tree = Condition::or(vec![
            temp(StateCondition::GreaterThan { value: 0.0 }),
            temp(StateCondition::LessThan { value: 0.0 }),
        ]);
        assert!(evaluate(&tree, &ctx));
        assert_eq!(lookup.reads.load(Ordering::SeqCst), 1);
    }
}
