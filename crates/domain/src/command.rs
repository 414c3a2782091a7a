//! Device commands: the typed instructions a rule or scene sends to a device.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::device::Capability;
use crate::error::ValidationError;
use crate::value::PropertyValue;

/// Playback control for media devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaAction {
    Play,
    Pause,
    Stop,
    Next,
    Previous,
}

impl fmt::Display for MediaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Stop => "stop",
            Self::Next => "next",
            Self::Previous => "previous",
        })
    }
}

impl FromStr for MediaAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "play" => Ok(Self::Play),
            "pause" => Ok(Self::Pause),
            "stop" => Ok(Self::Stop),
            "next" => Ok(Self::Next),
            "previous" => Ok(Self::Previous),
            _ => Err(()),
        }
    }
}

/// A single instruction for a device. Built per dispatch, never persisted
/// on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceCommand {
    Power { on: bool },
    /// Percentage, `0..=100`.
    Brightness { level: u8 },
    Color { red: u8, green: u8, blue: u8 },
    ColorTemperature { kelvin: u32 },
    SetTemperature { celsius: f64 },
    Lock { locked: bool },
    /// Percentage, `0..=100`.
    Volume { level: u8 },
    Media { action: MediaAction },
    /// Degrees.
    PanTilt { pan: i32, tilt: i32 },
    Custom {
        name: String,
        #[serde(default)]
        parameters: BTreeMap<String, PropertyValue>,
    },
}

impl DeviceCommand {
    /// Short name of the command kind, used as `command_type` / `action_type`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Power { .. } => "power",
            Self::Brightness { .. } => "brightness",
            Self::Color { .. } => "color",
            Self::ColorTemperature { .. } => "color_temperature",
            Self::SetTemperature { .. } => "set_temperature",
            Self::Lock { .. } => "lock",
            Self::Volume { .. } => "volume",
            Self::Media { .. } => "media",
            Self::PanTilt { .. } => "pan_tilt",
            Self::Custom { .. } => "custom",
        }
    }

    /// The capability a device must have to accept this command.
    #[must_use]
    pub fn required_capability(&self) -> Capability {
        match self {
            Self::Power { .. } => Capability::Power,
            Self::Brightness { .. } => Capability::Brightness,
            Self::Color { .. } => Capability::Color,
            Self::ColorTemperature { .. } => Capability::ColorTemperature,
            Self::SetTemperature { .. } => Capability::TemperatureControl,
            Self::Lock { .. } => Capability::Lock,
            Self::Volume { .. } => Capability::Volume,
            Self::Media { .. } => Capability::MediaPlayback,
            Self::PanTilt { .. } => Capability::PanTilt,
            Self::Custom { .. } => Capability::CustomCommand,
        }
    }

    /// Check value ranges the type system does not already enforce.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for out-of-range percentages, non-finite
    /// temperatures, or an empty custom command name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Brightness { level } => percentage("brightness", *level),
            Self::Volume { level } => percentage("volume", *level),
            Self::SetTemperature { celsius } if !celsius.is_finite() => {
                Err(ValidationError::NotFinite {
                    field: "set_temperature",
                })
            }
            Self::Custom { name, .. } if name.trim().is_empty() => {
                Err(ValidationError::EmptyField {
                    field: "custom command name",
                })
            }
            _ => Ok(()),
        }
    }

    /// The `(property, value)` write a connector receives for this command.
    /// The same pair is recorded in the device registry once confirmed.
    #[must_use]
    pub fn property_write(&self) -> (String, PropertyValue) {
        let (property, value) = match self {
            Self::Power { on } => ("power", PropertyValue::Bool(*on)),
            Self::Brightness { level } => ("brightness", PropertyValue::Int(i64::from(*level))),
            Self::Color { red, green, blue } => (
                "color",
                PropertyValue::String(format!("#{red:02x}{green:02x}{blue:02x}")),
            ),
            Self::ColorTemperature { kelvin } => {
                ("color_temperature", PropertyValue::Int(i64::from(*kelvin)))
            }
            Self::SetTemperature { celsius } => {
                ("target_temperature", PropertyValue::Float(*celsius))
            }
            Self::Lock { locked } => ("locked", PropertyValue::Bool(*locked)),
            Self::Volume { level } => ("volume", PropertyValue::Int(i64::from(*level))),
            Self::Media { action } => ("media", PropertyValue::String(action.to_string())),
            Self::PanTilt { pan, tilt } => {
                ("pan_tilt", PropertyValue::String(format!("{pan},{tilt}")))
            }
            Self::Custom { name, parameters } => {
                let params = parameters
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<serde_json::Map<_, _>>();
                return (name.clone(), PropertyValue::Json(params.into()));
            }
        };
        (property.to_string(), value)
    }

    /// Map a stringified scene target (`"power" = "off"`) to a command.
    ///
    /// Returns `None` for unknown properties or unparsable values.
    #[must_use]
    pub fn from_scene_property(property: &str, value: &str) -> Option<Self> {
        let value = value.trim();
        let command = match property {
            "power" => Self::Power {
                on: parse_switch(value, "on", "off")?,
            },
            "brightness" => Self::Brightness {
                level: value.parse().ok()?,
            },
            "color" => {
                let (red, green, blue) = parse_hex_color(value)?;
                Self::Color { red, green, blue }
            }
            "color_temperature" => Self::ColorTemperature {
                kelvin: value.parse().ok()?,
            },
            "target_temperature" => Self::SetTemperature {
                celsius: value.parse().ok()?,
            },
            "locked" => Self::Lock {
                locked: parse_switch(value, "locked", "unlocked")?,
            },
            "volume" => Self::Volume {
                level: value.parse().ok()?,
            },
            "media" => Self::Media {
                action: value.parse().ok()?,
            },
            "pan_tilt" => {
                let (pan, tilt) = value.split_once(',')?;
                Self::PanTilt {
                    pan: pan.trim().parse().ok()?,
                    tilt: tilt.trim().parse().ok()?,
                }
            }
            _ => return None,
        };
        command.validate().ok()?;
        Some(command)
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (_, value) = self.property_write();
        write!(f, "{}({value})", self.kind())
    }
}

fn percentage(field: &'static str, level: u8) -> Result<(), ValidationError> {
    if level > 100 {
        return Err(ValidationError::OutOfRange {
            field,
            value: i64::from(level),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

fn parse_switch(value: &str, on_word: &str, off_word: &str) -> Option<bool> {
    let lower = value.to_ascii_lowercase();
    if lower == "true" || lower == on_word {
        Some(true)
    } else if lower == "false" || lower == off_word {
        Some(false)
    } else {
        None
    }
}

fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_brightness_above_one_hundred() {
        let result = DeviceCommand::Brightness { level: 101 }.validate();
        assert!(matches!(
            result,
            Err(ValidationError::OutOfRange {
                field: "brightness",
                ..
            })
        ));
    }

    #[test]
    fn should_reject_non_finite_temperature() {
        let result = DeviceCommand::SetTemperature { celsius: f64::NAN }.validate();
        assert!(result.is_err());
    }

    #[test]
    fn should_write_color_as_hex_string() {
        let cmd = DeviceCommand::Color {
            red: 255,
            green: 128,
            blue: 0,
        };
        assert_eq!(
            cmd.property_write(),
            ("color".to_string(), PropertyValue::from("#ff8000"))
        );
    }

    #[test]
    fn should_write_custom_parameters_as_json_object() {
        let mut parameters = BTreeMap::new();
        parameters.insert("mode".to_string(), PropertyValue::from("eco"));
        let cmd = DeviceCommand::Custom {
            name: "set_mode".to_string(),
            parameters,
        };
        let (property, value) = cmd.property_write();
        assert_eq!(property, "set_mode");
        assert_eq!(value, PropertyValue::Json(serde_json::json!({"mode": "eco"})));
    }

    #[test]
    fn should_map_scene_properties_to_commands() {
        assert_eq!(
            DeviceCommand::from_scene_property("power", "OFF"),
            Some(DeviceCommand::Power { on: false })
        );
        assert_eq!(
            DeviceCommand::from_scene_property("brightness", "40"),
            Some(DeviceCommand::Brightness { level: 40 })
        );
        assert_eq!(
            DeviceCommand::from_scene_property("color", "#00ff10"),
            Some(DeviceCommand::Color {
                red: 0,
                green: 255,
                blue: 16
            })
        );
        assert_eq!(
            DeviceCommand::from_scene_property("media", "Pause"),
            Some(DeviceCommand::Media {
                action: MediaAction::Pause
            })
        );
        assert_eq!(
            DeviceCommand::from_scene_property("pan_tilt", "30, -10"),
            Some(DeviceCommand::PanTilt { pan: 30, tilt: -10 })
        );
    }

    #[test]
    fn should_not_map_invalid_scene_values() {
        assert_eq!(DeviceCommand::from_scene_property("brightness", "150"), None);
        assert_eq!(DeviceCommand::from_scene_property("power", "maybe"), None);
        assert_eq!(DeviceCommand::from_scene_property("color", "red"), None);
        assert_eq!(DeviceCommand::from_scene_property("humidity", "40"), None);
    }

    #[test]
    fn should_deserialize_command_from_tagged_json() {
        let json = serde_json::json!({"type": "power", "on": true});
        let cmd: DeviceCommand = serde_json::from_value(json).unwrap();
        assert_eq!(cmd, DeviceCommand::Power { on: true });
        assert_eq!(cmd.kind(), "power");
        assert_eq!(cmd.required_capability(), Capability::Power);
    }
}
