//! Device: a physical or virtual thing the core can observe and control.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::command::DeviceCommand;
use crate::error::{HomeCoreError, ValidationError};
use crate::id::DeviceId;
use crate::time::Timestamp;
use crate::value::{PropertyValue, StateMap};

/// Kind of device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Light,
    Switch,
    Thermostat,
    Lock,
    Camera,
    Sensor,
    Speaker,
    Display,
    Appliance,
    Tv,
    Fan,
    Outlet,
    Curtain,
    Hub,
    #[default]
    Other,
}

/// Transport a device is reached through. One connector serves each protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceProtocol {
    Wifi,
    Bluetooth,
    Zigbee,
    Zwave,
    Matter,
    Thread,
    Infrared,
    #[default]
    Unknown,
}

/// A feature a device supports. Gates which [`DeviceCommand`]s are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Power,
    Brightness,
    Color,
    ColorTemperature,
    TemperatureSensor,
    TemperatureControl,
    HumiditySensor,
    MotionSensor,
    ContactSensor,
    WaterSensor,
    SmokeSensor,
    Lock,
    Volume,
    MediaPlayback,
    PanTilt,
    Battery,
    EnergyMonitoring,
    SceneActivation,
    AirQuality,
    FirmwareUpdatable,
    CustomCommand,
}

/// A known device and its last-observed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub protocol: DeviceProtocol,
    pub capabilities: BTreeSet<Capability>,
    pub firmware_version: Option<String>,
    pub online: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub state: StateMap,
    pub last_seen: Option<Timestamp>,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HomeCoreError::Validation`] when the id or name is empty.
    pub fn validate(&self) -> Result<(), HomeCoreError> {
        if self.id.as_str().trim().is_empty() {
            return Err(ValidationError::EmptyId.into());
        }
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    #[must_use]
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Whether the device's capability set allows `command`.
    #[must_use]
    pub fn supports(&self, command: &DeviceCommand) -> bool {
        self.has_capability(command.required_capability())
    }

    /// Last-known value of a property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.state.get(name)
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    manufacturer: Option<String>,
    model: Option<String>,
    device_type: DeviceType,
    protocol: DeviceProtocol,
    capabilities: BTreeSet<Capability>,
    firmware_version: Option<String>,
    online: Option<bool>,
    metadata: BTreeMap<String, String>,
    state: StateMap,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<DeviceId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }

    #[must_use]
    pub fn protocol(mut self, protocol: DeviceProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    #[must_use]
    pub fn capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    #[must_use]
    pub fn capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    #[must_use]
    pub fn firmware_version(mut self, version: impl Into<String>) -> Self {
        self.firmware_version = Some(version.into());
        self
    }

    #[must_use]
    pub fn online(mut self, online: bool) -> Self {
        self.online = Some(online);
        self
    }

    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn state(mut self, property: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.state.insert(property.into(), value.into());
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns [`HomeCoreError::Validation`] if the name is missing or empty.
    pub fn build(self) -> Result<Device, HomeCoreError> {
        let device = Device {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            manufacturer: self.manufacturer,
            model: self.model,
            device_type: self.device_type,
            protocol: self.protocol,
            capabilities: self.capabilities,
            firmware_version: self.firmware_version,
            online: self.online.unwrap_or(true),
            metadata: self.metadata,
            state: self.state,
            last_seen: None,
        };
        device.validate()?;
        Ok(device)
    }
}
