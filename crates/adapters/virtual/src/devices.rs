//! The demo household served by [`VirtualConnector::demo`](crate::VirtualConnector::demo).
//!
//! Ids are fixed so rules and scenes written against them survive restarts.

use homecore_domain::device::{Capability, Device, DeviceProtocol, DeviceType};
use homecore_domain::error::HomeCoreError;

const MANUFACTURER: &str = "homecore";

/// Build the demo devices.
///
/// # Errors
///
/// Returns a validation error if a builder fails (should not happen with
/// hardcoded inputs).
pub fn catalog(protocol: DeviceProtocol) -> Result<Vec<Device>, HomeCoreError> {
    let light = Device::builder()
        .id("living-room-light")
        .name("Living Room Light")
        .manufacturer(MANUFACTURER)
        .model("VLight-2")
        .device_type(DeviceType::Light)
        .protocol(protocol)
        .capabilities([
            Capability::Power,
            Capability::Brightness,
            Capability::Color,
            Capability::ColorTemperature,
        ])
        .state("power", false)
        .state("brightness", 0_i64)
        .build()?;

    let thermostat = Device::builder()
        .id("hallway-thermostat")
        .name("Hallway Thermostat")
        .manufacturer(MANUFACTURER)
        .model("VTherm-1")
        .device_type(DeviceType::Thermostat)
        .protocol(protocol)
        .capabilities([Capability::TemperatureSensor, Capability::TemperatureControl])
        .state("temp", 21.5)
        .state("target_temperature", 21.0)
        .build()?;

    let fan = Device::builder()
        .id("bedroom-fan")
        .name("Bedroom Fan")
        .manufacturer(MANUFACTURER)
        .model("VFan-1")
        .device_type(DeviceType::Fan)
        .protocol(protocol)
        .capability(Capability::Power)
        .state("power", false)
        .build()?;

    let tv = Device::builder()
        .id("living-room-tv")
        .name("Living Room TV")
        .manufacturer(MANUFACTURER)
        .model("VTV-55")
        .device_type(DeviceType::Tv)
        .protocol(protocol)
        .capabilities([
            Capability::Power,
            Capability::Volume,
            Capability::MediaPlayback,
        ])
        .state("power", false)
        .state("volume", 20_i64)
        .build()?;

    let lock = Device::builder()
        .id("front-door-lock")
        .name("Front Door Lock")
        .manufacturer(MANUFACTURER)
        .model("VLock-1")
        .device_type(DeviceType::Lock)
        .protocol(protocol)
        .capabilities([Capability::Lock, Capability::Battery])
        .state("locked", true)
        .state("battery", 87_i64)
        .build()?;

    let motion = Device::builder()
        .id("hallway-motion")
        .name("Hallway Motion Sensor")
        .manufacturer(MANUFACTURER)
        .model("VMotion-1")
        .device_type(DeviceType::Sensor)
        .protocol(protocol)
        .capability(Capability::MotionSensor)
        .state("motion", false)
        .build()?;

    Ok(vec![light, thermostat, fan, tv, lock, motion])
}
