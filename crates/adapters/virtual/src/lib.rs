//! # homecore-adapter-virtual
//!
//! Simulated [`DeviceConnector`] for demos and end-to-end tests.
//!
//! ## Demo devices
//!
//! | Device | Id | Capabilities |
//! |--------|----|--------------|
//! | Living Room Light | `living-room-light` | power, brightness, color, color temperature |
//! | Hallway Thermostat | `hallway-thermostat` | temperature sensor and control |
//! | Bedroom Fan | `bedroom-fan` | power |
//! | Living Room TV | `living-room-tv` | power, volume, media playback |
//! | Front Door Lock | `front-door-lock` | lock, battery |
//! | Hallway Motion Sensor | `hallway-motion` | motion sensor |
//!
//! Every write is recorded, and any device can be told to reject, stop
//! answering, or hang, so failure paths can be exercised without hardware.
//!
//! ## Dependency rule
//!
//! Depends on `homecore-app` (port traits) and `homecore-domain` only.

mod devices;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use homecore_app::ports::{ConnectorError, DeviceConnector};
use homecore_domain::device::{Device, DeviceProtocol};
use homecore_domain::error::HomeCoreError;
use homecore_domain::id::DeviceId;
use homecore_domain::value::{PropertyValue, StateMap};

pub use devices::catalog;

/// A failure the connector plays back for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Refuse every write with this reason.
    Reject(String),
    /// Behave as if the device were out of range.
    Unreachable,
    /// Accept writes and never answer.
    Hang,
}

/// One write received by the connector.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlCall {
    pub device_id: DeviceId,
    pub property: String,
    pub value: PropertyValue,
}

/// Connector backed by in-memory device simulations.
pub struct VirtualConnector {
    protocol: DeviceProtocol,
    devices: Mutex<BTreeMap<DeviceId, Device>>,
    faults: Mutex<HashMap<DeviceId, Fault>>,
    calls: Mutex<Vec<ControlCall>>,
    latency: Duration,
}

impl VirtualConnector {
    /// An empty connector serving `protocol`.
    #[must_use]
    pub fn new(protocol: DeviceProtocol) -> Self {
        Self {
            protocol,
            devices: Mutex::new(BTreeMap::new()),
            faults: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }

    /// A wifi connector preloaded with the demo household.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a demo device fails to build.
    pub fn demo() -> Result<Self, HomeCoreError> {
        let connector = Self::new(DeviceProtocol::Wifi);
        for device in catalog(DeviceProtocol::Wifi)? {
            connector.add_device(device);
        }
        Ok(connector)
    }

    /// Simulate `device`. Its protocol is forced to the connector's.
    #[must_use]
    pub fn with_device(self, device: Device) -> Self {
        self.add_device(device);
        self
    }

    /// Delay every answer by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn add_device(&self, mut device: Device) {
        device.protocol = self.protocol;
        lock(&self.devices).insert(device.id.clone(), device);
    }

    pub fn inject_fault(&self, device_id: impl Into<DeviceId>, fault: Fault) {
        lock(&self.faults).insert(device_id.into(), fault);
    }

    pub fn clear_fault(&self, device_id: &DeviceId) {
        lock(&self.faults).remove(device_id);
    }

    /// Every write received so far, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<ControlCall> {
        lock(&self.calls).clone()
    }

    /// Writes received for one device, in arrival order.
    #[must_use]
    pub fn calls_for(&self, device_id: &str) -> Vec<ControlCall> {
        lock(&self.calls)
            .iter()
            .filter(|call| call.device_id.as_str() == device_id)
            .cloned()
            .collect()
    }

    /// The simulated state of a device.
    #[must_use]
    pub fn simulated_state(&self, device_id: &DeviceId) -> Option<StateMap> {
        lock(&self.devices)
            .get(device_id)
            .map(|device| device.state.clone())
    }

    fn fault(&self, device_id: &DeviceId) -> Option<Fault> {
        lock(&self.faults).get(device_id).cloned()
    }

    async fn wait(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl DeviceConnector for VirtualConnector {
    fn protocol(&self) -> DeviceProtocol {
        self.protocol
    }

    async fn discover_devices(&self, timeout: Duration) -> Result<Vec<Device>, ConnectorError> {
        tokio::time::sleep(self.latency.min(timeout)).await;
        let devices: Vec<Device> = lock(&self.devices).values().cloned().collect();
        tracing::debug!(count = devices.len(), "virtual devices announced");
        Ok(devices)
    }

    async fn control_device(
        &self,
        device: &Device,
        property: &str,
        value: &PropertyValue,
    ) -> Result<StateMap, ConnectorError> {
        lock(&self.calls).push(ControlCall {
            device_id: device.id.clone(),
            property: property.to_string(),
            value: value.clone(),
        });
        match self.fault(&device.id) {
            Some(Fault::Reject(reason)) => return Err(ConnectorError::Rejected(reason)),
            Some(Fault::Unreachable) => {
                return Err(ConnectorError::Unreachable(format!(
                    "`{}` does not answer",
                    device.id
                )));
            }
            Some(Fault::Hang) => std::future::pending::<()>().await,
            None => {}
        }
        self.wait().await;

        let mut devices = lock(&self.devices);
        let Some(simulated) = devices.get_mut(&device.id) else {
            return Err(ConnectorError::Rejected(format!(
                "`{}` is not simulated here",
                device.id
            )));
        };
        simulated.state.insert(property.to_string(), value.clone());
        tracing::debug!(device_id = %device.id, %property, %value, "virtual device updated");
        Ok(StateMap::from([(property.to_string(), value.clone())]))
    }

    async fn query_device_state(
        &self,
        device: &Device,
    ) -> Result<Option<StateMap>, ConnectorError> {
        if let Some(Fault::Unreachable | Fault::Hang) = self.fault(&device.id) {
            return Err(ConnectorError::Unreachable(device.id.to_string()));
        }
        self.wait().await;
        Ok(self.simulated_state(&device.id))
    }

    async fn connect(&self, device: &Device) -> bool {
        let known = lock(&self.devices).contains_key(&device.id);
        known && !matches!(self.fault(&device.id), Some(Fault::Unreachable))
    }

    async fn disconnect(&self, device: &Device) -> bool {
        lock(&self.devices).contains_key(&device.id)
    }
}

#[cfg(test)]
mod tests {
    use homecore_domain::device::Capability;

    use super::*;

    fn plug(id: &str) -> Device {
        Device::builder()
            .id(id)
            .name(id)
            .capability(Capability::Power)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_announce_six_demo_devices() {
        let connector = VirtualConnector::demo().unwrap();

        let devices = connector
            .discover_devices(Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(devices.len(), 6);
        assert!(
            devices
                .iter()
                .all(|device| device.protocol == DeviceProtocol::Wifi)
        );
    }

    #[tokio::test]
    async fn should_force_connector_protocol_on_added_devices() {
        let connector = VirtualConnector::new(DeviceProtocol::Zigbee).with_device(plug("plug-1"));

        let devices = connector
            .discover_devices(Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(devices[0].protocol, DeviceProtocol::Zigbee);
    }

    #[tokio::test]
    async fn should_record_write_and_update_simulated_state() {
        let connector = VirtualConnector::new(DeviceProtocol::Wifi).with_device(plug("plug-1"));
        let device = plug("plug-1");

        let confirmed = connector
            .control_device(&device, "power", &PropertyValue::Bool(true))
            .await
            .unwrap();

        assert_eq!(confirmed.get("power"), Some(&PropertyValue::Bool(true)));
        assert_eq!(connector.calls_for("plug-1").len(), 1);
        assert_eq!(
            connector.simulated_state(&device.id).unwrap().get("power"),
            Some(&PropertyValue::Bool(true))
        );
    }

    #[tokio::test]
    async fn should_play_back_rejection() {
        let connector = VirtualConnector::new(DeviceProtocol::Wifi).with_device(plug("plug-1"));
        connector.inject_fault("plug-1", Fault::Reject("child lock on".to_string()));

        let result = connector
            .control_device(&plug("plug-1"), "power", &PropertyValue::Bool(true))
            .await;

        assert_eq!(
            result,
            Err(ConnectorError::Rejected("child lock on".to_string()))
        );
        assert!(connector.simulated_state(&DeviceId::from("plug-1")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_answer_again_once_fault_is_cleared() {
        let connector = VirtualConnector::new(DeviceProtocol::Wifi).with_device(plug("plug-1"));
        connector.inject_fault("plug-1", Fault::Unreachable);
        let device = plug("plug-1");

        assert!(connector.query_device_state(&device).await.is_err());
        assert!(!connector.connect(&device).await);

        connector.clear_fault(&device.id);

        assert!(connector.query_device_state(&device).await.is_ok());
        assert!(connector.connect(&device).await);
    }

    #[tokio::test(start_paused = true)]
    async fn should_never_answer_when_hung() {
        let connector = VirtualConnector::new(DeviceProtocol::Wifi).with_device(plug("plug-1"));
        connector.inject_fault("plug-1", Fault::Hang);
        let device = plug("plug-1");

        let outcome = tokio::time::timeout(
            Duration::from_secs(60),
            connector.control_device(&device, "power", &PropertyValue::Bool(true)),
        )
        .await;

        assert!(outcome.is_err());
        assert_eq!(connector.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_delay_answers_by_latency() {
        let connector = VirtualConnector::new(DeviceProtocol::Wifi)
            .with_device(plug("plug-1"))
            .with_latency(Duration::from_millis(300));
        let started = tokio::time::Instant::now();

        connector
            .control_device(&plug("plug-1"), "power", &PropertyValue::Bool(false))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn should_reject_writes_to_unknown_devices() {
        let connector = VirtualConnector::new(DeviceProtocol::Wifi);

        let result = connector
            .control_device(&plug("ghost"), "power", &PropertyValue::Bool(true))
            .await;

        assert!(matches!(result, Err(ConnectorError::Rejected(_))));
    }
}
