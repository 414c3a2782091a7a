//! Device Registry: the known devices and their last-observed state.
//!
//! This is the only shared mutable resource of the engine. Each device also
//! owns an async lock; the dispatcher holds it for the duration of a command
//! so commands to one device run strictly in issuance order while unrelated
//! devices proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use homecore_domain::device::Device;
use homecore_domain::id::DeviceId;
use homecore_domain::time::now;
use homecore_domain::value::{PropertyValue, StateMap};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Read access to device properties, as seen by the condition evaluator.
pub trait DeviceLookup: Send + Sync {
    /// Last-known value of `property` on `device_id`, `None` when either is
    /// unknown.
    fn property(&self, device_id: &DeviceId, property: &str) -> Option<PropertyValue>;
}

/// In-memory registry keyed by [`DeviceId`].
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: DashMap<DeviceId, Device>,
    locks: DashMap<DeviceId, Arc<Mutex<()>>>,
}

impl DeviceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &DeviceId) -> Option<Device> {
        self.devices.get(id).map(|entry| entry.value().clone())
    }

    /// Insert or replace a device.
    ///
    /// A re-discovered device that arrives without state keeps the state
    /// already cached for it.
    pub fn upsert(&self, mut device: Device) -> Device {
        if device.state.is_empty()
            && let Some(known) = self.devices.get(&device.id)
        {
            device.state = known.state.clone();
        }
        device.last_seen = Some(now());
        self.devices.insert(device.id.clone(), device.clone());
        device
    }

    /// Record one property value. Returns the updated device, or `None`
    /// when the device is unknown.
    pub fn update_state(
        &self,
        id: &DeviceId,
        property: impl Into<String>,
        value: PropertyValue,
    ) -> Option<Device> {
        let mut entry = self.devices.get_mut(id)?;
        entry.state.insert(property.into(), value);
        entry.last_seen = Some(now());
        Some(entry.value().clone())
    }

    /// Merge several property values at once.
    pub fn apply_state(&self, id: &DeviceId, state: StateMap) -> Option<Device> {
        let mut entry = self.devices.get_mut(id)?;
        entry.state.extend(state);
        entry.last_seen = Some(now());
        Some(entry.value().clone())
    }

    pub fn set_online(&self, id: &DeviceId, online: bool) -> Option<Device> {
        let mut entry = self.devices.get_mut(id)?;
        entry.online = online;
        if online {
            entry.last_seen = Some(now());
        }
        Some(entry.value().clone())
    }

    /// De-register a device.
    pub fn remove(&self, id: &DeviceId) -> Option<Device> {
        self.locks.remove(id);
        self.devices.remove(id).map(|(_, device)| device)
    }

    /// Every known device, sorted by id.
    #[must_use]
    pub fn list(&self) -> Vec<Device> {
        let mut devices: Vec<Device> = self
            .devices
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        devices.sort_by(|a, b| a.id.cmp(&b.id));
        devices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Acquire the per-device lock. Waiters are served in arrival order.
    pub async fn lock(&self, id: &DeviceId) -> OwnedMutexGuard<()> {
        let mutex = Arc::clone(self.locks.entry(id.clone()).or_default().value());
        mutex.lock_owned().await
    }
}

impl DeviceLookup for DeviceRegistry {
    fn property(&self, device_id: &DeviceId, property: &str) -> Option<PropertyValue> {
        self.devices
            .get(device_id)
            .and_then(|device| device.property(property).cloned())
    }
}

impl DeviceLookup for HashMap<DeviceId, Device> {
    fn property(&self, device_id: &DeviceId, property: &str) -> Option<PropertyValue> {
        self.get(device_id)
            .and_then(|device| device.property(property).cloned())
    }
}
