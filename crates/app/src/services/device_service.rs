//! Device service: discovery, registration and connector housekeeping.
//!
//! Commands do not go through here; they belong to the dispatcher. This
//! service only keeps the registry in step with what the connectors see.

use std::sync::Arc;
use std::time::Duration;

use homecore_domain::device::Device;
use homecore_domain::error::{HomeCoreError, NotFoundError};
use homecore_domain::id::DeviceId;

use crate::ports::{ConnectorError, Connectors, DeviceConnector};
use crate::registry::DeviceRegistry;

/// Application service for the device registry.
pub struct DeviceService {
    registry: Arc<DeviceRegistry>,
    connectors: Connectors,
}

impl DeviceService {
    pub fn new(registry: Arc<DeviceRegistry>, connectors: Connectors) -> Self {
        Self {
            registry,
            connectors,
        }
    }

    /// Ask every connector for devices and register what they find.
    ///
    /// A connector that fails is logged and skipped; the others still count.
    #[tracing::instrument(skip(self))]
    pub async fn discover(&self, timeout: Duration) -> Vec<Device> {
        let mut found = Vec::new();
        for connector in self.connectors.iter() {
            let protocol = connector.protocol();
            match connector.discover_devices(timeout).await {
                Ok(devices) => {
                    tracing::info!(?protocol, count = devices.len(), "devices discovered");
                    for device in devices {
                        if let Err(err) = device.validate() {
                            tracing::warn!(device_id = %device.id, error = %err, "ignoring invalid device");
                            continue;
                        }
                        found.push(self.registry.upsert(device));
                    }
                }
                Err(err) => tracing::warn!(?protocol, error = %err, "discovery failed"),
            }
        }
        found
    }

    /// Register a device by hand.
    ///
    /// # Errors
    ///
    /// Returns [`HomeCoreError::Validation`] if invariants fail.
    #[tracing::instrument(skip(self, device), fields(device_id = %device.id))]
    pub fn register_device(&self, device: Device) -> Result<Device, HomeCoreError> {
        device.validate()?;
        Ok(self.registry.upsert(device))
    }

    /// # Errors
    ///
    /// Returns [`HomeCoreError::NotFound`] when no device with `id` is registered.
    pub fn get_device(&self, id: &DeviceId) -> Result<Device, HomeCoreError> {
        self.registry.get(id).ok_or_else(|| not_found(id))
    }

    #[must_use]
    pub fn list_devices(&self) -> Vec<Device> {
        self.registry.list()
    }

    /// Pull the device's current state from its connector into the registry.
    ///
    /// An unreachable device is marked offline. A device whose connector
    /// reports no state is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`HomeCoreError::NotFound`] when no device with `id` is registered.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_state(&self, id: &DeviceId) -> Result<Device, HomeCoreError> {
        self.get_device(id)?;
        let _turn = self.registry.lock(id).await;
        let device = self.get_device(id)?;
        let Some(connector) = self.connector_for(&device) else {
            return Ok(device);
        };
        let updated = match connector.query_device_state(&device).await {
            Ok(Some(state)) => {
                let refreshed = self.registry.apply_state(id, state);
                if device.online {
                    refreshed
                } else {
                    self.registry.set_online(id, true)
                }
            }
            Ok(None) => Some(device),
            Err(err @ ConnectorError::Unreachable(_)) => {
                tracing::warn!(error = %err, "device went offline");
                self.registry.set_online(id, false)
            }
            Err(err) => {
                tracing::warn!(error = %err, "state query failed");
                Some(device)
            }
        };
        updated.ok_or_else(|| not_found(id))
    }

    /// Open the connector session for a device and record whether it is online.
    ///
    /// # Errors
    ///
    /// Returns [`HomeCoreError::NotFound`] when no device with `id` is registered.
    #[tracing::instrument(skip(self))]
    pub async fn connect(&self, id: &DeviceId) -> Result<bool, HomeCoreError> {
        let device = self.get_device(id)?;
        let Some(connector) = self.connector_for(&device) else {
            return Ok(false);
        };
        let connected = connector.connect(&device).await;
        self.registry.set_online(id, connected);
        Ok(connected)
    }

    /// # Errors
    ///
    /// Returns [`HomeCoreError::NotFound`] when no device with `id` is registered.
    #[tracing::instrument(skip(self))]
    pub async fn disconnect(&self, id: &DeviceId) -> Result<bool, HomeCoreError> {
        let device = self.get_device(id)?;
        let Some(connector) = self.connector_for(&device) else {
            return Ok(false);
        };
        let disconnected = connector.disconnect(&device).await;
        if disconnected {
            self.registry.set_online(id, false);
        }
        Ok(disconnected)
    }

    /// # Errors
    ///
    /// Returns [`HomeCoreError::NotFound`] when no device with `id` is registered.
    #[tracing::instrument(skip(self))]
    pub fn remove_device(&self, id: &DeviceId) -> Result<Device, HomeCoreError> {
        self.registry.remove(id).ok_or_else(|| not_found(id))
    }

    fn connector_for(&self, device: &Device) -> Option<Arc<dyn DeviceConnector>> {
        let connector = self.connectors.get(device.protocol);
        if connector.is_none() {
            tracing::debug!(device_id = %device.id, protocol = ?device.protocol, "no connector");
        }
        connector
    }
}

fn not_found(id: &DeviceId) -> HomeCoreError {
    NotFoundError {
        entity: "Device",
        id: id.to_string(),
    }
    .into()
}
