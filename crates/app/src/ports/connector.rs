//! Device connector port: the protocol-specific bridge to real devices.
//!
//! A connector is registered per [`DeviceProtocol`]. The dispatcher picks the
//! connector matching a device's protocol; the device service uses every
//! registered connector for discovery.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use homecore_domain::device::{Device, DeviceProtocol};
use homecore_domain::value::{PropertyValue, StateMap};

/// Failure reported by a connector for a single operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectorError {
    /// The device or its protocol refused the operation. The reason is
    /// surfaced to callers verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error("device unreachable: {0}")]
    Unreachable(String),

    /// Any other transport or protocol fault.
    #[error("connector failure: {0}")]
    Failed(String),
}

/// Talks to devices over one protocol.
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    /// The protocol this connector serves.
    fn protocol(&self) -> DeviceProtocol;

    /// Scan for devices, returning within roughly `timeout`.
    async fn discover_devices(&self, timeout: Duration) -> Result<Vec<Device>, ConnectorError>;

    /// Write one property. On success returns the properties the device
    /// confirmed; an empty map means "the write itself was confirmed".
    async fn control_device(
        &self,
        device: &Device,
        property: &str,
        value: &PropertyValue,
    ) -> Result<StateMap, ConnectorError>;

    /// Read the device's current state, `None` when the device does not
    /// report state.
    async fn query_device_state(&self, device: &Device)
    -> Result<Option<StateMap>, ConnectorError>;

    async fn connect(&self, device: &Device) -> bool;

    async fn disconnect(&self, device: &Device) -> bool;
}

/// The set of registered connectors, one per protocol.
#[derive(Clone, Default)]
pub struct Connectors {
    by_protocol: HashMap<DeviceProtocol, Arc<dyn DeviceConnector>>,
}

impl Connectors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connector, replacing any previous one for the same protocol.
    #[must_use]
    pub fn with(mut self, connector: Arc<dyn DeviceConnector>) -> Self {
        self.register(connector);
        self
    }

    pub fn register(&mut self, connector: Arc<dyn DeviceConnector>) {
        self.by_protocol.insert(connector.protocol(), connector);
    }

    #[must_use]
    pub fn get(&self, protocol: DeviceProtocol) -> Option<Arc<dyn DeviceConnector>> {
        self.by_protocol.get(&protocol).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn DeviceConnector>> {
        self.by_protocol.values()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_protocol.is_empty()
    }
}

impl std::fmt::Debug for Connectors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut protocols: Vec<_> = self.by_protocol.keys().collect();
        protocols.sort();
        f.debug_struct("Connectors")
            .field("protocols", &protocols)
            .finish()
    }
}
