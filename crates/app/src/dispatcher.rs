//! Device Command Dispatcher: turns a [`DeviceCommand`] into a bounded
//! call on the device's connector.
//!
//! The dispatcher never returns an error. Every failure (unknown device,
//! missing capability, out-of-range value, offline device, missing
//! connector, rejection, timeout) becomes an unsuccessful [`DeviceCommandResult`] so callers can
//! carry on with their remaining work. Retries are the caller's business.

use std::sync::Arc;
use std::time::Duration;

use homecore_domain::command::DeviceCommand;
use homecore_domain::execution::{DeviceCommandResult, ErrorCode};
use homecore_domain::id::DeviceId;
use homecore_domain::value::StateMap;

use crate::ports::{ConnectorError, Connectors};
use crate::registry::DeviceRegistry;

pub struct DeviceCommandDispatcher {
    registry: Arc<DeviceRegistry>,
    connectors: Connectors,
    default_timeout: Duration,
}

impl DeviceCommandDispatcher {
    #[must_use]
    pub fn new(
        registry: Arc<DeviceRegistry>,
        connectors: Connectors,
        default_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            connectors,
            default_timeout,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Send `command` to `device_id`, waiting at most `timeout` (or the
    /// configured default) for the connector.
    ///
    /// Commands to the same device run one at a time in issuance order. On
    /// success the written property, merged with whatever the connector
    /// confirmed, is recorded in the registry. Nothing is written on failure.
    #[tracing::instrument(skip(self, command), fields(command = %command))]
    pub async fn dispatch(
        &self,
        device_id: &DeviceId,
        command: &DeviceCommand,
        timeout: Option<Duration>,
    ) -> DeviceCommandResult {
        let kind = command.kind();
        let fail = |code: ErrorCode, message: String| {
            tracing::warn!(%device_id, %code, %message, "device command failed");
            DeviceCommandResult::failed(device_id.clone(), kind, code, message)
        };

        if self.registry.get(device_id).is_none() {
            return fail(ErrorCode::NotFound, format!("device `{device_id}` not found"));
        }

        let _turn = self.registry.lock(device_id).await;

        // re-read under the lock: an earlier command may have changed it
        let Some(device) = self.registry.get(device_id) else {
            return fail(ErrorCode::NotFound, format!("device `{device_id}` not found"));
        };
        if !device.supports(command) {
            return fail(
                ErrorCode::UnsupportedCapability,
                format!(
                    "device `{device_id}` does not support {kind} (requires {:?})",
                    command.required_capability()
                ),
            );
        }
        if let Err(err) = command.validate() {
            return fail(ErrorCode::InvalidCommand, err.to_string());
        }
        if !device.online {
            return fail(
                ErrorCode::Unreachable,
                format!("device `{device_id}` is offline"),
            );
        }
        let Some(connector) = self.connectors.get(device.protocol) else {
            return fail(
                ErrorCode::NoConnector,
                format!("no connector registered for {:?}", device.protocol),
            );
        };

        let (property, value) = command.property_write();
        let limit = timeout.unwrap_or(self.default_timeout);
        let call = connector.control_device(&device, &property, &value);

        match tokio::time::timeout(limit, call).await {
            Ok(Ok(confirmed)) => {
                let mut state = StateMap::from([(property.clone(), value.clone())]);
                state.extend(confirmed);
                self.registry.apply_state(device_id, state);
                tracing::debug!(%device_id, %property, %value, "device command confirmed");
                DeviceCommandResult::succeeded(
                    device_id.clone(),
                    kind,
                    format!("{property} set to {value}"),
                )
            }
            Ok(Err(ConnectorError::Rejected(reason))) => fail(ErrorCode::ConnectorRejected, reason),
            Ok(Err(err @ (ConnectorError::Unreachable(_) | ConnectorError::Failed(_)))) => {
                fail(ErrorCode::Unreachable, err.to_string())
            }
            Err(_elapsed) => fail(
                ErrorCode::Timeout,
                format!(
                    "device `{device_id}` did not answer within {}ms",
                    limit.as_millis()
                ),
            ),
        }
    }
}
