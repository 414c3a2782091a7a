//! Authorization port: a policy collaborator that may veto a device action.

use homecore_domain::command::DeviceCommand;
use homecore_domain::id::DeviceId;

/// Pre-dispatch check. `Err(reason)` vetoes the action; the reason ends up
/// in the action result.
pub trait ActionAuthorizer: Send + Sync {
    /// # Errors
    ///
    /// Returns the denial reason when the command must not be sent.
    fn authorize(&self, device_id: &DeviceId, command: &DeviceCommand) -> Result<(), String>;
}

impl<F> ActionAuthorizer for F
where
    F: Fn(&DeviceId, &DeviceCommand) -> Result<(), String> + Send + Sync,
{
    fn authorize(&self, device_id: &DeviceId, command: &DeviceCommand) -> Result<(), String> {
        self(device_id, command)
    }
}
