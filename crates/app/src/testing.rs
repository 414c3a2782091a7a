//! Test doubles shared by the unit tests of this crate.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use homecore_domain::automation::AutomationRule;
use homecore_domain::device::{Capability, Device, DeviceProtocol};
use homecore_domain::error::{HomeCoreError, StorageError};
use homecore_domain::execution::Report;
use homecore_domain::id::{DeviceId, RuleId, SceneId};
use homecore_domain::scene::Scene;
use homecore_domain::time::Timestamp;
use homecore_domain::value::{PropertyValue, StateMap};

use crate::dispatcher::DeviceCommandDispatcher;
use crate::ports::{
    ConnectorError, Connectors, DeviceConnector, ReportPublisher, RuleRepository, SceneRepository,
};
use crate::registry::DeviceRegistry;

/// How the fake connector answers for a device.
#[derive(Debug, Clone)]
pub enum Behavior {
    Reject(String),
    Unreachable,
    Hang,
    /// Answer after a delay.
    Slow(Duration),
    /// Fail `n` times as unreachable, then succeed.
    Flaky(usize),
}

/// Records every control call and answers according to per-device behavior.
pub struct FakeConnector {
    protocol: DeviceProtocol,
    behaviors: Mutex<HashMap<DeviceId, Behavior>>,
    calls: Mutex<Vec<(DeviceId, String, PropertyValue)>>,
    discoverable: Mutex<Vec<Device>>,
    reported: Mutex<HashMap<DeviceId, StateMap>>,
}

impl FakeConnector {
    pub fn new(protocol: DeviceProtocol) -> Self {
        Self {
            protocol,
            behaviors: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            discoverable: Mutex::new(Vec::new()),
            reported: Mutex::new(HashMap::new()),
        }
    }

    /// Make `device` show up in the next discovery.
    pub fn advertise(&self, device: Device) {
        self.discoverable.lock().unwrap().push(device);
    }

    /// State returned by the next state query for `device`.
    pub fn report(&self, device: &str, state: StateMap) {
        self.reported
            .lock()
            .unwrap()
            .insert(DeviceId::from(device), state);
    }

    pub fn behave(&self, device: &str, behavior: Behavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(DeviceId::from(device), behavior);
    }

    pub fn calls(&self) -> Vec<(DeviceId, String, PropertyValue)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, device: &str) -> Vec<(String, PropertyValue)> {
        self.calls()
            .into_iter()
            .filter(|(id, _, _)| id.as_str() == device)
            .map(|(_, property, value)| (property, value))
            .collect()
    }
}

#[async_trait]
impl DeviceConnector for FakeConnector {
    fn protocol(&self) -> DeviceProtocol {
        self.protocol
    }

    async fn discover_devices(&self, _timeout: Duration) -> Result<Vec<Device>, ConnectorError> {
        Ok(self.discoverable.lock().unwrap().clone())
    }

    async fn control_device(
        &self,
        device: &Device,
        property: &str,
        value: &PropertyValue,
    ) -> Result<StateMap, ConnectorError> {
        self.calls
            .lock()
            .unwrap()
            .push((device.id.clone(), property.to_string(), value.clone()));
        let behavior = {
            let mut behaviors = self.behaviors.lock().unwrap();
            match behaviors.get_mut(&device.id) {
                Some(Behavior::Flaky(0)) => None,
                Some(Behavior::Flaky(n)) => {
                    *n -= 1;
                    Some(Behavior::Unreachable)
                }
                other => other.cloned(),
            }
        };
        match behavior {
            Some(Behavior::Reject(reason)) => Err(ConnectorError::Rejected(reason)),
            Some(Behavior::Unreachable) => Err(ConnectorError::Unreachable(device.id.to_string())),
            Some(Behavior::Hang) => std::future::pending().await,
            Some(Behavior::Slow(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(StateMap::new())
            }
            Some(Behavior::Flaky(_)) | None => Ok(StateMap::new()),
        }
    }

    async fn query_device_state(
        &self,
        device: &Device,
    ) -> Result<Option<StateMap>, ConnectorError> {
        let behavior = self.behaviors.lock().unwrap().get(&device.id).cloned();
        if let Some(Behavior::Unreachable) = behavior {
            return Err(ConnectorError::Unreachable(device.id.to_string()));
        }
        Ok(self.reported.lock().unwrap().get(&device.id).cloned())
    }

    async fn connect(&self, device: &Device) -> bool {
        let behavior = self.behaviors.lock().unwrap().get(&device.id).cloned();
        !matches!(behavior, Some(Behavior::Unreachable))
    }

    async fn disconnect(&self, _device: &Device) -> bool {
        true
    }
}

pub fn device(id: &str, capabilities: &[Capability]) -> Device {
    Device::builder()
        .id(id)
        .name(id)
        .protocol(DeviceProtocol::Wifi)
        .capabilities(capabilities.iter().copied())
        .build()
        .unwrap()
}

/// A registry with a fan, a light, a tv and a thermostat on one wifi connector.
pub fn wifi_home() -> (Arc<DeviceRegistry>, Arc<FakeConnector>) {
    let registry = Arc::new(DeviceRegistry::new());
    registry.upsert(device("fan-a", &[Capability::Power]));
    registry.upsert(device(
        "light-a",
        &[Capability::Power, Capability::Brightness, Capability::Color],
    ));
    registry.upsert(device("tv-a", &[Capability::Power, Capability::Volume]));
    let mut thermostat = device(
        "thermostat-a",
        &[Capability::TemperatureSensor, Capability::TemperatureControl],
    );
    thermostat
        .state
        .insert("temp".to_string(), PropertyValue::Int(21));
    registry.upsert(thermostat);
    (registry, Arc::new(FakeConnector::new(DeviceProtocol::Wifi)))
}

pub fn dispatcher(
    registry: &Arc<DeviceRegistry>,
    connector: &Arc<FakeConnector>,
) -> Arc<DeviceCommandDispatcher> {
    let connector: Arc<dyn DeviceConnector> = connector.clone();
    Arc::new(DeviceCommandDispatcher::new(
        Arc::clone(registry),
        Connectors::new().with(connector),
        Duration::from_secs(5),
    ))
}

#[derive(Default)]
pub struct InMemoryRules {
    rules: Mutex<Vec<AutomationRule>>,
    broken_marks: AtomicBool,
}

impl InMemoryRules {
    pub fn with(rules: Vec<AutomationRule>) -> Self {
        Self {
            rules: Mutex::new(rules),
            broken_marks: AtomicBool::new(false),
        }
    }

    /// Make every later `mark_executed` call fail.
    pub fn break_marks(&self) {
        self.broken_marks.store(true, Ordering::SeqCst);
    }

    pub fn snapshot(&self, id: &str) -> Option<AutomationRule> {
        self.rules
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id.as_str() == id)
            .cloned()
    }
}

impl RuleRepository for InMemoryRules {
    fn create(
        &self,
        rule: AutomationRule,
    ) -> impl Future<Output = Result<AutomationRule, HomeCoreError>> + Send {
        self.rules.lock().unwrap().push(rule.clone());
        async { Ok(rule) }
    }

    fn get_by_id(
        &self,
        id: RuleId,
    ) -> impl Future<Output = Result<Option<AutomationRule>, HomeCoreError>> + Send {
        let found = self.snapshot(id.as_str());
        async { Ok(found) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<AutomationRule>, HomeCoreError>> + Send {
        let all = self.rules.lock().unwrap().clone();
        async { Ok(all) }
    }

    fn get_enabled(
        &self,
    ) -> impl Future<Output = Result<Vec<AutomationRule>, HomeCoreError>> + Send {
        let enabled: Vec<_> = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.enabled)
            .cloned()
            .collect();
        async { Ok(enabled) }
    }

    fn update(
        &self,
        rule: AutomationRule,
    ) -> impl Future<Output = Result<AutomationRule, HomeCoreError>> + Send {
        let mut rules = self.rules.lock().unwrap();
        if let Some(slot) = rules.iter_mut().find(|r| r.id == rule.id) {
            *slot = rule.clone();
        }
        async { Ok(rule) }
    }

    fn delete(&self, id: RuleId) -> impl Future<Output = Result<(), HomeCoreError>> + Send {
        self.rules.lock().unwrap().retain(|r| r.id != id);
        async { Ok(()) }
    }

    fn mark_executed(
        &self,
        id: RuleId,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), HomeCoreError>> + Send {
        let outcome = if self.broken_marks.load(Ordering::SeqCst) {
            Err(StorageError("rule store offline".to_string()).into())
        } else {
            if let Some(rule) = self.rules.lock().unwrap().iter_mut().find(|r| r.id == id) {
                rule.last_executed = Some(at);
            }
            Ok(())
        };
        async { outcome }
    }
}

#[derive(Default)]
pub struct InMemoryScenes {
    scenes: Mutex<HashMap<SceneId, Scene>>,
}

impl InMemoryScenes {
    pub fn with(scenes: Vec<Scene>) -> Self {
        Self {
            scenes: Mutex::new(scenes.into_iter().map(|s| (s.id.clone(), s)).collect()),
        }
    }

    pub fn snapshot(&self, id: &str) -> Option<Scene> {
        self.scenes
            .lock()
            .unwrap()
            .get(&SceneId::from(id))
            .cloned()
    }
}

impl SceneRepository for InMemoryScenes {
    fn create(&self, scene: Scene) -> impl Future<Output = Result<Scene, HomeCoreError>> + Send {
        self.scenes
            .lock()
            .unwrap()
            .insert(scene.id.clone(), scene.clone());
        async { Ok(scene) }
    }

    fn get_by_id(
        &self,
        id: SceneId,
    ) -> impl Future<Output = Result<Option<Scene>, HomeCoreError>> + Send {
        let found = self.scenes.lock().unwrap().get(&id).cloned();
        async { Ok(found) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Scene>, HomeCoreError>> + Send {
        let all: Vec<_> = self.scenes.lock().unwrap().values().cloned().collect();
        async { Ok(all) }
    }

    fn update(&self, scene: Scene) -> impl Future<Output = Result<Scene, HomeCoreError>> + Send {
        self.scenes
            .lock()
            .unwrap()
            .insert(scene.id.clone(), scene.clone());
        async { Ok(scene) }
    }

    fn delete(&self, id: SceneId) -> impl Future<Output = Result<(), HomeCoreError>> + Send {
        self.scenes.lock().unwrap().remove(&id);
        async { Ok(()) }
    }

    fn mark_activated(
        &self,
        id: SceneId,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), HomeCoreError>> + Send {
        if let Some(scene) = self.scenes.lock().unwrap().get_mut(&id) {
            scene.last_executed = Some(at);
        }
        async { Ok(()) }
    }
}

/// Keeps every published report.
#[derive(Default)]
pub struct RecordingPublisher {
    reports: Mutex<Vec<Report>>,
}

impl RecordingPublisher {
    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().unwrap().clone()
    }
}

impl ReportPublisher for RecordingPublisher {
    fn publish(&self, report: Report) -> impl Future<Output = Result<(), HomeCoreError>> + Send {
        self.reports.lock().unwrap().push(report);
        async { Ok(()) }
    }
}
