//! Scene Runner: applies a scene's target states across its devices.
//!
//! Devices are driven concurrently. Commands for one device go out one
//! after another, and every one is attempted even after a failure. Partial
//! application is reported per device and never rolled back.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use homecore_domain::execution::{Report, SceneExecutionResult};
use homecore_domain::id::{DeviceId, SceneId};
use homecore_domain::scene::Scene;

use crate::dispatcher::DeviceCommandDispatcher;
use crate::ports::{ReportPublisher, SceneRepository};

pub struct SceneRunner<S, P> {
    scenes: S,
    dispatcher: Arc<DeviceCommandDispatcher>,
    publisher: P,
}

impl<S, P> SceneRunner<S, P>
where
    S: SceneRepository + Send + Sync,
    P: ReportPublisher + Send + Sync,
{
    pub fn new(scenes: S, dispatcher: Arc<DeviceCommandDispatcher>, publisher: P) -> Self {
        Self {
            scenes,
            dispatcher,
            publisher,
        }
    }

    /// Load a scene and activate it. An unknown scene yields an
    /// unsuccessful result rather than an error.
    #[tracing::instrument(skip(self))]
    pub async fn activate_by_id(&self, scene_id: &SceneId) -> SceneExecutionResult {
        let result = match self.scenes.get_by_id(scene_id.clone()).await {
            Ok(Some(scene)) => return self.activate(&scene).await,
            Ok(None) => SceneExecutionResult::failed(scene_id.clone(), "scene not found"),
            Err(err) => {
                tracing::error!(%scene_id, error = %err, "failed to load scene");
                SceneExecutionResult::failed(scene_id.clone(), format!("scene unavailable: {err}"))
            }
        };
        self.report(&result).await;
        result
    }

    /// Apply every target state of `scene`.
    #[tracing::instrument(skip(self, scene), fields(scene_id = %scene.id, scene_name = %scene.name))]
    pub async fn activate(&self, scene: &Scene) -> SceneExecutionResult {
        let runs = scene
            .device_states
            .keys()
            .map(|device_id| self.apply_device(scene, device_id));
        let device_results: BTreeMap<DeviceId, bool> = join_all(runs).await.into_iter().collect();

        let result = SceneExecutionResult::new(scene.id.clone(), device_results);
        if result.success() {
            tracing::info!(message = result.message(), "scene activated");
            if let Err(err) = self
                .scenes
                .mark_activated(scene.id.clone(), result.timestamp())
                .await
            {
                tracing::warn!(error = %err, "failed to record scene activation");
            }
        } else {
            tracing::warn!(message = result.message(), "scene partially applied");
        }
        self.report(&result).await;
        result
    }

    async fn apply_device(&self, scene: &Scene, device_id: &DeviceId) -> (DeviceId, bool) {
        let commands = match scene.commands_for(device_id) {
            Ok(commands) => commands,
            Err(err) => {
                tracing::warn!(%device_id, error = %err, "scene target cannot be applied");
                return (device_id.clone(), false);
            }
        };
        // best effort: a failed property does not stop the ones after it
        let mut applied = true;
        for command in &commands {
            applied &= self
                .dispatcher
                .dispatch(device_id, command, None)
                .await
                .success();
        }
        (device_id.clone(), applied)
    }

    async fn report(&self, result: &SceneExecutionResult) {
        if let Err(err) = self
            .publisher
            .publish(Report::SceneActivated(result.clone()))
            .await
        {
            tracing::warn!(error = %err, "failed to publish scene report");
        }
    }
}
