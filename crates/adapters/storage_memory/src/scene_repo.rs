//! In-memory implementation of [`SceneRepository`].

use homecore_app::ports::SceneRepository;
use homecore_domain::error::{HomeCoreError, NotFoundError, StorageError};
use homecore_domain::id::SceneId;
use homecore_domain::scene::Scene;
use homecore_domain::time::Timestamp;
use tokio::sync::RwLock;

/// Scenes kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemorySceneRepository {
    scenes: RwLock<Vec<Scene>>,
}

impl InMemorySceneRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_scenes(scenes: Vec<Scene>) -> Self {
        Self {
            scenes: RwLock::new(scenes),
        }
    }
}

fn not_found(id: &SceneId) -> HomeCoreError {
    NotFoundError {
        entity: "Scene",
        id: id.to_string(),
    }
    .into()
}

impl SceneRepository for InMemorySceneRepository {
    async fn create(&self, scene: Scene) -> Result<Scene, HomeCoreError> {
        let mut scenes = self.scenes.write().await;
        if scenes.iter().any(|existing| existing.id == scene.id) {
            return Err(StorageError(format!("scene `{}` already exists", scene.id)).into());
        }
        scenes.push(scene.clone());
        Ok(scene)
    }

    async fn get_by_id(&self, id: SceneId) -> Result<Option<Scene>, HomeCoreError> {
        let scenes = self.scenes.read().await;
        Ok(scenes.iter().find(|scene| scene.id == id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Scene>, HomeCoreError> {
        Ok(self.scenes.read().await.clone())
    }

    async fn update(&self, scene: Scene) -> Result<Scene, HomeCoreError> {
        let mut scenes = self.scenes.write().await;
        let slot = scenes
            .iter_mut()
            .find(|existing| existing.id == scene.id)
            .ok_or_else(|| not_found(&scene.id))?;
        *slot = scene.clone();
        Ok(scene)
    }

    async fn delete(&self, id: SceneId) -> Result<(), HomeCoreError> {
        let mut scenes = self.scenes.write().await;
        let before = scenes.len();
        scenes.retain(|scene| scene.id != id);
        if scenes.len() == before {
            return Err(not_found(&id));
        }
        Ok(())
    }

    async fn mark_activated(&self, id: SceneId, at: Timestamp) -> Result<(), HomeCoreError> {
        let mut scenes = self.scenes.write().await;
        if let Some(scene) = scenes.iter_mut().find(|scene| scene.id == id) {
            scene.last_executed = Some(at);
        }
        Ok(())
    }
}
