//! Scene repository port: persistence for scenes.

use std::future::Future;

use homecore_domain::error::HomeCoreError;
use homecore_domain::id::SceneId;
use homecore_domain::scene::Scene;
use homecore_domain::time::Timestamp;

/// Repository for persisting and querying [`Scene`]s.
pub trait SceneRepository {
    fn create(&self, scene: Scene) -> impl Future<Output = Result<Scene, HomeCoreError>> + Send;

    fn get_by_id(
        &self,
        id: SceneId,
    ) -> impl Future<Output = Result<Option<Scene>, HomeCoreError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Scene>, HomeCoreError>> + Send;

    fn update(&self, scene: Scene) -> impl Future<Output = Result<Scene, HomeCoreError>> + Send;

    fn delete(&self, id: SceneId) -> impl Future<Output = Result<(), HomeCoreError>> + Send;

    /// Record a fully successful activation. Unknown scenes are ignored.
    fn mark_activated(
        &self,
        id: SceneId,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), HomeCoreError>> + Send;
}

impl<T: SceneRepository + Send + Sync> SceneRepository for std::sync::Arc<T> {
    fn create(&self, scene: Scene) -> impl Future<Output = Result<Scene, HomeCoreError>> + Send {
        (**self).create(scene)
    }

    fn get_by_id(
        &self,
        id: SceneId,
    ) -> impl Future<Output = Result<Option<Scene>, HomeCoreError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Scene>, HomeCoreError>> + Send {
        (**self).get_all()
    }

    fn update(&self, scene: Scene) -> impl Future<Output = Result<Scene, HomeCoreError>> + Send {
        (**self).update(scene)
    }

    fn delete(&self, id: SceneId) -> impl Future<Output = Result<(), HomeCoreError>> + Send {
        (**self).delete(id)
    }

    fn mark_activated(
        &self,
        id: SceneId,
        at: Timestamp,
    ) -> impl Future<Output = Result<(), HomeCoreError>> + Send {
        (**self).mark_activated(id, at)
    }
}
