//! Scene service: use-cases for managing scenes.

use homecore_domain::error::{HomeCoreError, NotFoundError};
use homecore_domain::id::SceneId;
use homecore_domain::scene::Scene;
use homecore_domain::time::now;

use crate::ports::SceneRepository;

/// Application service for scene CRUD operations.
pub struct SceneService<S> {
    repo: S,
}

impl<S: SceneRepository> SceneService<S> {
    /// Create a new service backed by the given repository.
    pub fn new(repo: S) -> Self {
        Self { repo }
    }

    /// Store a new scene once every target maps to a command.
    ///
    /// # Errors
    ///
    /// Returns [`HomeCoreError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, scene), fields(scene_name = %scene.name))]
    pub async fn create_scene(&self, scene: Scene) -> Result<Scene, HomeCoreError> {
        scene.validate()?;
        self.repo.create(scene).await
    }

    /// # Errors
    ///
    /// Returns [`HomeCoreError::NotFound`] when no scene with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_scene(&self, id: SceneId) -> Result<Scene, HomeCoreError> {
        let missing = id.to_string();
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Scene",
                id: missing,
            }
            .into()
        })
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_scenes(&self) -> Result<Vec<Scene>, HomeCoreError> {
        self.repo.get_all().await
    }

    /// Replace a stored scene, bumping its `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`HomeCoreError::Validation`] if invariants fail, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, scene), fields(scene_id = %scene.id))]
    pub async fn update_scene(&self, mut scene: Scene) -> Result<Scene, HomeCoreError> {
        scene.validate()?;
        scene.updated_at = now();
        self.repo.update(scene).await
    }

    /// # Errors
    ///
    /// Returns [`HomeCoreError::NotFound`] for an unknown scene, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn set_favorite(&self, id: SceneId, favorite: bool) -> Result<Scene, HomeCoreError> {
        let mut scene = self.get_scene(id).await?;
        scene.favorite = favorite;
        scene.updated_at = now();
        self.repo.update(scene).await
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_scene(&self, id: SceneId) -> Result<(), HomeCoreError> {
        self.repo.delete(id).await
    }
}
