//! Startup seed: rules and scenes read from a JSON file.
//!
//! Everything goes through the rule and scene services, so a seed entry is
//! validated exactly like one created at run time.

use std::path::Path;

use homecore_app::ports::{RuleRepository, SceneRepository};
use homecore_app::services::rule_service::RuleService;
use homecore_app::services::scene_service::SceneService;
use homecore_domain::automation::AutomationRule;
use homecore_domain::error::HomeCoreError;
use homecore_domain::scene::Scene;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub rules: Vec<AutomationRule>,
    pub scenes: Vec<Scene>,
}

impl SeedFile {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid seed JSON.
    pub fn read(path: &Path) -> Result<Self, SeedError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// # Errors
    ///
    /// Returns [`SeedError::Parse`] for malformed JSON.
    pub fn parse(content: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Store every scene, then every rule.
    ///
    /// # Errors
    ///
    /// Stops at the first entry that fails validation or storage.
    pub async fn apply<R, S>(
        self,
        rules: &RuleService<R>,
        scenes: &SceneService<S>,
    ) -> Result<(usize, usize), HomeCoreError>
    where
        R: RuleRepository,
        S: SceneRepository,
    {
        let (rule_count, scene_count) = (self.rules.len(), self.scenes.len());
        for scene in self.scenes {
            scenes.create_scene(scene).await?;
        }
        for rule in self.rules {
            rules.create_rule(rule).await?;
        }
        tracing::info!(rules = rule_count, scenes = scene_count, "seed loaded");
        Ok((rule_count, scene_count))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file")]
    Io(#[from] std::io::Error),
    #[error("failed to parse seed file")]
    Parse(#[from] serde_json::Error),
}
