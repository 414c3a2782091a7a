//! Scene: a named target state across several devices.
//!
//! Target values are kept in their stringified form (`"power" = "off"`) and
//! mapped to [`DeviceCommand`]s when the scene is validated or activated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::command::DeviceCommand;
use crate::error::{HomeCoreError, ValidationError};
use crate::id::{DeviceId, SceneId};
use crate::time::{Timestamp, now};

/// Property name to stringified target value, for one device.
pub type TargetState = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub id: SceneId,
    pub name: String,
    #[serde(default)]
    pub device_states: BTreeMap<DeviceId, TargetState>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default = "now")]
    pub created_at: Timestamp,
    #[serde(default = "now")]
    pub updated_at: Timestamp,
    #[serde(default)]
    pub last_executed: Option<Timestamp>,
}

impl Scene {
    #[must_use]
    pub fn builder() -> SceneBuilder {
        SceneBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HomeCoreError::Validation`] when the name is empty or a
    /// target property cannot be mapped to a device command.
    pub fn validate(&self) -> Result<(), HomeCoreError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        for device_id in self.device_states.keys() {
            self.commands_for(device_id)?;
        }
        Ok(())
    }

    /// Commands that bring `device_id` to its target state, in property order.
    ///
    /// A device the scene does not mention yields no commands.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSceneProperty`] for the first
    /// property that maps to no command.
    pub fn commands_for(&self, device_id: &DeviceId) -> Result<Vec<DeviceCommand>, ValidationError> {
        let Some(targets) = self.device_states.get(device_id) else {
            return Ok(Vec::new());
        };
        targets
            .iter()
            .map(|(property, value)| {
                DeviceCommand::from_scene_property(property, value).ok_or_else(|| {
                    ValidationError::InvalidSceneProperty {
                        device_id: device_id.to_string(),
                        property: property.clone(),
                        value: value.clone(),
                    }
                })
            })
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct SceneBuilder {
    id: Option<SceneId>,
    name: Option<String>,
    device_states: BTreeMap<DeviceId, TargetState>,
    icon: Option<String>,
    favorite: bool,
}

impl SceneBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<SceneId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set one target property on one device.
    #[must_use]
    pub fn device_state(
        mut self,
        device_id: impl Into<DeviceId>,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.device_states
            .entry(device_id.into())
            .or_default()
            .insert(property.into(), value.into());
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    /// Consume the builder, validate, and return a [`Scene`].
    ///
    /// # Errors
    ///
    /// Returns [`HomeCoreError::Validation`] if invariants fail.
    pub fn build(self) -> Result<Scene, HomeCoreError> {
        let created = now();
        let scene = Scene {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            device_states: self.device_states,
            icon: self.icon,
            favorite: self.favorite,
            created_at: created,
            updated_at: created,
            last_executed: None,
        };
        scene.validate()?;
        Ok(scene)
    }
}
