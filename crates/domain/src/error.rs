//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`HomeCoreError`] via `#[from]`. Device-level failures are *not* errors:
//! they travel as unsuccessful [`DeviceCommandResult`](crate::execution::DeviceCommandResult)s.

/// Top-level error for fallible domain and application operations.
#[derive(Debug, thiserror::Error)]
pub enum HomeCoreError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("storage error")]
    Storage(#[from] StorageError),
}

/// Broken domain invariants, detected when a value is built or stored.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("identifier must not be empty")]
    EmptyId,

    #[error("a rule needs at least one action")]
    NoActions,

    #[error("tree depth {depth} exceeds the maximum of {max}")]
    TreeTooDeep { depth: usize, max: usize },

    #[error("{field} = {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("between bounds are inverted ({min} > {max})")]
    InvertedBounds { min: f64, max: f64 },

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("invalid time of day `{0}`, expected HH:MM")]
    InvalidTimeOfDay(String),

    #[error("scene property `{property}` = `{value}` on `{device_id}` maps to no command")]
    InvalidSceneProperty {
        device_id: String,
        property: String,
        value: String,
    },
}

/// A lookup that found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} `{id}` not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Failure reported by a persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("storage failure: {0}")]
pub struct StorageError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_into_top_level_error() {
        let err: HomeCoreError = ValidationError::NoActions.into();
        assert!(matches!(
            err,
            HomeCoreError::Validation(ValidationError::NoActions)
        ));
    }

    #[test]
    fn should_render_not_found_message() {
        let err = NotFoundError {
            entity: "Scene",
            id: "movie-night".to_string(),
        };
        assert_eq!(err.to_string(), "Scene `movie-night` not found");
    }

    #[test]
    fn should_render_out_of_range_message() {
        let err = ValidationError::OutOfRange {
            field: "brightness",
            value: 120,
            min: 0,
            max: 100,
        };
        assert_eq!(err.to_string(), "brightness = 120 is outside 0..=100");
    }
}
