//! Configuration loading: TOML file with environment variable overrides.
//!
//! `homecore.toml` is read from the working directory when it exists; a
//! missing file means all defaults. `HOMECORE_*` variables win over the file.

use std::path::PathBuf;
use std::time::Duration;

use homecore_app::settings::{EngineSettings, UnmetConditionsPolicy};
use serde::Deserialize;

/// Daemon configuration, one field per TOML section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine tuning.
    pub engine: EngineConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Connector toggles.
    pub integrations: IntegrationsConfig,
    /// Where rules and scenes come from at startup.
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-dispatch timeout in milliseconds.
    pub dispatch_timeout_ms: u64,
    /// Budget for one rule firing, measured from event arrival.
    pub rule_deadline_ms: Option<u64>,
    /// Emit a "conditions not met" result instead of skipping silently.
    pub report_unmet_conditions: bool,
    /// Extra attempts after a timeout or unreachable device.
    pub command_retries: u32,
    /// How long connectors get to announce their devices at startup.
    pub discovery_timeout_ms: u64,
}

/// `[logging]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `homecore_app=debug`.
    pub filter: String,
}

/// Per-connector toggles.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    /// Enable the virtual/demo connector.
    pub virtual_enabled: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file with `rules` and `scenes` to load at startup.
    pub seed_file: Option<PathBuf>,
}

impl Config {
    /// Read `homecore.toml`, layer env overrides on top, then validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("homecore.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HOMECORE_DISPATCH_TIMEOUT_MS")
            && let Ok(ms) = val.parse()
        {
            self.engine.dispatch_timeout_ms = ms;
        }
        if let Ok(val) = std::env::var("HOMECORE_RULE_DEADLINE_MS")
            && let Ok(ms) = val.parse()
        {
            self.engine.rule_deadline_ms = Some(ms);
        }
        if let Ok(val) = std::env::var("HOMECORE_SEED_FILE") {
            self.storage.seed_file = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("HOMECORE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.dispatch_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "dispatch_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.engine.rule_deadline_ms == Some(0) {
            return Err(ConfigError::Validation(
                "rule_deadline_ms must be non-zero when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Engine settings handed to the application layer.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            dispatch_timeout: Duration::from_millis(self.engine.dispatch_timeout_ms),
            rule_deadline: self.engine.rule_deadline_ms.map(Duration::from_millis),
            unmet_conditions: if self.engine.report_unmet_conditions {
                UnmetConditionsPolicy::Report
            } else {
                UnmetConditionsPolicy::Skip
            },
            command_retries: self.engine.command_retries,
        }
    }

    #[must_use]
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.engine.discovery_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout_ms: 5_000,
            rule_deadline_ms: None,
            report_unmet_conditions: false,
            command_retries: 0,
            discovery_timeout_ms: 2_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "homecored=info,homecore_app=info".to_string(),
        }
    }
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            virtual_enabled: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("homecore.toml is not valid TOML")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("homecore.toml could not be read")]
    Io(#[from] std::io::Error),
    /// Values that parse but make no sense.
    #[error("bad configuration: {0}")]
    Validation(String),
}
