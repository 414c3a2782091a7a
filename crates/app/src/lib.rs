//! # homecore-app
//!
//! Application layer: the automation engine and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement:
//!   - `DeviceConnector`: one per protocol, talks to real hardware
//!   - `RuleRepository` / `SceneRepository`: rule and scene persistence
//!   - `ReportPublisher`: outbound execution reports
//!   - `ActionAuthorizer`: veto hook consulted before device actions
//!   - `Clock`: local time of day for time windows
//! - Hold the shared **Device Registry** with per-device locks
//! - Run the engine pipeline: `RuleEngine` → condition evaluator →
//!   `ActionExecutor` → `SceneRunner` / `DeviceCommandDispatcher`
//! - Provide use-case services for rules, scenes and devices
//!
//! ## Dependency rule
//! Depends on `homecore-domain` only (plus `tokio` for time and locks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod dispatcher;
pub mod engine;
pub mod evaluator;
pub mod executor;
pub mod ports;
pub mod registry;
pub mod report_bus;
pub mod scene_runner;
pub mod services;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing;
