//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.
//! Rules and scenes are validated here, once, when stored; the engine never
//! re-validates them while firing.

pub mod device_service;
pub mod rule_service;
pub mod scene_service;
