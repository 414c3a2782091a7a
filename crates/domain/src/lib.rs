//! # homecore-domain
//!
//! Pure domain model for the homecore automation core.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps, times of day
//! - Define **Devices** (identity, kind, protocol, capabilities, last-observed state)
//! - Define **Device commands** and the capability each one requires
//! - Define **Automation rules** (trigger → condition → action trees)
//! - Define **Scenes** (target states across several devices)
//! - Define inbound **Events** and outbound execution **Results**
//! - Contain all invariant enforcement and pure matching logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod automation;
pub mod command;
pub mod device;
pub mod event;
pub mod execution;
pub mod scene;
pub mod value;
