//! # homecore-adapter-storage-memory
//!
//! Process-local persistence for rules and scenes.
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `homecore-app::ports`
//! - Keep listing order stable (insertion order), which the engine relies on
//!   when it reports results
//!
//! ## Dependency rule
//! Depends on `homecore-app` (for port traits) and `homecore-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod rule_repo;
mod scene_repo;

pub use rule_repo::InMemoryRuleRepository;
pub use scene_repo::InMemorySceneRepository;
