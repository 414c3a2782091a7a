//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the engine and the outside world.
//! They are defined here (in `app`) so that both the engine and the adapter
//! layer can depend on them without creating circular dependencies.

pub mod authorizer;
pub mod clock;
pub mod connector;
pub mod report;
pub mod rule_repo;
pub mod scene_repo;

pub use authorizer::ActionAuthorizer;
pub use clock::{Clock, FixedClock, SystemClock};
pub use connector::{ConnectorError, Connectors, DeviceConnector};
pub use report::ReportPublisher;
pub use rule_repo::RuleRepository;
pub use scene_repo::SceneRepository;
