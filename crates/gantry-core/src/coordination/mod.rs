//! Multi-package version coordination
//!
//! The pipeline runs in three layers:
//! - [`DependencyManager`] analyses the graph and finds conflicts
//! - [`PackageCoordinator`] decides versions and builds a [`CoordinationPlan`](crate::types::CoordinationPlan)
//! - [`PublishingPlanner`] stages, publishes, retries and rolls back

pub mod coordinator;
pub mod dependencies;
pub mod ecosystem;
pub mod graph;
mod millis;
pub mod planner;
pub mod range;
pub mod retry;

pub use coordinator::PackageCoordinator;
pub use dependencies::{
    ConflictResolution, DependencyAnalysis, DependencyManager, ResolutionStrategy,
};
pub use ecosystem::EcosystemMatcher;
pub use graph::{DependencyGraph, PackageNode};
pub use planner::{
    NoOpObserver, PackageAction, PackagePublishResult, PublishObserver, PublishObserverRegistry,
    PublishingExecutionResult, PublishingOptions, PublishingPlan, PublishingPlanner,
    PublishingStage, RollbackResult, DEFAULT_ESTIMATE_PER_PACKAGE,
};
pub use retry::{publish_with_retry, RetryConfig};
