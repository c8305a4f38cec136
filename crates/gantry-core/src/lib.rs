//! Gantry Core - Version coordination and staged publishing for package ecosystems
//!
//! This crate provides the data model, dependency analysis, version
//! coordination, publishing planner and configuration for the Gantry tool.
//! It works on in-memory package sets; reading manifests and running
//! registry commands is left to callers.

pub mod config;
pub mod coordination;
pub mod error;
pub mod types;

pub use config::{load_config, load_config_or_default, Config};
pub use coordination::{
    DependencyManager, EcosystemMatcher, PackageAction, PackageCoordinator, PublishObserver,
    PublishingOptions, PublishingPlanner, RetryConfig,
};
pub use error::{ConfigError, GantryError, PublishError, Result};
pub use types::{
    BumpType, CompatibilityReport, ConflictType, CoordinationPlan, CoordinationStrategy,
    DependencyKind, PackageUpdate, PackageVersion, VersionConflict,
};
