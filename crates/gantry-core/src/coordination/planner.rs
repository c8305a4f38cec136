//! Staged publishing with retry and rollback

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::types::{ConflictType, DependencyKind, PackageUpdate, PackageVersion, VersionConflict};

use super::dependencies::DependencyManager;
use super::retry::{publish_with_retry, RetryConfig};

/// Default planning estimate per package
pub const DEFAULT_ESTIMATE_PER_PACKAGE: Duration = Duration::from_secs(30);

/// An operation run once per package, such as a registry push or its undo
#[async_trait]
pub trait PackageAction: Send + Sync {
    /// Run the action for one package
    async fn run(&self, package: &str) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> PackageAction for F
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn run(&self, package: &str) -> anyhow::Result<()> {
        (self)(package.to_string()).await
    }
}

/// Packages grouped into dependency levels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishingPlan {
    /// Levels of package names, earliest first
    pub order: Vec<Vec<String>>,
    /// Number of packages across all levels
    pub total_packages: usize,
    /// Planning estimate, not measured
    #[serde(rename = "estimatedDurationMs", with = "super::millis")]
    pub estimated_duration: Duration,
}

/// One level of a publishing plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishingStage {
    /// Stage index, starting at 0
    pub stage: usize,
    /// Packages published in this stage
    pub packages: Vec<String>,
    /// Every package from earlier stages
    pub dependencies: Vec<String>,
    /// Planning estimate for this stage
    #[serde(rename = "estimatedDurationMs", with = "super::millis")]
    pub estimated_duration: Duration,
}

/// Execution options for staged publishing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishingOptions {
    /// Publish every package of a stage concurrently
    pub parallel: bool,
    /// Retry policy per package
    pub retry: RetryConfig,
    /// Advisory limit for a single action, honoured by actions that choose to
    #[serde(rename = "timeout_ms", default, with = "super::millis::option")]
    pub timeout: Option<Duration>,
}

impl Default for PublishingOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            retry: RetryConfig::default(),
            timeout: None,
        }
    }
}

/// Outcome of publishing one package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagePublishResult {
    /// Package name
    pub package: String,
    /// Whether an attempt succeeded
    pub success: bool,
    /// Last error when every attempt failed
    pub error: Option<String>,
    /// Duration of the successful attempt; zero on failure
    #[serde(rename = "durationMs", with = "super::millis")]
    pub duration: Duration,
    /// When the result was recorded
    pub timestamp: DateTime<Utc>,
}

impl PackagePublishResult {
    fn failed(package: &str, error: impl Into<String>) -> Self {
        Self {
            package: package.to_string(),
            success: false,
            error: Some(error.into()),
            duration: Duration::ZERO,
            timestamp: Utc::now(),
        }
    }
}

/// Outcome of a staged publishing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishingExecutionResult {
    /// True when every stage succeeded
    pub success: bool,
    /// Stages that fully succeeded
    pub completed_stages: usize,
    /// Stages supplied
    pub total_stages: usize,
    /// Every recorded result, in stage order
    pub package_results: Vec<PackagePublishResult>,
    /// Packages whose publish failed
    pub failed_packages: Vec<String>,
    /// Wall-clock time of the run
    #[serde(rename = "durationMs", with = "super::millis")]
    pub duration: Duration,
}

impl PublishingExecutionResult {
    /// Successfully published packages in publish order
    pub fn published_packages(&self) -> Vec<String> {
        self.package_results
            .iter()
            .filter(|r| r.success)
            .map(|r| r.package.clone())
            .collect()
    }

    /// True when a stage failed and later stages were skipped
    pub fn halted(&self) -> bool {
        !self.success
    }
}

/// Outcome of a rollback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackResult {
    /// True when no rollback failed
    pub success: bool,
    /// Packages rolled back, in rollback order
    pub rolled_back_packages: Vec<String>,
    /// Packages whose rollback failed
    pub failed_rollbacks: Vec<String>,
    /// One `package: error` entry per failure
    pub errors: Vec<String>,
}

/// Receives progress events during staged publishing and rollback
pub trait PublishObserver: Send + Sync {
    /// A stage is about to run
    fn on_stage_start(&self, _stage: &PublishingStage) {}

    /// A package finished, successfully or not
    fn on_package_complete(&self, _result: &PackagePublishResult) {}

    /// A stage finished
    fn on_stage_complete(&self, _stage: &PublishingStage, _success: bool) {}

    /// A rollback finished
    fn on_rollback_complete(&self, _result: &RollbackResult) {}
}

/// Observer that ignores every event
#[derive(Debug, Default)]
pub struct NoOpObserver;

impl PublishObserver for NoOpObserver {}

/// Broadcasts events to every registered observer
#[derive(Default)]
pub struct PublishObserverRegistry {
    observers: Vec<Arc<dyn PublishObserver>>,
}

impl PublishObserverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer
    pub fn register<O: PublishObserver + 'static>(&mut self, observer: O) {
        self.observers.push(Arc::new(observer));
    }

    /// Number of registered observers
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Check if no observer is registered
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl PublishObserver for PublishObserverRegistry {
    fn on_stage_start(&self, stage: &PublishingStage) {
        for observer in &self.observers {
            observer.on_stage_start(stage);
        }
    }

    fn on_package_complete(&self, result: &PackagePublishResult) {
        for observer in &self.observers {
            observer.on_package_complete(result);
        }
    }

    fn on_stage_complete(&self, stage: &PublishingStage, success: bool) {
        for observer in &self.observers {
            observer.on_stage_complete(stage, success);
        }
    }

    fn on_rollback_complete(&self, result: &RollbackResult) {
        for observer in &self.observers {
            observer.on_rollback_complete(result);
        }
    }
}

/// Plans and executes dependency-ordered publishing
pub struct PublishingPlanner {
    dependencies: DependencyManager,
    estimate_per_package: Duration,
    observer: Arc<dyn PublishObserver>,
}

impl PublishingPlanner {
    /// Create a planner with the default estimate and no observer
    pub fn new(dependencies: DependencyManager) -> Self {
        Self {
            dependencies,
            estimate_per_package: DEFAULT_ESTIMATE_PER_PACKAGE,
            observer: Arc::new(NoOpObserver),
        }
    }

    /// Set the planning estimate per package
    pub fn with_estimate_per_package(mut self, estimate: Duration) -> Self {
        self.estimate_per_package = estimate;
        self
    }

    /// Set the progress observer
    pub fn with_observer(mut self, observer: Arc<dyn PublishObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Group updated packages into dependency levels
    #[instrument(skip_all, fields(packages = packages.len(), updates = updates.len()))]
    pub fn generate_publishing_plan(
        &self,
        packages: &[PackageVersion],
        updates: &[PackageUpdate],
    ) -> PublishingPlan {
        let order = self.updated_levels(packages, updates);
        let total_packages = order.iter().map(Vec::len).sum::<usize>();

        debug!(levels = order.len(), total_packages, "publishing plan generated");
        PublishingPlan {
            estimated_duration: self.estimate_for(total_packages),
            order,
            total_packages,
        }
    }

    /// The publishing plan as stages
    pub fn generate_publishing_stages(
        &self,
        packages: &[PackageVersion],
        updates: &[PackageUpdate],
    ) -> Vec<PublishingStage> {
        let mut earlier: Vec<String> = Vec::new();
        let mut stages = Vec::new();

        for (index, level) in self.updated_levels(packages, updates).into_iter().enumerate() {
            let stage = PublishingStage {
                stage: index,
                estimated_duration: self.estimate_for(level.len()),
                dependencies: earlier.clone(),
                packages: level,
            };
            earlier.extend(stage.packages.iter().cloned());
            stages.push(stage);
        }

        stages
    }

    /// Publish stage by stage, halting after the first failed stage
    #[instrument(skip_all, fields(stages = stages.len(), parallel = options.parallel))]
    pub async fn execute_staged_publishing(
        &self,
        stages: &[PublishingStage],
        action: Arc<dyn PackageAction>,
        options: &PublishingOptions,
    ) -> PublishingExecutionResult {
        let started = Instant::now();
        let mut package_results = Vec::new();
        let mut failed_packages = Vec::new();
        let mut completed_stages = 0;

        for stage in stages {
            info!(stage = stage.stage, packages = stage.packages.len(), "publishing stage");
            self.observer.on_stage_start(stage);

            let results = if options.parallel {
                self.publish_parallel(stage, &action, &options.retry).await
            } else {
                self.publish_sequential(stage, action.as_ref(), &options.retry)
                    .await
            };

            let stage_failed: Vec<String> = results
                .iter()
                .filter(|r| !r.success)
                .map(|r| r.package.clone())
                .collect();
            let stage_success = stage_failed.is_empty();
            package_results.extend(results);
            self.observer.on_stage_complete(stage, stage_success);

            if !stage_success {
                warn!(stage = stage.stage, failed = ?stage_failed, "stage failed, halting");
                failed_packages.extend(stage_failed);
                break;
            }
            completed_stages += 1;
        }

        let success = failed_packages.is_empty();
        let duration = started.elapsed();
        info!(
            success,
            completed_stages,
            total_stages = stages.len(),
            duration_ms = duration.as_millis() as u64,
            "staged publishing finished"
        );

        PublishingExecutionResult {
            success,
            completed_stages,
            total_stages: stages.len(),
            package_results,
            failed_packages,
            duration,
        }
    }

    /// Run one package through the retry policy
    pub async fn retry_package_publishing(
        &self,
        package: &str,
        action: &dyn PackageAction,
        config: &RetryConfig,
    ) -> PackagePublishResult {
        publish_with_retry(package, action, config).await
    }

    /// Undo published packages in reverse order, attempting every one
    #[instrument(skip_all, fields(packages = published.len()))]
    pub async fn rollback_publishing(
        &self,
        published: &[String],
        action: &dyn PackageAction,
    ) -> RollbackResult {
        let mut rolled_back_packages = Vec::new();
        let mut failed_rollbacks = Vec::new();
        let mut errors = Vec::new();

        for package in published.iter().rev() {
            match action.run(package).await {
                Ok(()) => {
                    debug!(package = %package, "rolled back");
                    rolled_back_packages.push(package.clone());
                }
                Err(e) => {
                    warn!(package = %package, error = %e, "rollback failed");
                    errors.push(format!("{}: {:#}", package, e));
                    failed_rollbacks.push(package.clone());
                }
            }
        }

        let result = RollbackResult {
            success: failed_rollbacks.is_empty(),
            rolled_back_packages,
            failed_rollbacks,
            errors,
        };
        info!(
            success = result.success,
            rolled_back = result.rolled_back_packages.len(),
            failed = result.failed_rollbacks.len(),
            "rollback finished"
        );
        self.observer.on_rollback_complete(&result);
        result
    }

    /// Audit an externally supplied flat publish order.
    ///
    /// A runtime or peer dependency must come earlier only when it also
    /// appears in `order`.
    pub fn validate_publishing_order(
        &self,
        packages: &[PackageVersion],
        order: &[String],
    ) -> Vec<VersionConflict> {
        let in_order: HashSet<&str> = order.iter().map(String::as_str).collect();
        let mut published: HashSet<&str> = HashSet::new();
        let mut conflicts = Vec::new();

        for name in order {
            let Some(pkg) = packages.iter().find(|p| &p.name == name) else {
                conflicts.push(VersionConflict {
                    package: name.clone(),
                    conflict_type: ConflictType::Missing,
                    description: format!("Package {} not found in package list", name),
                    affected_packages: vec![name.clone()],
                    suggested_resolution: Some(
                        "Remove the package from the publishing order or add it to the package list"
                            .to_string(),
                    ),
                });
                published.insert(name.as_str());
                continue;
            };

            let mut unpublished: Vec<String> = Vec::new();
            for kind in [DependencyKind::Dependencies, DependencyKind::PeerDependencies] {
                for dep in pkg.dependencies_of(kind).keys() {
                    let pending = in_order.contains(dep.as_str()) && !published.contains(dep.as_str());
                    if pending && !unpublished.contains(dep) {
                        unpublished.push(dep.clone());
                    }
                }
            }

            if !unpublished.is_empty() {
                let mut affected_packages = vec![name.clone()];
                affected_packages.extend(unpublished.iter().cloned());
                conflicts.push(VersionConflict {
                    package: name.clone(),
                    conflict_type: ConflictType::Incompatible,
                    description: format!(
                        "{} is published before its dependencies: {}",
                        name,
                        unpublished.join(", ")
                    ),
                    affected_packages,
                    suggested_resolution: Some(format!(
                        "Publish {} before {}",
                        unpublished.join(", "),
                        name
                    )),
                });
            }

            published.insert(name.as_str());
        }

        conflicts
    }

    async fn publish_sequential(
        &self,
        stage: &PublishingStage,
        action: &dyn PackageAction,
        retry: &RetryConfig,
    ) -> Vec<PackagePublishResult> {
        let mut results = Vec::with_capacity(stage.packages.len());

        for package in &stage.packages {
            let result = publish_with_retry(package, action, retry).await;
            self.observer.on_package_complete(&result);
            let success = result.success;
            results.push(result);
            if !success {
                break;
            }
        }

        results
    }

    async fn publish_parallel(
        &self,
        stage: &PublishingStage,
        action: &Arc<dyn PackageAction>,
        retry: &RetryConfig,
    ) -> Vec<PackagePublishResult> {
        let mut handles = Vec::with_capacity(stage.packages.len());

        for package in &stage.packages {
            let name = package.clone();
            let action = action.clone();
            let retry = retry.clone();
            let handle = tokio::spawn(async move {
                publish_with_retry(&name, action.as_ref(), &retry).await
            });
            handles.push((package.clone(), handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (package, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    PackagePublishResult::failed(&package, format!("publish task panicked: {}", e))
                }
            };
            self.observer.on_package_complete(&result);
            results.push(result);
        }

        results
    }

    fn updated_levels(
        &self,
        packages: &[PackageVersion],
        updates: &[PackageUpdate],
    ) -> Vec<Vec<String>> {
        let updated: HashSet<&str> = updates.iter().map(|u| u.name.as_str()).collect();
        self.dependencies
            .analyze_dependency_graph(packages)
            .levels
            .into_iter()
            .map(|level| {
                level
                    .into_iter()
                    .filter(|name| updated.contains(name.as_str()))
                    .collect::<Vec<_>>()
            })
            .filter(|level| !level.is_empty())
            .collect()
    }

    fn estimate_for(&self, packages: usize) -> Duration {
        self.estimate_per_package
            .saturating_mul(u32::try_from(packages).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn ecosystem_packages() -> Vec<PackageVersion> {
        vec![
            PackageVersion::new("tokens", "1.0.0"),
            PackageVersion::new("build-system", "1.0.0").with_dependency(
                DependencyKind::Dependencies,
                "tokens",
                "^1.0.0",
            ),
            PackageVersion::new("components", "1.0.0")
                .with_dependency(DependencyKind::Dependencies, "tokens", "^1.0.0")
                .with_dependency(DependencyKind::Dependencies, "build-system", "^1.0.0"),
            PackageVersion::new("utils", "1.0.0"),
        ]
    }

    fn bump_all(packages: &[PackageVersion], names: &[&str]) -> Vec<PackageUpdate> {
        packages
            .iter()
            .filter(|p| names.contains(&p.name.as_str()))
            .map(|p| PackageUpdate::for_package(p, "1.1.0"))
            .collect()
    }

    fn stage(index: usize, packages: &[&str]) -> PublishingStage {
        PublishingStage {
            stage: index,
            packages: packages.iter().map(|p| p.to_string()).collect(),
            dependencies: Vec::new(),
            estimated_duration: DEFAULT_ESTIMATE_PER_PACKAGE,
        }
    }

    fn no_retry() -> PublishingOptions {
        PublishingOptions {
            retry: RetryConfig {
                max_attempts: 1,
                ..RetryConfig::default()
            },
            ..PublishingOptions::default()
        }
    }

    /// Records every call; fails for the listed packages
    fn recording_action(
        failing: &[&str],
    ) -> (Arc<dyn PackageAction>, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let failing: Vec<String> = failing.iter().map(|s| s.to_string()).collect();
        let recorded = calls.clone();
        let action = move |name: String| {
            let recorded = recorded.clone();
            let fail = failing.contains(&name);
            async move {
                recorded.lock().unwrap().push(name.clone());
                if fail {
                    anyhow::bail!("{} failed", name);
                }
                Ok(())
            }
        };
        (Arc::new(action), calls)
    }

    #[test]
    fn test_generate_publishing_plan() {
        let packages = ecosystem_packages();
        let updates = bump_all(&packages, &["tokens", "build-system", "components"]);
        let planner = PublishingPlanner::new(DependencyManager::default());

        let plan = planner.generate_publishing_plan(&packages, &updates);

        assert_eq!(plan.total_packages, 3);
        assert_eq!(
            plan.order,
            vec![
                vec!["tokens".to_string()],
                vec!["build-system".to_string()],
                vec!["components".to_string()],
            ]
        );
        assert_eq!(plan.estimated_duration, Duration::from_secs(90));
    }

    #[test]
    fn test_plan_drops_empty_levels() {
        let packages = ecosystem_packages();
        let updates = bump_all(&packages, &["tokens", "components", "utils"]);
        let planner = PublishingPlanner::new(DependencyManager::default())
            .with_estimate_per_package(Duration::from_secs(10));

        let plan = planner.generate_publishing_plan(&packages, &updates);

        assert_eq!(
            plan.order,
            vec![
                vec!["tokens".to_string(), "utils".to_string()],
                vec!["components".to_string()],
            ]
        );
        assert_eq!(plan.estimated_duration, Duration::from_secs(30));
    }

    #[test]
    fn test_generate_publishing_stages() {
        let packages = ecosystem_packages();
        let updates = bump_all(&packages, &["tokens", "build-system", "components", "utils"]);
        let planner = PublishingPlanner::new(DependencyManager::default());

        let stages = planner.generate_publishing_stages(&packages, &updates);

        assert_eq!(stages.len(), 3);
        assert_eq!(stages[0].stage, 0);
        assert!(stages[0].dependencies.is_empty());
        assert_eq!(stages[0].estimated_duration, Duration::from_secs(60));
        assert_eq!(stages[1].dependencies, vec!["tokens", "utils"]);
        assert_eq!(stages[2].dependencies, vec!["tokens", "utils", "build-system"]);

        let json = serde_json::to_value(&stages[0]).unwrap();
        assert_eq!(json["estimatedDurationMs"], 60_000);
        assert_eq!(json["packages"], serde_json::json!(["tokens", "utils"]));
    }

    #[tokio::test]
    async fn test_execute_staged_publishing_success() {
        let planner = PublishingPlanner::new(DependencyManager::default());
        let (action, calls) = recording_action(&[]);
        let stages = vec![stage(0, &["tokens"]), stage(1, &["build-system"])];

        let result = planner
            .execute_staged_publishing(&stages, action, &PublishingOptions::default())
            .await;

        assert!(result.success);
        assert!(!result.halted());
        assert_eq!(result.completed_stages, 2);
        assert_eq!(result.total_stages, 2);
        assert_eq!(result.package_results.len(), 2);
        assert!(result.failed_packages.is_empty());
        assert_eq!(*calls.lock().unwrap(), vec!["tokens", "build-system"]);
        assert_eq!(result.published_packages(), vec!["tokens", "build-system"]);
    }

    #[tokio::test]
    async fn test_failed_stage_halts_later_stages() {
        let planner = PublishingPlanner::new(DependencyManager::default());
        let (action, calls) = recording_action(&["tokens"]);
        let stages = vec![stage(0, &["tokens"]), stage(1, &["build-system"])];

        let result = planner
            .execute_staged_publishing(&stages, action, &no_retry())
            .await;

        assert!(!result.success);
        assert!(result.halted());
        assert_eq!(result.completed_stages, 0);
        assert_eq!(result.failed_packages, vec!["tokens"]);
        assert_eq!(*calls.lock().unwrap(), vec!["tokens"]);
        assert_eq!(
            result.package_results[0].error.as_deref(),
            Some("tokens failed")
        );
    }

    #[tokio::test]
    async fn test_sequential_stage_stops_at_first_failure() {
        let planner = PublishingPlanner::new(DependencyManager::default());
        let (action, calls) = recording_action(&["b"]);
        let stages = vec![stage(0, &["a"]), stage(1, &["b", "c"]), stage(2, &["d"])];

        let result = planner
            .execute_staged_publishing(&stages, action, &no_retry())
            .await;

        assert_eq!(result.completed_stages, 1);
        assert_eq!(*calls.lock().unwrap(), vec!["a", "b"]);
        assert_eq!(result.package_results.len(), 2);
        assert_eq!(result.published_packages(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_parallel_stage_collects_every_result() {
        let planner = PublishingPlanner::new(DependencyManager::default());
        let (action, calls) = recording_action(&["b"]);
        let stages = vec![stage(0, &["a", "b", "c"]), stage(1, &["d"])];
        let options = PublishingOptions {
            parallel: true,
            ..no_retry()
        };

        let result = planner.execute_staged_publishing(&stages, action, &options).await;

        assert!(!result.success);
        assert_eq!(result.completed_stages, 0);
        assert_eq!(result.package_results.len(), 3);
        assert_eq!(result.failed_packages, vec!["b"]);
        assert_eq!(result.published_packages(), vec!["a", "c"]);

        let mut called = calls.lock().unwrap().clone();
        called.sort();
        assert_eq!(called, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_parallel_panic_is_a_failed_result() {
        let planner = PublishingPlanner::new(DependencyManager::default());
        let action = |name: String| async move {
            if name == "boom" {
                panic!("exploded");
            }
            anyhow::Ok(())
        };
        let options = PublishingOptions {
            parallel: true,
            ..no_retry()
        };

        let result = planner
            .execute_staged_publishing(&[stage(0, &["ok", "boom"])], Arc::new(action), &options)
            .await;

        assert_eq!(result.failed_packages, vec!["boom"]);
        let boom = &result.package_results[1];
        assert!(boom
            .error
            .as_deref()
            .unwrap()
            .starts_with("publish task panicked"));
    }

    #[tokio::test]
    async fn test_empty_stage_list_succeeds() {
        let planner = PublishingPlanner::new(DependencyManager::default());
        let (action, _) = recording_action(&[]);

        let result = planner
            .execute_staged_publishing(&[], action, &PublishingOptions::default())
            .await;

        assert!(result.success);
        assert_eq!(result.total_stages, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_package_publishing() {
        let planner = PublishingPlanner::new(DependencyManager::default());
        let attempts = Arc::new(Mutex::new(0u32));
        let counter = attempts.clone();
        let action = move |_name: String| {
            let counter = counter.clone();
            async move {
                let mut count = counter.lock().unwrap();
                *count += 1;
                if *count < 3 {
                    anyhow::bail!("Publishing failed");
                }
                Ok(())
            }
        };
        let config = RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(100),
        };

        let result = planner
            .retry_package_publishing("tokens", &action, &config)
            .await;

        assert!(result.success);
        assert_eq!(*attempts.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_rollback_in_reverse_order() {
        let planner = PublishingPlanner::new(DependencyManager::default());
        let (action, calls) = recording_action(&[]);
        let published = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let result = planner.rollback_publishing(&published, action.as_ref()).await;

        assert!(result.success);
        assert_eq!(result.rolled_back_packages, vec!["c", "b", "a"]);
        assert_eq!(*calls.lock().unwrap(), vec!["c", "b", "a"]);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_rollback_continues_past_failures() {
        let planner = PublishingPlanner::new(DependencyManager::default());
        let (action, calls) = recording_action(&["B"]);
        let published = vec!["A".to_string(), "B".to_string(), "C".to_string()];

        let result = planner.rollback_publishing(&published, action.as_ref()).await;

        assert!(!result.success);
        assert_eq!(result.rolled_back_packages, vec!["C", "A"]);
        assert_eq!(result.failed_rollbacks, vec!["B"]);
        assert_eq!(result.errors, vec!["B: B failed"]);
        assert_eq!(*calls.lock().unwrap(), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_validate_publishing_order() {
        let packages = ecosystem_packages();
        let planner = PublishingPlanner::new(DependencyManager::default());
        let order = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();

        assert!(planner
            .validate_publishing_order(&packages, &order(&["tokens", "build-system", "components"]))
            .is_empty());

        let conflicts = planner.validate_publishing_order(
            &packages,
            &order(&["components", "tokens", "build-system", "ghost"]),
        );
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].conflict_type, ConflictType::Incompatible);
        assert_eq!(conflicts[0].package, "components");
        assert_eq!(
            conflicts[0].affected_packages,
            vec!["components", "build-system", "tokens"]
        );
        assert_eq!(conflicts[1].conflict_type, ConflictType::Missing);
        assert_eq!(conflicts[1].package, "ghost");
    }

    #[test]
    fn test_validate_order_ignores_dev_dependencies_and_absent_names() {
        let packages = vec![
            PackageVersion::new("core", "1.0.0"),
            PackageVersion::new("app", "1.0.0")
                .with_dependency(DependencyKind::DevDependencies, "core", "^1.0.0")
                .with_dependency(DependencyKind::Dependencies, "lib", "^1.0.0"),
            PackageVersion::new("lib", "1.0.0"),
        ];
        let planner = PublishingPlanner::new(DependencyManager::default());

        let conflicts =
            planner.validate_publishing_order(&packages, &["app".to_string(), "core".to_string()]);
        assert!(conflicts.is_empty());
    }

    #[derive(Default)]
    struct CountingObserver {
        events: Mutex<Vec<String>>,
    }

    impl PublishObserver for Arc<CountingObserver> {
        fn on_stage_start(&self, stage: &PublishingStage) {
            self.events.lock().unwrap().push(format!("start {}", stage.stage));
        }

        fn on_package_complete(&self, result: &PackagePublishResult) {
            self.events.lock().unwrap().push(format!("done {}", result.package));
        }

        fn on_stage_complete(&self, stage: &PublishingStage, success: bool) {
            self.events
                .lock()
                .unwrap()
                .push(format!("end {} {}", stage.stage, success));
        }
    }

    #[tokio::test]
    async fn test_observer_registry_broadcasts() {
        let observer = Arc::new(CountingObserver::default());
        let mut registry = PublishObserverRegistry::new();
        registry.register(observer.clone());
        registry.register(NoOpObserver);
        assert_eq!(registry.len(), 2);

        let planner = PublishingPlanner::new(DependencyManager::default())
            .with_observer(Arc::new(registry));
        let (action, _) = recording_action(&[]);

        planner
            .execute_staged_publishing(&[stage(0, &["a"])], action, &PublishingOptions::default())
            .await;

        assert_eq!(
            *observer.events.lock().unwrap(),
            vec!["start 0", "done a", "end 0 true"]
        );
    }
}
