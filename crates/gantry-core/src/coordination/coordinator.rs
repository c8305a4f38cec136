//! Version coordination across an ecosystem

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, instrument, warn};

use crate::types::{
    BumpType, CompatibilityReport, CoordinationPlan, CoordinationStrategy, DependencyUpdate,
    PackageUpdate, PackageVersion,
};

use super::dependencies::DependencyManager;
use super::graph::DependencyGraph;
use super::range::{max_version, parse_version};

/// Turns proposed versions into a coordinated release plan
#[derive(Debug, Clone)]
pub struct PackageCoordinator {
    strategy: CoordinationStrategy,
    dependencies: DependencyManager,
}

impl PackageCoordinator {
    /// Create a coordinator bound to a strategy
    pub fn new(strategy: CoordinationStrategy, dependencies: DependencyManager) -> Self {
        Self {
            strategy,
            dependencies,
        }
    }

    /// Run the coordination pipeline.
    ///
    /// Determines updates, applies core synchronization, then derives
    /// dependency edits, conflicts and the publishing order from the
    /// post-sync update set.
    #[instrument(skip_all, fields(packages = packages.len(), proposed = proposed.len()))]
    pub fn coordinate_versions(
        &self,
        packages: &[PackageVersion],
        proposed: &HashMap<String, String>,
    ) -> CoordinationPlan {
        let mut updates = self.determine_updates(packages, proposed);

        if self.strategy.core_package_sync {
            updates = self.sync_core_packages(packages, updates);
        }

        let dependency_updates = self
            .dependencies
            .calculate_dependency_updates(packages, &updates);
        let conflicts = self.dependencies.detect_conflicts(packages, &updates);
        let publishing_order = self.generate_publishing_order(packages, &updates);

        info!(
            updates = updates.len(),
            dependency_updates = dependency_updates.len(),
            conflicts = conflicts.len(),
            "coordination plan created"
        );

        CoordinationPlan {
            packages: updates,
            dependency_updates,
            publishing_order,
            conflicts,
            strategy: self.strategy.clone(),
        }
    }

    /// Range edits recorded in a plan
    pub fn update_dependencies<'a>(&self, plan: &'a CoordinationPlan) -> &'a [DependencyUpdate] {
        &plan.dependency_updates
    }

    /// Pre-flight compatibility check on current versions only
    pub fn validate_package_compatibility(&self, packages: &[PackageVersion]) -> CompatibilityReport {
        self.dependencies.validate_compatibility(packages, None)
    }

    /// Dependencies-first order of the updated packages.
    ///
    /// Depth-first post-order over the graph of known packages, filtered to
    /// names present in `updates`.
    pub fn generate_publishing_order(
        &self,
        packages: &[PackageVersion],
        updates: &[PackageUpdate],
    ) -> Vec<String> {
        fn visit(
            graph: &DependencyGraph,
            name: &str,
            visited: &mut HashSet<String>,
            order: &mut Vec<String>,
        ) {
            if !visited.insert(name.to_string()) {
                return;
            }
            for dep in graph.dependencies_of(name) {
                visit(graph, dep, visited, order);
            }
            order.push(name.to_string());
        }

        let graph = DependencyGraph::build(packages);
        let mut visited = HashSet::new();
        let mut order = Vec::with_capacity(graph.len());
        for name in graph.names() {
            visit(&graph, name, &mut visited, &mut order);
        }

        let updated: HashSet<&str> = updates.iter().map(|u| u.name.as_str()).collect();
        order.retain(|name| updated.contains(name.as_str()));
        order
    }

    fn determine_updates(
        &self,
        packages: &[PackageVersion],
        proposed: &HashMap<String, String>,
    ) -> Vec<PackageUpdate> {
        let known: HashSet<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        for name in proposed.keys().filter(|n| !known.contains(n.as_str())) {
            debug!(package = %name, "dropping proposal for unknown package");
        }

        let mut updates = Vec::new();
        for pkg in packages {
            let Some(new_version) = proposed.get(&pkg.name) else {
                continue;
            };
            let Some(parsed) = parse_version(new_version) else {
                warn!(package = %pkg.name, version = %new_version, "ignoring invalid proposed version");
                continue;
            };
            if let Some(current) = parse_version(&pkg.current_version) {
                if parsed == current {
                    debug!(package = %pkg.name, "proposal equals current version");
                    continue;
                }
                if parsed < current {
                    warn!(
                        package = %pkg.name,
                        current = %pkg.current_version,
                        proposed = %new_version,
                        "ignoring proposal lower than current version"
                    );
                    continue;
                }
            } else if *new_version == pkg.current_version {
                debug!(package = %pkg.name, "proposal equals current version");
                continue;
            }

            let update = PackageUpdate::for_package(pkg, new_version.as_str());
            debug!(package = %update.name, bump = %update.bump_type, "update determined");
            updates.push(update);
        }

        updates
    }

    fn sync_core_packages(
        &self,
        packages: &[PackageVersion],
        updates: Vec<PackageUpdate>,
    ) -> Vec<PackageUpdate> {
        let core_updates: Vec<&PackageUpdate> = updates
            .iter()
            .filter(|u| self.strategy.is_core(&u.name))
            .collect();

        let Some(target) = max_version(core_updates.iter().map(|u| u.new_version.as_str()))
            .map(str::to_string)
        else {
            return updates;
        };
        let bump_type = core_updates
            .iter()
            .map(|u| u.bump_type)
            .max()
            .unwrap_or(BumpType::None);

        info!(version = %target, bump = %bump_type, "synchronizing core packages");

        let reason = format!("Synchronized with core packages to {}", target);
        let mut synced = updates;
        for core in &self.strategy.core_packages {
            if let Some(existing) = synced.iter_mut().find(|u| &u.name == core) {
                existing.new_version = target.clone();
                existing.bump_type = bump_type;
                existing.reason = reason.clone();
            } else if let Some(pkg) = packages.iter().find(|p| &p.name == core) {
                let mut update =
                    PackageUpdate::for_package(pkg, target.as_str()).with_reason(reason.clone());
                update.bump_type = bump_type;
                synced.push(update);
            }
        }

        synced
    }
}

impl Default for PackageCoordinator {
    fn default() -> Self {
        Self::new(CoordinationStrategy::default(), DependencyManager::default())
    }
}
