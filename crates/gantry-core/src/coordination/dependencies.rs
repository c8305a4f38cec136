//! Dependency analysis, conflict detection and compatibility validation

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::types::{
    CompatibilityIssue, CompatibilityReport, CompatibilityWarning, ConflictType, DependencyKind,
    DependencyUpdate, IssueSeverity, PackageUpdate, PackageVersion, VersionConflict,
};

use super::ecosystem::EcosystemMatcher;
use super::graph::DependencyGraph;
use super::range::satisfies;

const RESTRUCTURE_HINT: &str = "Restructure packages to remove circular dependency";

/// Result of analysing a package set
#[derive(Debug, Clone)]
pub struct DependencyAnalysis {
    /// The dependency graph
    pub graph: DependencyGraph,
    /// Dependency levels, earliest first
    pub levels: Vec<Vec<String>>,
    /// Cycle paths found by the depth-first search
    pub circular_dependencies: Vec<Vec<String>>,
    /// Packages with no dependencies and no dependents
    pub orphaned_packages: Vec<String>,
}

/// How a conflict should be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStrategy {
    /// The dependent should widen or bump its declared range
    UpdateDependent,
    /// A human has to change the package set or architecture
    Manual,
}

impl std::fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UpdateDependent => write!(f, "update-dependent"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// A proposed resolution for one conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResolution {
    /// The conflict being resolved
    pub conflict: VersionConflict,
    /// Resolution strategy
    pub strategy: ResolutionStrategy,
    /// Concrete actions to take
    pub suggested_actions: Vec<String>,
}

/// Analyses dependency relationships between ecosystem packages
#[derive(Debug, Clone, Default)]
pub struct DependencyManager {
    ecosystem: EcosystemMatcher,
}

impl DependencyManager {
    /// Create a manager that treats names matched by `ecosystem` as in-ecosystem
    pub fn new(ecosystem: EcosystemMatcher) -> Self {
        Self { ecosystem }
    }

    /// Build the graph and compute levels, cycles and orphans
    #[instrument(skip_all, fields(packages = packages.len()))]
    pub fn analyze_dependency_graph(&self, packages: &[PackageVersion]) -> DependencyAnalysis {
        let graph = DependencyGraph::build(packages);
        let levels = graph.levels();
        let circular_dependencies = graph.find_cycles();
        let orphaned_packages = graph.orphans();

        debug!(
            levels = levels.len(),
            cycles = circular_dependencies.len(),
            orphans = orphaned_packages.len(),
            "dependency graph analysed"
        );

        DependencyAnalysis {
            graph,
            levels,
            circular_dependencies,
            orphaned_packages,
        }
    }

    /// Range edits every dependent must make for the given updates
    pub fn calculate_dependency_updates(
        &self,
        packages: &[PackageVersion],
        updates: &[PackageUpdate],
    ) -> Vec<DependencyUpdate> {
        let update_map = update_map(updates);
        let mut dependency_updates = Vec::new();

        for pkg in packages {
            for (kind, dep, declared) in pkg.all_dependencies() {
                let Some(new_version) = update_map.get(dep) else {
                    continue;
                };
                if *new_version == declared {
                    continue;
                }

                dependency_updates.push(DependencyUpdate {
                    package: pkg.name.clone(),
                    dependency: dep.to_string(),
                    current_version: declared.to_string(),
                    new_version: kind.format_range(new_version),
                    kind,
                });
            }
        }

        debug!(count = dependency_updates.len(), "dependency updates calculated");
        dependency_updates
    }

    /// Detect circular, incompatible and missing dependency conflicts
    #[instrument(skip_all, fields(packages = packages.len(), updates = updates.len()))]
    pub fn detect_conflicts(
        &self,
        packages: &[PackageVersion],
        updates: &[PackageUpdate],
    ) -> Vec<VersionConflict> {
        let graph = DependencyGraph::build(packages);
        let mut conflicts: Vec<VersionConflict> = graph
            .find_cycles()
            .into_iter()
            .map(|cycle| VersionConflict {
                package: cycle[0].clone(),
                conflict_type: ConflictType::Circular,
                description: format!("Circular dependency detected: {}", cycle.join(" -> ")),
                affected_packages: cycle,
                suggested_resolution: Some(RESTRUCTURE_HINT.to_string()),
            })
            .collect();

        conflicts.extend(self.detect_incompatibilities(packages, &update_map(updates)));
        conflicts.extend(self.detect_missing(packages));

        if !conflicts.is_empty() {
            info!(count = conflicts.len(), "dependency conflicts detected");
        }
        conflicts
    }

    /// Propose a resolution for each conflict
    pub fn resolve_conflicts(
        &self,
        conflicts: &[VersionConflict],
        packages: &[PackageVersion],
    ) -> Vec<ConflictResolution> {
        let known: HashSet<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        conflicts
            .iter()
            .map(|conflict| Self::resolution_for(conflict, &known))
            .collect()
    }

    /// Validate declared ranges against current or updated versions.
    ///
    /// Updated versions override current ones. Range mismatches and cycles
    /// are errors; missing in-ecosystem dependencies are warnings and never
    /// affect `compatible`.
    #[instrument(skip_all, fields(packages = packages.len()))]
    pub fn validate_compatibility(
        &self,
        packages: &[PackageVersion],
        updates: Option<&[PackageUpdate]>,
    ) -> CompatibilityReport {
        let mut version_map: HashMap<&str, &str> = packages
            .iter()
            .map(|p| (p.name.as_str(), p.current_version.as_str()))
            .collect();
        for update in updates.unwrap_or_default() {
            version_map.insert(update.name.as_str(), update.new_version.as_str());
        }

        let known: HashSet<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        for pkg in packages {
            for (dep, declared) in &pkg.dependencies {
                let Some(actual) = version_map.get(dep.as_str()) else {
                    continue;
                };
                if !satisfies(actual, declared) {
                    issues.push(CompatibilityIssue {
                        severity: IssueSeverity::Error,
                        package: pkg.name.clone(),
                        dependency: dep.clone(),
                        description: format!(
                            "{} requires {}@{}, but {} is available",
                            pkg.name, dep, declared, actual
                        ),
                        suggested_fix: format!("Update {} to require {}@^{}", pkg.name, dep, actual),
                    });
                }
            }

            for dep in pkg.dependency_names() {
                if self.ecosystem.is_member(dep) && !known.contains(dep) {
                    warnings.push(CompatibilityWarning {
                        package: pkg.name.clone(),
                        message: format!("Dependency {} not found in package list", dep),
                        recommendation:
                            "Verify that all ecosystem packages are included in coordination"
                                .to_string(),
                    });
                }
            }
        }

        let graph = DependencyGraph::build(packages);
        for cycle in graph.find_cycles() {
            issues.push(CompatibilityIssue {
                severity: IssueSeverity::Error,
                package: cycle[0].clone(),
                dependency: cycle.get(1).cloned().unwrap_or_default(),
                description: format!("Circular dependency: {}", cycle.join(" -> ")),
                suggested_fix: RESTRUCTURE_HINT.to_string(),
            });
        }

        let report = CompatibilityReport::new(issues, warnings);
        info!(
            compatible = report.compatible,
            issues = report.issues.len(),
            warnings = report.warnings.len(),
            "compatibility validated"
        );
        report
    }

    fn detect_incompatibilities(
        &self,
        packages: &[PackageVersion],
        update_map: &HashMap<&str, &str>,
    ) -> Vec<VersionConflict> {
        let mut conflicts = Vec::new();

        for pkg in packages {
            for (dep, declared) in pkg.dependencies_of(DependencyKind::Dependencies) {
                let Some(new_version) = update_map.get(dep.as_str()) else {
                    continue;
                };
                if satisfies(new_version, declared) {
                    continue;
                }

                debug!(package = %pkg.name, dependency = %dep, declared = %declared, new_version = %new_version, "incompatible range");
                conflicts.push(VersionConflict {
                    package: pkg.name.clone(),
                    conflict_type: ConflictType::Incompatible,
                    description: format!(
                        "{} requires {}@{}, but {} will be published",
                        pkg.name, dep, declared, new_version
                    ),
                    affected_packages: vec![pkg.name.clone(), dep.clone()],
                    suggested_resolution: Some(format!(
                        "Update {} to require {}@^{}",
                        pkg.name, dep, new_version
                    )),
                });
            }
        }

        conflicts
    }

    fn detect_missing(&self, packages: &[PackageVersion]) -> Vec<VersionConflict> {
        let known: HashSet<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        let mut conflicts = Vec::new();

        for pkg in packages {
            for dep in pkg.dependency_names() {
                if !self.ecosystem.is_member(dep) || known.contains(dep) {
                    continue;
                }

                conflicts.push(VersionConflict {
                    package: pkg.name.clone(),
                    conflict_type: ConflictType::Missing,
                    description: format!(
                        "{} depends on {}, which is not in the package list",
                        pkg.name, dep
                    ),
                    affected_packages: vec![pkg.name.clone(), dep.to_string()],
                    suggested_resolution: Some(format!(
                        "Add {} to the package coordination list",
                        dep
                    )),
                });
            }
        }

        conflicts
    }

    fn resolution_for(conflict: &VersionConflict, known: &HashSet<&str>) -> ConflictResolution {
        let (strategy, suggested_actions) = match conflict.conflict_type {
            ConflictType::Circular => (
                ResolutionStrategy::Manual,
                vec![
                    "Review package architecture".to_string(),
                    "Consider extracting shared code to a separate package".to_string(),
                    "Remove circular dependency by restructuring imports".to_string(),
                ],
            ),
            ConflictType::Incompatible => (
                ResolutionStrategy::UpdateDependent,
                vec![
                    format!(
                        "Update {} dependencies to match new versions",
                        conflict.package
                    ),
                    "Consider using version ranges (^) for more flexibility".to_string(),
                    "Review breaking changes in updated packages".to_string(),
                ],
            ),
            ConflictType::Missing => {
                let missing = conflict
                    .affected_packages
                    .get(1)
                    .map(String::as_str)
                    .unwrap_or("the dependency");
                let mut actions = vec![format!("Add {} to package coordination", missing)];
                if known.contains(missing) {
                    actions.push(format!("{} is now known; re-run coordination", missing));
                } else {
                    actions.push("Verify package exists in the ecosystem".to_string());
                }
                actions.push("Update the package manifest if the dependency is incorrect".to_string());
                (ResolutionStrategy::Manual, actions)
            }
        };

        ConflictResolution {
            conflict: conflict.clone(),
            strategy,
            suggested_actions,
        }
    }
}

fn update_map(updates: &[PackageUpdate]) -> HashMap<&str, &str> {
    updates
        .iter()
        .map(|u| (u.name.as_str(), u.new_version.as_str()))
        .collect()
}
