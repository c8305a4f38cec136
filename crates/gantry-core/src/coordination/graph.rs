//! Dependency graph for ecosystem packages

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::types::PackageVersion;

/// A node in the dependency graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageNode {
    /// Package name
    pub name: String,
    /// Package version
    pub version: String,
    /// Known packages this package depends on
    pub dependencies: Vec<String>,
    /// Known packages that depend on this package
    pub dependents: Vec<String>,
}

/// Dependency graph over a package set, indexed by name
///
/// Only dependencies naming a package in the set become edges, across all
/// three dependency kinds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    /// Nodes indexed by package name
    nodes: HashMap<String, PackageNode>,
    /// Package names in input order
    order: Vec<String>,
}

impl DependencyGraph {
    /// Build a dependency graph from a package set
    pub fn build(packages: &[PackageVersion]) -> Self {
        let mut nodes: HashMap<String, PackageNode> = HashMap::new();
        let mut order = Vec::with_capacity(packages.len());

        for pkg in packages {
            if nodes.contains_key(&pkg.name) {
                continue;
            }
            order.push(pkg.name.clone());
            nodes.insert(
                pkg.name.clone(),
                PackageNode {
                    name: pkg.name.clone(),
                    version: pkg.current_version.clone(),
                    dependencies: Vec::new(),
                    dependents: Vec::new(),
                },
            );
        }

        for pkg in packages {
            for dep in pkg.dependency_names() {
                if !nodes.contains_key(dep) {
                    continue;
                }

                let added = match nodes.get_mut(&pkg.name) {
                    Some(node) if !node.dependencies.iter().any(|d| d == dep) => {
                        node.dependencies.push(dep.to_string());
                        true
                    }
                    _ => false,
                };

                if added {
                    if let Some(dep_node) = nodes.get_mut(dep) {
                        dep_node.dependents.push(pkg.name.clone());
                    }
                }
            }
        }

        Self { nodes, order }
    }

    /// Group packages into levels by repeated in-degree reduction.
    ///
    /// Each level holds every remaining package whose known dependencies are
    /// all in earlier levels. When no such package exists the remaining ones
    /// sit on a cycle and are all placed in the current level, so the walk
    /// always terminates.
    #[instrument(skip_all, fields(nodes = self.nodes.len()))]
    pub fn levels(&self) -> Vec<Vec<String>> {
        let mut levels: Vec<Vec<String>> = Vec::new();
        let mut placed: HashSet<String> = HashSet::new();
        let mut in_degree: HashMap<&str, usize> = self
            .nodes
            .values()
            .map(|n| (n.name.as_str(), n.dependencies.len()))
            .collect();

        while placed.len() < self.order.len() {
            let mut current: Vec<String> = self
                .order
                .iter()
                .filter(|name| !placed.contains(name.as_str()))
                .filter(|name| in_degree.get(name.as_str()).copied().unwrap_or(0) == 0)
                .cloned()
                .collect();

            if current.is_empty() {
                current = self
                    .order
                    .iter()
                    .filter(|name| !placed.contains(name.as_str()))
                    .cloned()
                    .collect();
            }

            placed.extend(current.iter().cloned());
            for name in &current {
                if let Some(node) = self.nodes.get(name) {
                    for dependent in &node.dependents {
                        if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                            *degree = degree.saturating_sub(1);
                        }
                    }
                }
            }

            levels.push(current);
        }

        levels
    }

    /// Find circular dependencies with a depth-first search.
    ///
    /// Every back edge reached during the search yields one cycle path that
    /// starts and ends with the same package, e.g. `[a, b, a]`.
    #[instrument(skip_all, fields(nodes = self.nodes.len()))]
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        fn dfs<'a>(
            graph: &'a DependencyGraph,
            current: &'a str,
            visited: &mut HashSet<&'a str>,
            stack: &mut Vec<&'a str>,
            cycles: &mut Vec<Vec<String>>,
        ) {
            visited.insert(current);
            stack.push(current);

            if let Some(node) = graph.nodes.get(current) {
                for dep in &node.dependencies {
                    if !visited.contains(dep.as_str()) {
                        dfs(graph, dep, visited, stack, cycles);
                    } else if let Some(start) = stack.iter().position(|n| *n == dep.as_str()) {
                        let mut cycle: Vec<String> =
                            stack[start..].iter().map(|n| n.to_string()).collect();
                        cycle.push(dep.clone());
                        cycles.push(cycle);
                    }
                }
            }

            stack.pop();
        }

        let mut cycles = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = Vec::new();

        for name in &self.order {
            if !visited.contains(name.as_str()) {
                dfs(self, name, &mut visited, &mut stack, &mut cycles);
            }
        }

        cycles
    }

    /// Packages with neither dependencies nor dependents, in input order
    pub fn orphans(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|name| {
                self.nodes
                    .get(name.as_str())
                    .is_some_and(|n| n.dependencies.is_empty() && n.dependents.is_empty())
            })
            .cloned()
            .collect()
    }

    /// Get a package node
    pub fn get(&self, name: &str) -> Option<&PackageNode> {
        self.nodes.get(name)
    }

    /// Check whether a package is part of the graph
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Package names in input order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Direct dependencies of a package
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependencies.as_slice())
            .unwrap_or(&[])
    }

    /// Direct dependents of a package
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Number of packages
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DependencyKind;

    fn create_packages() -> Vec<PackageVersion> {
        vec![
            PackageVersion::new("core", "1.0.0"),
            PackageVersion::new("utils", "1.0.0").with_dependency(
                DependencyKind::Dependencies,
                "core",
                "^1.0.0",
            ),
            PackageVersion::new("cli", "1.0.0")
                .with_dependency(DependencyKind::Dependencies, "core", "^1.0.0")
                .with_dependency(DependencyKind::DevDependencies, "utils", "^1.0.0")
                .with_dependency(DependencyKind::Dependencies, "clap", "^4.0.0"),
            PackageVersion::new("docs", "0.1.0"),
        ]
    }

    fn level_of(levels: &[Vec<String>], name: &str) -> usize {
        levels.iter().position(|l| l.iter().any(|n| n == name)).unwrap()
    }

    #[test]
    fn test_build_graph() {
        let graph = DependencyGraph::build(&create_packages());

        assert_eq!(graph.len(), 4);
        assert_eq!(graph.dependencies_of("cli"), ["core", "utils"]);
        assert_eq!(graph.dependents_of("core"), ["utils", "cli"]);
        // external dependencies never become edges
        assert!(!graph.contains("clap"));
    }

    #[test]
    fn test_duplicate_declarations_make_one_edge() {
        let packages = vec![
            PackageVersion::new("core", "1.0.0"),
            PackageVersion::new("ui", "1.0.0")
                .with_dependency(DependencyKind::Dependencies, "core", "^1.0.0")
                .with_dependency(DependencyKind::PeerDependencies, "core", ">=1.0.0"),
        ];
        let graph = DependencyGraph::build(&packages);

        assert_eq!(graph.dependencies_of("ui"), ["core"]);
        assert_eq!(graph.dependents_of("core"), ["ui"]);
        assert_eq!(graph.levels(), vec![vec!["core".to_string()], vec!["ui".to_string()]]);
    }

    #[test]
    fn test_levels_respect_dependencies() {
        let graph = DependencyGraph::build(&create_packages());
        let levels = graph.levels();

        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0], vec!["core".to_string(), "docs".to_string()]);
        assert!(level_of(&levels, "core") < level_of(&levels, "utils"));
        assert!(level_of(&levels, "utils") < level_of(&levels, "cli"));
    }

    #[test]
    fn test_levels_force_place_cycles() {
        let packages = vec![
            PackageVersion::new("base", "1.0.0"),
            PackageVersion::new("a", "1.0.0")
                .with_dependency(DependencyKind::Dependencies, "b", "^1.0.0")
                .with_dependency(DependencyKind::Dependencies, "base", "^1.0.0"),
            PackageVersion::new("b", "1.0.0").with_dependency(
                DependencyKind::Dependencies,
                "a",
                "^1.0.0",
            ),
        ];
        let graph = DependencyGraph::build(&packages);
        let levels = graph.levels();

        assert_eq!(levels[0], vec!["base".to_string()]);
        assert_eq!(levels[1], vec!["a".to_string(), "b".to_string()]);
        assert_eq!(levels.iter().map(Vec::len).sum::<usize>(), 3);
    }

    #[test]
    fn test_cycle_detection() {
        let packages = vec![
            PackageVersion::new("a", "1.0.0").with_dependency(
                DependencyKind::Dependencies,
                "b",
                "^1.0.0",
            ),
            PackageVersion::new("b", "1.0.0").with_dependency(
                DependencyKind::Dependencies,
                "c",
                "^1.0.0",
            ),
            PackageVersion::new("c", "1.0.0").with_dependency(
                DependencyKind::PeerDependencies,
                "a",
                ">=1.0.0",
            ),
        ];
        let graph = DependencyGraph::build(&packages);

        let cycles = graph.find_cycles();
        assert_eq!(cycles, vec![vec!["a", "b", "c", "a"]]);
    }

    #[test]
    fn test_multiple_cycles_reported() {
        let packages = vec![
            PackageVersion::new("a", "1.0.0").with_dependency(
                DependencyKind::Dependencies,
                "b",
                "^1.0.0",
            ),
            PackageVersion::new("b", "1.0.0").with_dependency(
                DependencyKind::Dependencies,
                "a",
                "^1.0.0",
            ),
            PackageVersion::new("x", "1.0.0").with_dependency(
                DependencyKind::Dependencies,
                "y",
                "^1.0.0",
            ),
            PackageVersion::new("y", "1.0.0").with_dependency(
                DependencyKind::Dependencies,
                "x",
                "^1.0.0",
            ),
        ];
        let graph = DependencyGraph::build(&packages);

        let cycles = graph.find_cycles();
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0], vec!["a", "b", "a"]);
        assert_eq!(cycles[1], vec!["x", "y", "x"]);
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let packages = vec![PackageVersion::new("loop", "1.0.0").with_dependency(
            DependencyKind::DevDependencies,
            "loop",
            "^1.0.0",
        )];
        let graph = DependencyGraph::build(&packages);

        assert_eq!(graph.find_cycles(), vec![vec!["loop", "loop"]]);
        assert_eq!(graph.levels(), vec![vec!["loop".to_string()]]);
    }

    #[test]
    fn test_orphans() {
        let graph = DependencyGraph::build(&create_packages());
        assert_eq!(graph.orphans(), vec!["docs".to_string()]);
    }

    #[test]
    fn test_empty_graph() {
        let graph = DependencyGraph::build(&[]);
        assert!(graph.is_empty());
        assert!(graph.levels().is_empty());
        assert!(graph.find_cycles().is_empty());
    }
}
