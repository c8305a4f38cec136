//! Core types for Gantry
//!
//! Every value here is computed fresh per coordination run from the
//! caller-supplied package list and proposed versions.

use std::collections::BTreeMap;
use std::path::PathBuf;

use semver::Version;

use crate::coordination::range::parse_version;
use serde::{Deserialize, Serialize};

/// A package in the ecosystem with its declared requirements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageVersion {
    /// Package name (unique across the input set)
    pub name: String,
    /// Current version
    pub current_version: String,
    /// Package location, passed through untouched
    #[serde(default)]
    pub path: PathBuf,
    /// Runtime dependencies (name -> range)
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    /// Development dependencies (name -> range)
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,
    /// Peer dependencies (name -> range)
    #[serde(default)]
    pub peer_dependencies: BTreeMap<String, String>,
}

impl PackageVersion {
    /// Create a package with no dependencies
    pub fn new(name: impl Into<String>, current_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            current_version: current_version.into(),
            ..Self::default()
        }
    }

    /// Set the package path
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Add a dependency of the given kind
    pub fn with_dependency(
        mut self,
        kind: DependencyKind,
        name: impl Into<String>,
        range: impl Into<String>,
    ) -> Self {
        self.dependencies_of_mut(kind).insert(name.into(), range.into());
        self
    }

    /// Declared ranges of one dependency kind
    pub fn dependencies_of(&self, kind: DependencyKind) -> &BTreeMap<String, String> {
        match kind {
            DependencyKind::Dependencies => &self.dependencies,
            DependencyKind::DevDependencies => &self.dev_dependencies,
            DependencyKind::PeerDependencies => &self.peer_dependencies,
        }
    }

    fn dependencies_of_mut(&mut self, kind: DependencyKind) -> &mut BTreeMap<String, String> {
        match kind {
            DependencyKind::Dependencies => &mut self.dependencies,
            DependencyKind::DevDependencies => &mut self.dev_dependencies,
            DependencyKind::PeerDependencies => &mut self.peer_dependencies,
        }
    }

    /// Every declared dependency as `(kind, name, range)`, runtime first
    pub fn all_dependencies(&self) -> impl Iterator<Item = (DependencyKind, &str, &str)> {
        DependencyKind::ALL.into_iter().flat_map(move |kind| {
            self.dependencies_of(kind)
                .iter()
                .map(move |(name, range)| (kind, name.as_str(), range.as_str()))
        })
    }

    /// Names of every declared dependency, runtime first, without duplicates
    pub fn dependency_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (_, name, _) in self.all_dependencies() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// The three dependency maps a package can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyKind {
    /// Runtime dependencies
    Dependencies,
    /// Development-only dependencies
    DevDependencies,
    /// Peer dependencies
    PeerDependencies,
}

impl DependencyKind {
    /// All kinds, in manifest order
    pub const ALL: [DependencyKind; 3] = [
        Self::Dependencies,
        Self::DevDependencies,
        Self::PeerDependencies,
    ];

    /// Manifest field name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dependencies => "dependencies",
            Self::DevDependencies => "devDependencies",
            Self::PeerDependencies => "peerDependencies",
        }
    }

    /// Range a dependent should declare against `version`.
    ///
    /// Peer ranges are deliberately looser than runtime and dev ranges.
    pub fn format_range(&self, version: &str) -> String {
        match self {
            Self::Dependencies | Self::DevDependencies => format!("^{}", version),
            Self::PeerDependencies => format!(">={}", version),
        }
    }
}

impl std::fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarsest semantic-version component that changed
///
/// Variants are declared lowest priority first, so `Ord` ranks
/// `None < Patch < Minor < Major`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
    /// No component increased
    #[default]
    None,
    /// Patch component increased
    Patch,
    /// Minor component increased
    Minor,
    /// Major component increased
    Major,
}

impl BumpType {
    /// Derive the bump type from two parsed versions
    pub fn between(current: &Version, new: &Version) -> Self {
        if new.major > current.major {
            Self::Major
        } else if new.minor > current.minor {
            Self::Minor
        } else if new.patch > current.patch {
            Self::Patch
        } else {
            Self::None
        }
    }

    /// Derive the bump type from two version strings; unparseable input is `None`
    pub fn from_versions(current: &str, new: &str) -> Self {
        match (parse_version(current), parse_version(new)) {
            (Some(current), Some(new)) => Self::between(&current, &new),
            _ => Self::None,
        }
    }

    /// Returns the string representation of the bump type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for BumpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BumpType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            "none" => Ok(Self::None),
            _ => Err(format!("Unknown bump type: {}", s)),
        }
    }
}

/// A decided version change for one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageUpdate {
    /// Package name
    pub name: String,
    /// Version before the update
    pub current_version: String,
    /// Version after the update
    pub new_version: String,
    /// Derived bump type
    pub bump_type: BumpType,
    /// Package location
    pub path: PathBuf,
    /// Audit string explaining the update
    pub reason: String,
}

impl PackageUpdate {
    /// Create an update for `package`, deriving the bump type
    pub fn for_package(package: &PackageVersion, new_version: impl Into<String>) -> Self {
        let new_version = new_version.into();
        Self {
            name: package.name.clone(),
            current_version: package.current_version.clone(),
            bump_type: BumpType::from_versions(&package.current_version, &new_version),
            path: package.path.clone(),
            reason: format!(
                "Version bump from {} to {}",
                package.current_version, new_version
            ),
            new_version,
        }
    }

    /// Override the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

/// An edit a dependent must make to one of its dependency declarations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyUpdate {
    /// The dependent package
    pub package: String,
    /// The dependency being bumped
    pub dependency: String,
    /// Currently declared range
    pub current_version: String,
    /// Range to declare instead
    pub new_version: String,
    /// Which dependency map the declaration lives in
    #[serde(rename = "type")]
    pub kind: DependencyKind,
}

/// Kind of version conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictType {
    /// Packages depend on each other in a loop
    Circular,
    /// A declared range does not admit the version being published
    Incompatible,
    /// An in-ecosystem dependency is not in the known package set
    Missing,
}

impl ConflictType {
    /// Returns the string representation of the conflict type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Circular => "circular",
            Self::Incompatible => "incompatible",
            Self::Missing => "missing",
        }
    }
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detected structural problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionConflict {
    /// Primary offending package
    pub package: String,
    /// Conflict kind
    pub conflict_type: ConflictType,
    /// Human-readable description
    pub description: String,
    /// Involved packages; for circular conflicts this is the cycle path
    pub affected_packages: Vec<String>,
    /// Suggested fix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_resolution: Option<String>,
}

/// How dependency range edits should be applied by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyUpdateMode {
    /// Apply edits without asking
    #[default]
    Automatic,
    /// Report edits for a human to apply
    Manual,
    /// Ask before applying each edit
    Prompt,
}

impl std::fmt::Display for DependencyUpdateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Automatic => write!(f, "automatic"),
            Self::Manual => write!(f, "manual"),
            Self::Prompt => write!(f, "prompt"),
        }
    }
}

/// Organization-wide versioning policy, immutable per run
///
/// Serialized in camelCase like the rest of a plan; config files may use
/// the snake_case spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoordinationStrategy {
    /// Force core packages to a single shared version
    #[serde(alias = "core_package_sync")]
    pub core_package_sync: bool,
    /// Allow non-core packages to version on their own schedule
    #[serde(alias = "component_independence")]
    pub component_independence: bool,
    /// How dependency edits are applied
    #[serde(alias = "dependency_updates")]
    pub dependency_updates: DependencyUpdateMode,
    /// Packages kept in lockstep
    #[serde(alias = "core_packages")]
    pub core_packages: Vec<String>,
    /// Packages explicitly exempt from core synchronization
    #[serde(alias = "independent_packages")]
    pub independent_packages: Vec<String>,
}

impl Default for CoordinationStrategy {
    fn default() -> Self {
        Self {
            core_package_sync: false,
            component_independence: true,
            dependency_updates: DependencyUpdateMode::Automatic,
            core_packages: Vec::new(),
            independent_packages: Vec::new(),
        }
    }
}

impl CoordinationStrategy {
    /// Enable core synchronization for the given packages
    pub fn with_core_packages(mut self, packages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.core_package_sync = true;
        self.core_packages = packages.into_iter().map(Into::into).collect();
        self
    }

    /// Check whether a package is a core package
    pub fn is_core(&self, name: &str) -> bool {
        self.core_packages.iter().any(|p| p == name)
    }
}

/// Output of a coordination run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinationPlan {
    /// Packages that change version
    pub packages: Vec<PackageUpdate>,
    /// Range edits dependents must make
    pub dependency_updates: Vec<DependencyUpdate>,
    /// Flat publish order of updated packages
    pub publishing_order: Vec<String>,
    /// Detected conflicts
    pub conflicts: Vec<VersionConflict>,
    /// Strategy the plan was computed with
    pub strategy: CoordinationStrategy,
}

impl CoordinationPlan {
    /// True when no package changes version
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// True when any conflict was detected
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Conflicts of one kind
    pub fn conflicts_of(&self, conflict_type: ConflictType) -> Vec<&VersionConflict> {
        self.conflicts
            .iter()
            .filter(|c| c.conflict_type == conflict_type)
            .collect()
    }

    /// The update decided for a package, if any
    pub fn update_for(&self, name: &str) -> Option<&PackageUpdate> {
        self.packages.iter().find(|u| u.name == name)
    }
}

/// Severity of a compatibility issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Blocks compatibility
    Error,
    /// Advisory only
    Warning,
}

/// A problem found while validating declared ranges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityIssue {
    /// Severity
    pub severity: IssueSeverity,
    /// Package declaring the dependency
    pub package: String,
    /// Dependency involved (empty when not applicable)
    pub dependency: String,
    /// Human-readable description
    pub description: String,
    /// Suggested fix
    pub suggested_fix: String,
}

/// An advisory note that never affects compatibility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityWarning {
    /// Package the warning is about
    pub package: String,
    /// Message
    pub message: String,
    /// Recommendation
    pub recommendation: String,
}

/// Result of a whole-graph compatibility check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    /// True iff no issue has error severity
    pub compatible: bool,
    /// Issues found
    pub issues: Vec<CompatibilityIssue>,
    /// Advisory warnings
    pub warnings: Vec<CompatibilityWarning>,
}

impl CompatibilityReport {
    /// Build a report, deriving `compatible` from the issues
    pub fn new(issues: Vec<CompatibilityIssue>, warnings: Vec<CompatibilityWarning>) -> Self {
        let compatible = !issues.iter().any(|i| i.severity == IssueSeverity::Error);
        Self {
            compatible,
            issues,
            warnings,
        }
    }

    /// Error-severity issues
    pub fn errors(&self) -> Vec<&CompatibilityIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Error)
            .collect()
    }
}
