//! Package-set input files
//!
//! A package set lists the ecosystem's packages with their declared
//! dependencies and, optionally, the versions proposed for the next release.
//! JSON is read when the file ends in `.json`; anything else is YAML.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use gantry_core::{GantryError, PackageVersion, Result};

/// Default package-set file name
pub const DEFAULT_PACKAGE_SET: &str = "gantry-packages.yaml";

/// Packages plus proposed versions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSet {
    /// Every package in the ecosystem
    pub packages: Vec<PackageVersion>,
    /// Proposed version per package name
    #[serde(default)]
    pub proposed: HashMap<String, String>,
}

impl PackageSet {
    /// Load and check a package set
    pub fn load(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "loading package set");
        let content = std::fs::read_to_string(path)?;

        let set: PackageSet = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        set.check_unique_names()?;
        debug!(
            packages = set.packages.len(),
            proposed = set.proposed.len(),
            "package set loaded"
        );
        Ok(set)
    }

    /// Apply `name=version` overrides on top of the proposed versions
    pub fn apply_overrides(&mut self, overrides: &[String]) -> Result<()> {
        for entry in overrides {
            let (name, version) = entry
                .split_once('=')
                .filter(|(name, version)| !name.is_empty() && !version.is_empty())
                .ok_or_else(|| {
                    GantryError::other(format!("Invalid override '{}', expected name=version", entry))
                })?;
            self.proposed.insert(name.to_string(), version.to_string());
        }
        Ok(())
    }

    fn check_unique_names(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for pkg in &self.packages {
            if !seen.insert(pkg.name.as_str()) {
                return Err(GantryError::other(format!(
                    "Package {} is listed more than once",
                    pkg.name
                )));
            }
        }
        Ok(())
    }
}

/// Package-set arguments shared by every command that reads one
#[derive(Debug, Clone, clap::Args)]
pub struct InputArgs {
    /// Package-set file (JSON or YAML)
    #[arg(short, long, default_value = DEFAULT_PACKAGE_SET)]
    pub packages: PathBuf,

    /// Override a proposed version (name=version), repeatable
    #[arg(long = "set", value_name = "NAME=VERSION")]
    pub overrides: Vec<String>,
}

impl InputArgs {
    /// Load the package set and apply overrides
    pub fn load(&self) -> Result<PackageSet> {
        let mut set = PackageSet::load(&self.packages)?;
        set.apply_overrides(&self.overrides)?;
        Ok(set)
    }
}
