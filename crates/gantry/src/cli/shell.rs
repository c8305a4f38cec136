//! Shell command actions for publishing and rollback

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use gantry_core::{GantryError, PackageAction, PackageUpdate, PublishError};

#[derive(Debug, Clone)]
struct Target {
    version: String,
    path: PathBuf,
}

/// Runs a templated shell command per package.
///
/// The template may use `{name}`, `{version}` and `{path}`; the command runs
/// through `sh -c` in the root directory.
#[derive(Debug, Clone)]
pub struct ShellAction {
    template: String,
    root: PathBuf,
    targets: HashMap<String, Target>,
    timeout: Option<Duration>,
}

impl ShellAction {
    /// Create an action for the packages being released
    pub fn new(template: impl Into<String>, root: impl Into<PathBuf>, updates: &[PackageUpdate]) -> Self {
        let targets = updates
            .iter()
            .map(|u| {
                (
                    u.name.clone(),
                    Target {
                        version: u.new_version.clone(),
                        path: u.path.clone(),
                    },
                )
            })
            .collect();

        Self {
            template: template.into(),
            root: root.into(),
            targets,
            timeout: None,
        }
    }

    /// Fail a run that takes longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Expand the template for one package
    pub fn render(&self, package: &str) -> String {
        let (version, path) = match self.targets.get(package) {
            Some(target) => (target.version.as_str(), target.path.display().to_string()),
            None => ("", String::new()),
        };

        self.template
            .replace("{name}", package)
            .replace("{version}", version)
            .replace("{path}", &path)
    }

    async fn exec(&self, package: &str, command: &str) -> Result<(), GantryError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.root)
            .env("GANTRY_PACKAGE", package)
            .kill_on_drop(true)
            .output()
            .await?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = match stderr.trim() {
            "" => format!("exited with {}", output.status),
            text => format!("exited with {}: {}", output.status, last_line(text)),
        };
        Err(PublishError::CommandFailed {
            package: package.to_string(),
            reason,
        }
        .into())
    }
}

fn last_line(text: &str) -> &str {
    text.lines().last().unwrap_or(text)
}

#[async_trait]
impl PackageAction for ShellAction {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn run(&self, package: &str) -> anyhow::Result<()> {
        let command = self.render(package);
        debug!(command = %command, "running package command");

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.exec(package, &command))
                .await
                .map_err(|_| PublishError::Timeout {
                    package: package.to_string(),
                    seconds: limit.as_secs(),
                })??,
            None => self.exec(package, &command).await?,
        }
        Ok(())
    }
}
