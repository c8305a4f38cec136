//! CLI commands

mod check_order;
mod completions;
mod init;
mod plan;
mod publish;
mod stages;
mod validate;

pub use check_order::CheckOrderCommand;
pub use completions::CompletionsCommand;
pub use init::InitCommand;
pub use plan::PlanCommand;
pub use publish::PublishCommand;
pub use stages::StagesCommand;
pub use validate::ValidateCommand;

#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::{Path, PathBuf};

    use clap::Parser;

    use crate::cli::Cli;

    /// Package set with `app` depending on `lib`, both proposed for 1.1.0
    pub const LIB_AND_APP: &str = r#"
packages:
  - name: lib
    currentVersion: 1.0.0
    path: packages/lib
  - name: app
    currentVersion: 1.0.0
    path: packages/app
    dependencies:
      lib: ^1.0.0
proposed:
  lib: 1.1.0
  app: 1.1.0
"#;

    /// Write `gantry.yaml` and `packages.yaml` into `dir`
    pub fn workspace(dir: &Path, config: &str, packages: &str) -> (PathBuf, PathBuf) {
        let config_path = dir.join("gantry.yaml");
        let packages_path = dir.join("packages.yaml");
        std::fs::write(&config_path, config).unwrap();
        std::fs::write(&packages_path, packages).unwrap();
        (config_path, packages_path)
    }

    /// Parse a quiet invocation using an explicit config file
    pub fn cli(config: &Path, args: &[&str]) -> Cli {
        let config = config.to_str().unwrap();
        let mut argv = vec!["gantry", "-q", "--config", config];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }
}
