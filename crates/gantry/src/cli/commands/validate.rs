//! Validate command

use clap::Args;
use console::style;
use tracing::info;

use crate::cli::input::InputArgs;
use crate::cli::{output, Cli, OutputFormat, Toolkit};
use crate::exit_codes::CommandFailure;

/// Check declared ranges against current versions
#[derive(Debug, Args)]
pub struct ValidateCommand {
    #[command(flatten)]
    pub input: InputArgs,

    /// Validate against the proposed versions instead of current ones
    #[arg(long)]
    pub proposed: bool,

    /// Strict mode - treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

impl ValidateCommand {
    /// Execute the validate command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(
            proposed = self.proposed,
            strict = self.strict,
            "executing validate command"
        );
        let toolkit = Toolkit::load(cli)?;
        let set = self.input.load()?;

        let report = if self.proposed {
            let plan = toolkit
                .coordinator
                .coordinate_versions(&set.packages, &set.proposed);
            toolkit
                .dependencies
                .validate_compatibility(&set.packages, Some(&plan.packages))
        } else {
            toolkit
                .coordinator
                .validate_package_compatibility(&set.packages)
        };

        let passed = report.compatible && !(self.strict && !report.warnings.is_empty());

        match cli.format {
            OutputFormat::Json => {
                output::json(&serde_json::json!({
                    "valid": passed,
                    "report": report,
                }))?;
            }
            OutputFormat::Text if !cli.quiet => {
                println!("{}", output::header("Compatibility"));
                println!();
                output::compatibility(&report.issues, &report.warnings);
                if !report.issues.is_empty() || !report.warnings.is_empty() {
                    println!();
                }

                if passed {
                    if report.warnings.is_empty() {
                        println!("{}", style("✓ All packages compatible").green().bold());
                    } else {
                        println!(
                            "{} with {} warning(s)",
                            style("✓ Validation passed").green().bold(),
                            report.warnings.len()
                        );
                    }
                }
            }
            OutputFormat::Text => {}
        }

        if !passed {
            return Err(CommandFailure::validation(format!(
                "Validation failed with {} issue(s) and {} warning(s)",
                report.issues.len(),
                report.warnings.len()
            ))
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::super::fixtures::{cli, workspace};
    use crate::cli::Commands;
    use crate::exit_codes::{for_error, VALIDATION_ERROR};

    /// `app` already requires the proposed major of `lib`
    const AHEAD_OF_LIB: &str = r#"
packages:
  - name: lib
    currentVersion: 1.0.0
  - name: app
    currentVersion: 1.0.0
    dependencies:
      lib: ^2.0.0
proposed:
  lib: 2.0.0
"#;

    /// `app` depends on an in-ecosystem package outside the set
    const UNKNOWN_MEMBER: &str = r#"
packages:
  - name: "@acme/app"
    currentVersion: 1.0.0
    dependencies:
      "@acme/ghost": ^1.0.0
"#;

    fn run(config_yaml: &str, packages_yaml: &str, args: &[&str]) -> anyhow::Result<()> {
        let temp = TempDir::new().unwrap();
        let (config, packages) = workspace(temp.path(), config_yaml, packages_yaml);
        let mut argv = vec!["validate", "-p", packages.to_str().unwrap()];
        argv.extend_from_slice(args);
        let cli = cli(&config, &argv);
        let Commands::Validate(cmd) = &cli.command else {
            panic!("expected validate command");
        };
        cmd.execute(&cli)
    }

    #[test]
    fn test_current_versions_versus_proposed() {
        let err = run("name: demo\n", AHEAD_OF_LIB, &[]).unwrap_err();
        assert_eq!(for_error(&err), VALIDATION_ERROR);

        run("name: demo\n", AHEAD_OF_LIB, &["--proposed"]).unwrap();
    }

    #[test]
    fn test_strict_turns_warnings_into_failures() {
        let config = "ecosystem:\n  prefix: \"@acme/\"\n";

        run(config, UNKNOWN_MEMBER, &[]).unwrap();

        let err = run(config, UNKNOWN_MEMBER, &["--strict"]).unwrap_err();
        assert_eq!(for_error(&err), VALIDATION_ERROR);
    }
}
