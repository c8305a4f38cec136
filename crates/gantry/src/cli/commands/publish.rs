//! Publish command

use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use console::style;
use tracing::{info, warn};

use gantry_core::coordination::{PublishingExecutionResult, RollbackResult};
use gantry_core::{ConfigError, GantryError, PackageAction, PublishError};

use super::stages::print_stages;
use crate::cli::input::InputArgs;
use crate::cli::progress::PublishProgress;
use crate::cli::shell::ShellAction;
use crate::cli::{output, Cli, OutputFormat, Toolkit};
use crate::exit_codes::CommandFailure;

/// Publish packages stage by stage
#[derive(Debug, Args)]
pub struct PublishCommand {
    #[command(flatten)]
    pub input: InputArgs,

    /// Print the stages without running anything
    #[arg(long)]
    pub dry_run: bool,

    /// Publish even when the release plan has conflicts
    #[arg(long)]
    pub allow_conflicts: bool,

    /// Publish the packages of a stage concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Never roll back, even when configured to
    #[arg(long)]
    pub no_rollback: bool,
}

impl PublishCommand {
    /// Execute the publish command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(
            dry_run = self.dry_run,
            parallel = self.parallel,
            "executing publish command"
        );
        let toolkit = Toolkit::load(cli)?;
        let set = self.input.load()?;

        let plan = toolkit
            .coordinator
            .coordinate_versions(&set.packages, &set.proposed);
        if plan.has_conflicts() && !self.allow_conflicts {
            if cli.prints_text() {
                println!("{}", style("Conflicts:").red().bold());
                output::conflicts(&plan.conflicts);
            }
            return Err(CommandFailure::validation(format!(
                "Refusing to publish: release plan has {} conflict(s)",
                plan.conflicts.len()
            ))
            .into());
        }

        let stages = toolkit
            .planner
            .generate_publishing_stages(&set.packages, &plan.packages);

        if self.dry_run {
            match cli.format {
                OutputFormat::Json => output::json(&serde_json::json!({
                    "dryRun": true,
                    "stages": stages,
                }))?,
                OutputFormat::Text if !cli.quiet => {
                    println!("{}", output::header("Publishing Stages (dry run)"));
                    println!();
                    print_stages(&stages);
                }
                OutputFormat::Text => {}
            }
            return Ok(());
        }

        let publish_config = &toolkit.config.publish;
        let command = publish_config.command.clone().ok_or_else(|| {
            GantryError::from(ConfigError::InvalidValue {
                field: "publish.command".to_string(),
                message: "a publish command is required to publish".to_string(),
            })
        })?;

        let root = std::env::current_dir()?;
        let mut options = toolkit.config.publishing_options();
        options.parallel |= self.parallel;

        let publish_action: Arc<dyn PackageAction> = Arc::new(
            ShellAction::new(command, &root, &plan.packages).with_timeout(options.timeout),
        );

        let total = stages.iter().map(|s| s.packages.len()).sum::<usize>();
        let progress = Arc::new(PublishProgress::new(total, cli.prints_text()));
        let planner = toolkit.planner.with_observer(progress.clone());

        let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
        let result =
            runtime.block_on(planner.execute_staged_publishing(&stages, publish_action, &options));
        progress.finish();

        let wants_rollback =
            result.halted() && publish_config.rollback_on_failure && !self.no_rollback;
        let rollback = match (&publish_config.rollback_command, wants_rollback) {
            (Some(template), true) => {
                let published = result.published_packages();
                info!(packages = published.len(), "rolling back published packages");
                let rollback_action = ShellAction::new(template.clone(), &root, &plan.packages)
                    .with_timeout(options.timeout);
                Some(runtime.block_on(planner.rollback_publishing(&published, &rollback_action)))
            }
            (None, true) => {
                warn!("rollback_on_failure is set but no rollback_command is configured");
                None
            }
            (_, false) => None,
        };

        report(cli, &result, rollback.as_ref())?;

        if let Some(rollback) = &rollback {
            if !rollback.success {
                let incomplete = PublishError::RollbackIncomplete(rollback.failed_rollbacks.clone());
                output::error(&incomplete.to_string());
            }
        }

        if result.halted() {
            return Err(GantryError::from(PublishError::Halted {
                stage: result.completed_stages + 1,
                failed: result.failed_packages.len(),
            })
            .into());
        }

        Ok(())
    }
}

fn report(
    cli: &Cli,
    result: &PublishingExecutionResult,
    rollback: Option<&RollbackResult>,
) -> anyhow::Result<()> {
    match cli.format {
        OutputFormat::Json => output::json(&serde_json::json!({
            "result": result,
            "rollback": rollback,
        })),
        OutputFormat::Text if !cli.quiet => {
            println!();
            println!(
                "{}",
                output::key_value(
                    "Stages",
                    &format!("{}/{}", result.completed_stages, result.total_stages)
                )
            );
            println!(
                "{}",
                output::key_value("Published", &output::names(&result.published_packages()))
            );
            if !result.failed_packages.is_empty() {
                println!(
                    "{}",
                    output::key_value("Failed", &output::names(&result.failed_packages))
                );
            }
            if let Some(rollback) = rollback {
                println!(
                    "{}",
                    output::key_value("Rolled back", &output::names(&rollback.rolled_back_packages))
                );
            }
            println!(
                "{}",
                output::key_value("Duration", &format!("{:.1}s", result.duration.as_secs_f64()))
            );

            if result.success {
                println!();
                output::success("All stages published");
            }
            Ok(())
        }
        OutputFormat::Text => Ok(()),
    }
}
