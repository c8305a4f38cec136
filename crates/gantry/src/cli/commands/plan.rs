//! Plan command

use clap::Args;
use console::style;
use tracing::info;

use crate::cli::input::InputArgs;
use crate::cli::{output, Cli, OutputFormat, Toolkit};
use crate::exit_codes::CommandFailure;

/// Coordinate proposed versions into a release plan
#[derive(Debug, Args)]
pub struct PlanCommand {
    #[command(flatten)]
    pub input: InputArgs,

    /// Report conflicts without failing
    #[arg(long)]
    pub allow_conflicts: bool,
}

impl PlanCommand {
    /// Execute the plan command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(
            packages = %self.input.packages.display(),
            allow_conflicts = self.allow_conflicts,
            "executing plan command"
        );
        let toolkit = Toolkit::load(cli)?;
        let set = self.input.load()?;

        let plan = toolkit
            .coordinator
            .coordinate_versions(&set.packages, &set.proposed);
        let resolutions = toolkit
            .dependencies
            .resolve_conflicts(&plan.conflicts, &set.packages);

        match cli.format {
            OutputFormat::Json => {
                output::json(&serde_json::json!({
                    "plan": plan,
                    "resolutions": resolutions,
                }))?;
            }
            OutputFormat::Text if !cli.quiet => {
                println!("{}", output::header("Release Plan"));
                println!();

                if plan.is_empty() {
                    output::info("No package updates proposed");
                }
                for update in &plan.packages {
                    println!(
                        "  {} {} → {} ({})",
                        output::package_style().apply_to(&update.name),
                        update.current_version,
                        output::version_style().apply_to(&update.new_version),
                        update.bump_type
                    );
                    println!("      {}", style(&update.reason).dim());
                }

                if !plan.dependency_updates.is_empty() {
                    println!();
                    println!("{}", output::header("Dependency Updates"));
                    for dep in &plan.dependency_updates {
                        println!(
                            "  {} {} {}: {} → {}",
                            output::package_style().apply_to(&dep.package),
                            style(dep.kind).dim(),
                            dep.dependency,
                            dep.current_version,
                            dep.new_version
                        );
                    }
                }

                if !plan.publishing_order.is_empty() {
                    println!();
                    println!(
                        "{}",
                        output::key_value("Publishing order", &output::names(&plan.publishing_order))
                    );
                }
                println!(
                    "{}",
                    output::key_value(
                        "Dependency updates",
                        &plan.strategy.dependency_updates.to_string()
                    )
                );

                if plan.has_conflicts() {
                    println!();
                    println!("{}", style("Conflicts:").red().bold());
                    output::conflicts(&plan.conflicts);

                    println!();
                    println!("{}", output::header("Suggested Resolutions"));
                    for resolution in &resolutions {
                        println!(
                            "  {} {} ({})",
                            style("→").blue(),
                            resolution.conflict.package,
                            resolution.strategy
                        );
                        for action in &resolution.suggested_actions {
                            println!("      - {}", action);
                        }
                    }
                } else {
                    println!();
                    output::success("No conflicts");
                }
            }
            OutputFormat::Text => {}
        }

        if plan.has_conflicts() && !self.allow_conflicts {
            return Err(CommandFailure::validation(format!(
                "Release plan has {} conflict(s)",
                plan.conflicts.len()
            ))
            .into());
        }

        Ok(())
    }
}
