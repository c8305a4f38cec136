//! Stages command

use clap::Args;
use tracing::info;

use crate::cli::input::InputArgs;
use crate::cli::{output, Cli, OutputFormat, Toolkit};

/// Show the staged publishing plan
#[derive(Debug, Args)]
pub struct StagesCommand {
    #[command(flatten)]
    pub input: InputArgs,
}

impl StagesCommand {
    /// Execute the stages command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(packages = %self.input.packages.display(), "executing stages command");
        let toolkit = Toolkit::load(cli)?;
        let set = self.input.load()?;

        let plan = toolkit
            .coordinator
            .coordinate_versions(&set.packages, &set.proposed);
        let publishing = toolkit
            .planner
            .generate_publishing_plan(&set.packages, &plan.packages);
        let stages = toolkit
            .planner
            .generate_publishing_stages(&set.packages, &plan.packages);

        match cli.format {
            OutputFormat::Json => {
                output::json(&serde_json::json!({
                    "plan": publishing,
                    "stages": stages,
                }))?;
            }
            OutputFormat::Text if !cli.quiet => {
                println!("{}", output::header("Publishing Stages"));
                println!();
                print_stages(&stages);
                println!();
                println!(
                    "{}",
                    output::key_value("Packages", &publishing.total_packages.to_string())
                );
                println!(
                    "{}",
                    output::key_value(
                        "Estimated duration",
                        &format!("{}s", publishing.estimated_duration.as_secs())
                    )
                );
            }
            OutputFormat::Text => {}
        }

        Ok(())
    }
}

/// Print one line per stage
pub(crate) fn print_stages(stages: &[gantry_core::coordination::PublishingStage]) {
    if stages.is_empty() {
        output::info("Nothing to publish");
    }
    for stage in stages {
        println!(
            "  Stage {}: {} (~{}s)",
            stage.stage + 1,
            output::names(&stage.packages),
            stage.estimated_duration.as_secs()
        );
    }
}
