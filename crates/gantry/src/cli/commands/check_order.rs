//! Check-order command

use clap::Args;
use tracing::info;

use crate::cli::input::InputArgs;
use crate::cli::{output, Cli, OutputFormat, Toolkit};
use crate::exit_codes::CommandFailure;

/// Audit an externally supplied publishing order
#[derive(Debug, Args)]
pub struct CheckOrderCommand {
    /// Package names in the order they would be published
    #[arg(required = true)]
    pub order: Vec<String>,

    #[command(flatten)]
    pub input: InputArgs,
}

impl CheckOrderCommand {
    /// Execute the check-order command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(packages = self.order.len(), "executing check-order command");
        let toolkit = Toolkit::load(cli)?;
        let set = self.input.load()?;

        let conflicts = toolkit
            .planner
            .validate_publishing_order(&set.packages, &self.order);

        match cli.format {
            OutputFormat::Json => {
                output::json(&serde_json::json!({
                    "valid": conflicts.is_empty(),
                    "conflicts": conflicts,
                }))?;
            }
            OutputFormat::Text if !cli.quiet => {
                if conflicts.is_empty() {
                    output::success("Publishing order is valid");
                } else {
                    output::warning("Publishing order has problems:");
                    output::conflicts(&conflicts);
                }
            }
            OutputFormat::Text => {}
        }

        if !conflicts.is_empty() {
            return Err(CommandFailure::validation(format!(
                "Publishing order has {} conflict(s)",
                conflicts.len()
            ))
            .into());
        }

        Ok(())
    }
}
