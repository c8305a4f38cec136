//! Shell completions

use std::path::PathBuf;

use clap::{Args, CommandFactory};
use clap_complete::{generate, generate_to, Shell};
use tracing::info;

use crate::cli::{output, Cli};

/// Print or install shell completions
#[derive(Debug, Args)]
pub struct CompletionsCommand {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the completion script into this directory instead of stdout
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

impl CompletionsCommand {
    /// Execute the completions command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(shell = %self.shell, dir = ?self.dir, "executing completions command");
        let mut cmd = Cli::command();
        let bin = cmd.get_name().to_string();

        match &self.dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                let path = generate_to(self.shell, &mut cmd, bin, dir)?;
                if cli.prints_text() {
                    output::success(&format!("Completions written to {}", path.display()));
                }
            }
            None => generate(self.shell, &mut cmd, bin, &mut std::io::stdout()),
        }

        Ok(())
    }
}
