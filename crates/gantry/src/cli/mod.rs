//! CLI definition and command handling

pub mod commands;
pub mod input;
pub mod output;
pub mod progress;
pub mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use gantry_core::config::{load_config, load_config_or_default, Config};
use gantry_core::{DependencyManager, PackageCoordinator, PublishingPlanner};

use commands::{
    CheckOrderCommand, CompletionsCommand, InitCommand, PlanCommand, PublishCommand, StagesCommand,
    ValidateCommand,
};

/// Gantry - Coordinated versioning and staged publishing
#[derive(Debug, Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Configuration file (searched for when omitted)
    #[arg(long, global = true, env = "GANTRY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a starter configuration file
    Init(InitCommand),

    /// Coordinate proposed versions into a release plan
    Plan(PlanCommand),

    /// Check declared ranges against current versions
    Validate(ValidateCommand),

    /// Show the staged publishing plan
    Stages(StagesCommand),

    /// Audit an externally supplied publishing order
    CheckOrder(CheckOrderCommand),

    /// Publish packages stage by stage
    Publish(PublishCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match self.command {
            Commands::Init(ref cmd) => cmd.execute(&self),
            Commands::Plan(ref cmd) => cmd.execute(&self),
            Commands::Validate(ref cmd) => cmd.execute(&self),
            Commands::Stages(ref cmd) => cmd.execute(&self),
            Commands::CheckOrder(ref cmd) => cmd.execute(&self),
            Commands::Publish(ref cmd) => cmd.execute(&self),
            Commands::Completions(ref cmd) => cmd.execute(&self),
        }
    }

    /// Load the explicit config file, or search from the working directory
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let config = match &self.config {
            Some(path) => load_config(path)?,
            None => {
                let cwd = std::env::current_dir()?;
                let (config, path) = load_config_or_default(&cwd)?;
                debug!(path = ?path, "configuration resolved");
                config
            }
        };
        Ok(config)
    }

    /// True when human-readable output should be printed
    pub fn prints_text(&self) -> bool {
        self.format == OutputFormat::Text && !self.quiet
    }
}

/// Core components wired from configuration
pub struct Toolkit {
    /// Loaded configuration
    pub config: Config,
    /// Dependency analysis
    pub dependencies: DependencyManager,
    /// Version coordination
    pub coordinator: PackageCoordinator,
    /// Publishing planner
    pub planner: PublishingPlanner,
}

impl Toolkit {
    /// Build every component from a configuration
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let dependencies = DependencyManager::new(config.ecosystem_matcher()?);
        let coordinator =
            PackageCoordinator::new(config.coordination.clone(), dependencies.clone());
        let planner = PublishingPlanner::new(dependencies.clone())
            .with_estimate_per_package(config.publish.estimate_per_package());

        Ok(Self {
            config,
            dependencies,
            coordinator,
            planner,
        })
    }

    /// Load configuration for `cli` and build every component
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        Self::from_config(cli.load_config()?)
    }
}
