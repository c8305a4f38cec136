//! Gantry - Coordinated versioning and staged publishing CLI

mod cli;
mod exit_codes;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use cli::{output, Cli};

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = Cli::parse();
    let _guard = init_tracing(&cli);

    match cli.execute() {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            exit_codes::for_error(&e)
        }
    }
}

/// Environment variable overriding the console log filter
const LOG_ENV: &str = "GANTRY_LOG";

/// Filter for the JSON log file: gantry's own crates at debug, dependencies quiet
const FILE_DIRECTIVES: &str = "warn,gantry=debug,gantry_core=debug";

/// Console filter directives; `GANTRY_LOG` wins over the CLI flags
fn console_directives(cli: &Cli, env: Option<String>) -> String {
    match env.filter(|value| !value.trim().is_empty()) {
        Some(value) => value,
        None if cli.quiet => "error".to_string(),
        None if cli.verbose => "warn,gantry=debug,gantry_core=debug".to_string(),
        None => "warn".to_string(),
    }
}

/// Console logging to stderr, plus a daily JSON file under `~/.gantry/logs`
/// when the directory can be created.
fn init_tracing(cli: &Cli) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let directives = console_directives(cli, std::env::var(LOG_ENV).ok());
    let console_filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("warn"));

    let console = tracing_subscriber::fmt::layer()
        .with_target(cli.verbose)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let (file, guard) = match log_directory() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "gantry.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(EnvFilter::new(FILE_DIRECTIVES));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(console).with(file).init();
    guard
}

/// `~/.gantry/logs`, created on demand
fn log_directory() -> Option<std::path::PathBuf> {
    let log_dir = dirs::home_dir()?.join(".gantry").join("logs");
    std::fs::create_dir_all(&log_dir).ok()?;
    Some(log_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["gantry"];
        argv.extend_from_slice(args);
        argv.extend(["check-order", "lib"]);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_console_level_follows_flags() {
        assert_eq!(console_directives(&parse(&[]), None), "warn");
        assert_eq!(console_directives(&parse(&["-q"]), None), "error");
        assert!(console_directives(&parse(&["-v"]), None).contains("gantry_core=debug"));
    }

    #[test]
    fn test_env_overrides_flags() {
        let cli = parse(&["-q"]);
        assert_eq!(
            console_directives(&cli, Some("gantry_core=trace".to_string())),
            "gantry_core=trace"
        );
        assert_eq!(console_directives(&cli, Some("  ".to_string())), "error");
    }

    #[test]
    fn test_file_directives_parse() {
        assert!(EnvFilter::try_new(FILE_DIRECTIVES).is_ok());
    }
}
