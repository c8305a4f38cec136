//! Default configuration values

use super::types::Config;

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "gantry.yaml";

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "gantry.toml";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_YAML,
        DEFAULT_CONFIG_TOML,
        ".gantry.yaml",
        ".gantry.toml",
    ]
}

/// Default configuration template
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Gantry Configuration

coordination:
  core_package_sync: false
  component_independence: true
  dependency_updates: automatic
  core_packages: []
  independent_packages: []

ecosystem:
  prefix: null
  pattern: null

publish:
  parallel: false
  timeout_secs: 300
  max_attempts: 3
  initial_delay_ms: 1000
  backoff_multiplier: 2.0
  max_delay_ms: 30000
  estimate_per_package_secs: 30
  command: null
  rollback_command: null
  rollback_on_failure: false
"#;
