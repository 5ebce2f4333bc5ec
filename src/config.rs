//! Runtime configuration.
//!
//! Command line arguments with environment fallbacks; `main` loads a `.env`
//! file first so the same variables can live there.

use crate::processing::PlanMode;
use clap::{Parser, ValueEnum};

/// Declaration read when no file is given.
pub const DEFAULT_DECLARATION_FILE: &str = "declaration.json";
/// log4rs configuration file.
pub const DEFAULT_LOG_CONFIG: &str = "log4rs.yml";
/// Zones per subnet group when a group does not set its own count.
pub const DEFAULT_MAX_AZS: usize = 3;

/// How the plan is written to stdout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

/// Plan subnets and resource placement for an infrastructure declaration.
#[derive(Parser, Debug)]
#[command(name = "subnet-plan", version, about, long_about = None)]
pub struct Config {
    /// Declaration file (JSON)
    #[arg(env = "SUBNET_PLAN_FILE", default_value = DEFAULT_DECLARATION_FILE)]
    pub declaration: String,

    /// collect: report every issue, fail-fast: stop at the first one
    #[arg(short, long, env = "SUBNET_PLAN_MODE", default_value_t = PlanMode::Collect)]
    pub mode: PlanMode,

    /// Output format
    #[arg(short, long, env = "SUBNET_PLAN_FORMAT", value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// log4rs configuration file
    #[arg(long, env = "SUBNET_PLAN_LOG_CONFIG", default_value = DEFAULT_LOG_CONFIG)]
    pub log_config: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["subnet-plan", "stack.json"]).unwrap();
        assert_eq!(config.declaration, "stack.json");
        assert_eq!(config.log_config, DEFAULT_LOG_CONFIG);
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "subnet-plan",
            "--mode",
            "fail-fast",
            "--format",
            "json",
            "stack.json",
        ])
        .unwrap();
        assert_eq!(config.mode, PlanMode::FailFast);
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn test_bad_mode() {
        assert!(Config::try_parse_from(["subnet-plan", "--mode", "eventually", "x.json"]).is_err());
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }
}
