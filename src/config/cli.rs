use crate::config::toml_config::TomlConfig;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// One-shot entrypoint for an external scheduler. Runs the pipeline once and exits.
#[derive(Debug, Clone, Parser)]
#[command(name = "transactions-etl")]
#[command(about = "Load completed transactions from a CSV file into SQLite")]
pub struct CliArgs {
    /// Path to a TOML configuration file; built-in defaults are used when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override the monitoring setting from the config
    #[arg(long)]
    pub monitor: Option<bool>,
}

impl CliArgs {
    pub fn load_config(&self) -> Result<TomlConfig> {
        match &self.config {
            Some(path) => TomlConfig::from_file(path),
            None => Ok(TomlConfig::default()),
        }
    }

    pub fn monitor_enabled(&self, config: &TomlConfig) -> bool {
        self.monitor.unwrap_or_else(|| config.monitoring_enabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_file() {
        let args = CliArgs::parse_from(["transactions-etl"]);
        let config = args.load_config().unwrap();

        assert_eq!(config.load.table_name, "transactions");
        assert!(!args.monitor_enabled(&config));
    }

    #[test]
    fn test_monitor_override() {
        let args = CliArgs::parse_from(["transactions-etl", "--monitor", "true", "-v"]);
        assert!(args.verbose);
        assert!(args.monitor_enabled(&TomlConfig::default()));
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let args = CliArgs::parse_from(["transactions-etl", "--config", "/nonexistent/etl.toml"]);
        assert!(args.load_config().is_err());
    }
}
