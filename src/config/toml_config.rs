use crate::core::extract::DEFAULT_NA_VALUES;
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_delimiter, validate_non_empty_string, validate_path, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_PIPELINE_NAME: &str = "etl_pipeline";
pub const DEFAULT_SOURCE_PATH: &str = "mock_transactions.csv";
pub const DEFAULT_DATABASE_PATH: &str = "pipeline.db";
pub const DEFAULT_TABLE_NAME: &str = "transactions";
pub const DEFAULT_STATUS_COLUMN: &str = "status";
pub const DEFAULT_STATUS_VALUE: &str = "Completed";

/// Run configuration. Every section is optional and falls back to the values
/// the daily job has always used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    pub transform: TransformConfig,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub name: String,
    pub description: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PIPELINE_NAME.to_string(),
            description: "Simple ETL: CSV -> transform -> SQLite".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub path: PathBuf,
    pub delimiter: String,
    pub na_values: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SOURCE_PATH),
            delimiter: ",".to_string(),
            na_values: DEFAULT_NA_VALUES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub status_column: String,
    pub status_value: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            status_column: DEFAULT_STATUS_COLUMN.to_string(),
            status_value: DEFAULT_STATUS_VALUE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub database_path: PathBuf,
    pub table_name: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            table_name: DEFAULT_TABLE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value. Unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn pipeline_name(&self) -> &str {
        &self.pipeline.name
    }

    fn source_path(&self) -> &Path {
        &self.source.path
    }

    fn delimiter(&self) -> u8 {
        self.source.delimiter.as_bytes().first().copied().unwrap_or(b',')
    }

    fn na_values(&self) -> &[String] {
        &self.source.na_values
    }

    fn status_column(&self) -> &str {
        &self.transform.status_column
    }

    fn status_value(&self) -> &str {
        &self.transform.status_value
    }

    fn database_path(&self) -> &Path {
        &self.load.database_path
    }

    fn table_name(&self) -> &str {
        &self.load.table_name
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("pipeline.name", &self.pipeline.name)?;
        validate_path("source.path", &self.source.path.to_string_lossy())?;
        validate_delimiter("source.delimiter", &self.source.delimiter)?;
        validate_non_empty_string("transform.status_column", &self.transform.status_column)?;
        validate_path("load.database_path", &self.load.database_path.to_string_lossy())?;
        validate_non_empty_string("load.table_name", &self.load.table_name)?;

        tracing::debug!("Configuration validation passed");
        Ok(())
    }
}
