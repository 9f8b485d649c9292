use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Column not found: '{column}'")]
    MissingColumn { column: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Schema,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::CsvError(_) | EtlError::ProcessingError { .. } => ErrorCategory::Input,
            EtlError::MissingColumn { .. } => ErrorCategory::Schema,
            EtlError::IoError(_) | EtlError::DatabaseError(_) => ErrorCategory::Storage,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Medium,
            ErrorCategory::Schema => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
            ErrorCategory::Configuration => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::MissingColumn { column } => format!(
                "Check that the source file header contains a '{}' column",
                column
            ),
            EtlError::CsvError(_) | EtlError::ProcessingError { .. } => {
                "Check that the source file is a well-formed delimited file with a header row"
                    .to_string()
            }
            EtlError::IoError(_) => "Check file paths and permissions".to_string(),
            EtlError::DatabaseError(_) => {
                "Check that the database path is writable and the disk is not full".to_string()
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => {
                "Review the TOML configuration file and fix the reported field".to_string()
            }
        }
    }

    /// Process exit code for the binary. Always non-zero so the scheduler retries.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Could not read the source data: {}", self),
            ErrorCategory::Schema => format!("Source data has an unexpected shape: {}", self),
            ErrorCategory::Storage => format!("Could not access storage: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
