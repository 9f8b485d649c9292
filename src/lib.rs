pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::TomlConfig;

pub use self::core::{
    etl::{run_etl, run_etl_with, EtlEngine, RunReport},
    extract::{extract_data, ExtractOptions},
    load::{load_data, try_load},
    pipeline::CsvToSqlitePipeline,
    transform::{transform_data, TransformOptions},
};
pub use domain::model::{Column, ColumnType, LoadOutcome, Record, RecordBatch};
pub use utils::error::{EtlError, Result};
