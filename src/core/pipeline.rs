use crate::core::extract::{extract_data, ExtractOptions};
use crate::core::load::load_data;
use crate::core::transform::{transform_data, TransformOptions};
use crate::core::{ConfigProvider, LoadOutcome, Pipeline, RecordBatch};
use crate::utils::error::Result;

/// CSV file in, SQLite table out.
pub struct CsvToSqlitePipeline<C: ConfigProvider> {
    config: C,
    extract_options: ExtractOptions,
    transform_options: TransformOptions,
}

impl<C: ConfigProvider> CsvToSqlitePipeline<C> {
    pub fn new(config: C) -> Self {
        let extract_options = ExtractOptions {
            delimiter: config.delimiter(),
            na_values: config.na_values().to_vec(),
        };
        let transform_options = TransformOptions {
            status_column: config.status_column().to_string(),
            status_value: config.status_value().to_string(),
        };

        Self {
            config,
            extract_options,
            transform_options,
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }
}

impl<C: ConfigProvider> Pipeline for CsvToSqlitePipeline<C> {
    fn name(&self) -> &str {
        self.config.pipeline_name()
    }

    fn extract(&self) -> RecordBatch {
        tracing::debug!("Reading source file: {}", self.config.source_path().display());
        extract_data(self.config.source_path(), &self.extract_options)
    }

    fn transform(&self, batch: RecordBatch) -> Result<RecordBatch> {
        transform_data(batch, &self.transform_options)
    }

    fn load(&self, batch: &RecordBatch) -> LoadOutcome {
        load_data(batch, self.config.database_path(), self.config.table_name())
    }
}
