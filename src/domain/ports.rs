use crate::domain::model::{LoadOutcome, RecordBatch};
use crate::utils::error::Result;
use std::path::Path;

pub trait ConfigProvider {
    fn pipeline_name(&self) -> &str;
    fn source_path(&self) -> &Path;
    fn delimiter(&self) -> u8;
    fn na_values(&self) -> &[String];
    fn status_column(&self) -> &str;
    fn status_value(&self) -> &str;
    fn database_path(&self) -> &Path;
    fn table_name(&self) -> &str;
}

/// The three stages of a run.
///
/// `extract` and `load` recover from their own failures; only `transform`
/// can stop a run.
pub trait Pipeline {
    fn name(&self) -> &str;
    fn extract(&self) -> RecordBatch;
    fn transform(&self, batch: RecordBatch) -> Result<RecordBatch>;
    fn load(&self, batch: &RecordBatch) -> LoadOutcome;
}
