use crate::config::toml_config::{DEFAULT_STATUS_COLUMN, DEFAULT_STATUS_VALUE};
use crate::domain::model::RecordBatch;
use crate::utils::error::{EtlError, Result};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub status_column: String,
    pub status_value: String,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            status_column: DEFAULT_STATUS_COLUMN.to_string(),
            status_value: DEFAULT_STATUS_VALUE.to_string(),
        }
    }
}

/// Drops incomplete rows, then keeps rows whose status equals the accepted value.
///
/// Surviving rows keep their relative order and contents; the column schema is
/// unchanged. An empty batch is passed through as is. A non-empty batch without
/// the status column is an error.
pub fn transform_data(batch: RecordBatch, options: &TransformOptions) -> Result<RecordBatch> {
    if batch.is_empty() {
        tracing::warn!("[Transform] Empty record batch received.");
        return Ok(batch);
    }

    if batch.column(&options.status_column).is_none() {
        return Err(EtlError::MissingColumn {
            column: options.status_column.clone(),
        });
    }

    let input_rows = batch.num_rows();
    let (columns, mut records) = batch.into_parts();

    records.retain(|record| !record.has_missing(&columns));
    let complete_rows = records.len();

    records.retain(|record| match record.get(&options.status_column) {
        Value::String(status) => *status == options.status_value,
        _ => false,
    });

    tracing::info!("[Transform] Data successfully transformed.");
    tracing::debug!(
        "[Transform] {} rows in, {} complete, {} with {} = {:?}",
        input_rows,
        complete_rows,
        records.len(),
        options.status_column,
        options.status_value
    );

    Ok(RecordBatch::new(columns, records))
}
