use crate::config::toml_config::TomlConfig;
use crate::core::pipeline::CsvToSqlitePipeline;
use crate::core::{LoadOutcome, Pipeline};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Summary of one run, for the caller's logs.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub pipeline: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub extracted_rows: usize,
    pub transformed_rows: usize,
    pub load: LoadOutcome,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Extract, transform and load once, in order.
    ///
    /// Only a transform failure is returned as an error. A failed load is
    /// recorded in the report and the run still counts as finished.
    pub fn run(&mut self) -> Result<RunReport> {
        let started_at = Utc::now();
        tracing::info!("Starting ETL run: {}", self.pipeline.name());

        let raw = self.pipeline.extract();
        let extracted_rows = raw.num_rows();
        tracing::info!("Extracted {} records", extracted_rows);
        self.monitor.log_stats("Extract");

        let clean = self.pipeline.transform(raw)?;
        let transformed_rows = clean.num_rows();
        tracing::info!("Transformed {} records", transformed_rows);
        self.monitor.log_stats("Transform");

        let load = self.pipeline.load(&clean);
        self.monitor.log_stats("Load");

        if let LoadOutcome::Failed { reason } = &load {
            tracing::warn!("ETL run finished without persisting data: {}", reason);
        }
        self.monitor.log_final_stats();

        Ok(RunReport {
            pipeline: self.pipeline.name().to_string(),
            started_at,
            finished_at: Utc::now(),
            extracted_rows,
            transformed_rows,
            load,
        })
    }
}

/// Runs the daily job once with the default configuration.
///
/// This is the function a scheduler calls; retries, cadence and alerting are
/// the scheduler's business.
pub fn run_etl() -> Result<RunReport> {
    run_etl_with(TomlConfig::default())
}

pub fn run_etl_with(config: TomlConfig) -> Result<RunReport> {
    let monitor_enabled = config.monitoring_enabled();
    let pipeline = CsvToSqlitePipeline::new(config);
    EtlEngine::new_with_monitoring(pipeline, monitor_enabled).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RecordBatch;
    use crate::domain::model::{Column, ColumnType, Record};
    use crate::utils::error::EtlError;
    use serde_json::json;
    use std::cell::RefCell;

    struct MockPipeline {
        source: RecordBatch,
        fail_load: bool,
        loaded: RefCell<Vec<usize>>,
    }

    impl MockPipeline {
        fn new(source: RecordBatch, fail_load: bool) -> Self {
            Self {
                source,
                fail_load,
                loaded: RefCell::new(Vec::new()),
            }
        }
    }

    impl Pipeline for MockPipeline {
        fn name(&self) -> &str {
            "mock"
        }

        fn extract(&self) -> RecordBatch {
            self.source.clone()
        }

        fn transform(&self, batch: RecordBatch) -> Result<RecordBatch> {
            if batch.column("status").is_none() && !batch.is_empty() {
                return Err(EtlError::MissingColumn {
                    column: "status".to_string(),
                });
            }
            Ok(batch)
        }

        fn load(&self, batch: &RecordBatch) -> LoadOutcome {
            self.loaded.borrow_mut().push(batch.num_rows());
            if self.fail_load {
                LoadOutcome::Failed {
                    reason: "disk full".to_string(),
                }
            } else {
                LoadOutcome::Loaded {
                    table: "transactions".to_string(),
                    rows: batch.num_rows(),
                }
            }
        }
    }

    fn status_batch() -> RecordBatch {
        RecordBatch::new(
            vec![Column::new("status", ColumnType::Text)],
            vec![Record::from_pairs([("status", json!("Completed"))])],
        )
    }

    #[test]
    fn test_run_reports_counts() {
        let mut engine = EtlEngine::new(MockPipeline::new(status_batch(), false));

        let report = engine.run().unwrap();

        assert_eq!(report.pipeline, "mock");
        assert_eq!(report.extracted_rows, 1);
        assert_eq!(report.transformed_rows, 1);
        assert!(report.load.is_loaded());
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn test_load_failure_does_not_fail_run() {
        let mut engine = EtlEngine::new(MockPipeline::new(status_batch(), true));

        let report = engine.run().unwrap();

        assert_eq!(
            report.load,
            LoadOutcome::Failed {
                reason: "disk full".to_string()
            }
        );
    }

    #[test]
    fn test_transform_failure_stops_before_load() {
        let batch = RecordBatch::new(
            vec![Column::new("id", ColumnType::Integer)],
            vec![Record::from_pairs([("id", json!(1))])],
        );
        let mut engine = EtlEngine::new(MockPipeline::new(batch, false));

        let result = engine.run();

        assert!(matches!(result, Err(EtlError::MissingColumn { .. })));
        assert!(engine.pipeline.loaded.borrow().is_empty());
    }

    #[test]
    fn test_report_serializes_load_outcome() {
        let mut engine = EtlEngine::new(MockPipeline::new(status_batch(), false));
        let report = engine.run().unwrap();

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["load"]["status"], json!("loaded"));
        assert_eq!(value["load"]["rows"], json!(1));
    }
}
