use crate::domain::model::{ColumnType, LoadOutcome, RecordBatch};
use crate::utils::error::{EtlError, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use serde_json::Value;
use std::path::Path;

/// Replaces `table` in the SQLite database at `database_path` with the batch.
///
/// Failures are logged and returned as [`LoadOutcome::Failed`]; they never
/// propagate. The connection is closed before returning on every path.
pub fn load_data(batch: &RecordBatch, database_path: &Path, table: &str) -> LoadOutcome {
    match try_load(batch, database_path, table) {
        Ok(rows) => {
            tracing::info!("[Load] Data loaded to database.");
            tracing::debug!(
                "[Load] {} rows written to {} in {}",
                rows,
                table,
                database_path.display()
            );
            LoadOutcome::Loaded {
                table: table.to_string(),
                rows,
            }
        }
        Err(e) => {
            tracing::error!("[Load] Load failed: {}", e);
            LoadOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

/// Same as [`load_data`] but surfaces the error. Returns the number of rows written.
pub fn try_load(batch: &RecordBatch, database_path: &Path, table: &str) -> Result<usize> {
    if batch.num_columns() == 0 {
        return Err(EtlError::ProcessingError {
            message: format!("cannot create table '{}' without columns", table),
        });
    }

    let mut conn = Connection::open(database_path)?;
    let written = replace_table(&mut conn, batch, table);

    if let Err((_, e)) = conn.close() {
        tracing::warn!("[Load] Failed to close database connection: {}", e);
    }

    written
}

fn replace_table(conn: &mut Connection, batch: &RecordBatch, table: &str) -> Result<usize> {
    let table_ident = quote_identifier(table);
    let column_defs = batch
        .columns()
        .iter()
        .map(|c| format!("{} {}", quote_identifier(&c.name), c.dtype.sql_type()))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=batch.num_columns())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");

    // Dropped transaction rolls back, leaving the previous table in place.
    let tx = conn.transaction()?;
    tx.execute(&format!("DROP TABLE IF EXISTS {}", table_ident), [])?;
    tx.execute(&format!("CREATE TABLE {} ({})", table_ident, column_defs), [])?;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} VALUES ({})",
            table_ident, placeholders
        ))?;
        for record in batch.records() {
            let params = batch
                .columns()
                .iter()
                .map(|c| to_sql_value(record.get(&c.name), c.dtype))
                .collect::<Vec<_>>();
            stmt.execute(rusqlite::params_from_iter(params))?;
        }
    }
    tx.commit()?;

    Ok(batch.num_rows())
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn to_sql_value(value: &Value, dtype: ColumnType) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match (dtype, n.as_i64()) {
            (ColumnType::Integer, Some(i)) => SqlValue::Integer(i),
            _ => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Column, Record};
    use serde_json::json;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    fn completed_batch() -> RecordBatch {
        RecordBatch::new(
            vec![
                Column::new("id", ColumnType::Integer),
                Column::new("status", ColumnType::Text),
                Column::new("amt", ColumnType::Real),
            ],
            vec![
                Record::from_pairs([
                    ("id", json!(1)),
                    ("status", json!("Completed")),
                    ("amt", json!(10.5)),
                ]),
                Record::from_pairs([
                    ("id", json!(4)),
                    ("status", json!("Completed")),
                    ("amt", json!(2.0)),
                ]),
            ],
        )
    }

    fn column_info(db: &Path, table: &str) -> Vec<(String, String)> {
        let conn = Connection::open(db).unwrap();
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({})", quote_identifier(table)))
            .unwrap();
        let columns = stmt
            .query_map([], |row| Ok((row.get(1)?, row.get(2)?)))
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap();
        columns
    }

    fn row_count(db: &Path, table: &str) -> i64 {
        let conn = Connection::open(db).unwrap();
        conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_identifier(table)),
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_load_creates_table_matching_batch() {
        let temp_dir = TempDir::new().unwrap();
        let db = temp_dir.path().join("pipeline.db");

        let outcome = load_data(&completed_batch(), &db, "transactions");

        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                table: "transactions".to_string(),
                rows: 2
            }
        );
        assert_eq!(row_count(&db, "transactions"), 2);
        assert_eq!(
            column_info(&db, "transactions"),
            vec![
                ("id".to_string(), "INTEGER".to_string()),
                ("status".to_string(), "TEXT".to_string()),
                ("amt".to_string(), "REAL".to_string()),
            ]
        );

        let conn = Connection::open(&db).unwrap();
        let (id, amt): (i64, f64) = conn
            .query_row(
                "SELECT id, amt FROM transactions WHERE rowid = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(id, 1);
        assert_eq!(amt, 10.5);
    }

    #[test]
    fn test_load_replaces_existing_table() {
        let temp_dir = TempDir::new().unwrap();
        let db = temp_dir.path().join("pipeline.db");

        {
            let conn = Connection::open(&db).unwrap();
            conn.execute_batch(
                "CREATE TABLE transactions (legacy TEXT);
                 INSERT INTO transactions VALUES ('a'), ('b'), ('c'), ('d');",
            )
            .unwrap();
        }

        assert!(load_data(&completed_batch(), &db, "transactions").is_loaded());
        assert!(load_data(&completed_batch(), &db, "transactions").is_loaded());

        assert_eq!(row_count(&db, "transactions"), 2);
        assert_eq!(column_info(&db, "transactions").len(), 3);
    }

    #[test]
    fn test_load_header_only_batch_creates_empty_table() {
        let temp_dir = TempDir::new().unwrap();
        let db = temp_dir.path().join("pipeline.db");
        let batch = RecordBatch::new(vec![Column::new("status", ColumnType::Text)], vec![]);

        assert!(load_data(&batch, &db, "transactions").is_loaded());
        assert_eq!(row_count(&db, "transactions"), 0);
    }

    #[test]
    fn test_load_batch_without_columns_fails_quietly() {
        let temp_dir = TempDir::new().unwrap();
        let db = temp_dir.path().join("pipeline.db");

        let outcome = load_data(&RecordBatch::empty(), &db, "transactions");

        assert!(matches!(outcome, LoadOutcome::Failed { .. }));
        assert!(try_load(&RecordBatch::empty(), &db, "transactions").is_err());
        assert!(!db.exists());
    }

    #[test]
    fn test_failed_load_keeps_previous_table() {
        let temp_dir = TempDir::new().unwrap();
        let db = temp_dir.path().join("pipeline.db");
        assert!(load_data(&completed_batch(), &db, "transactions").is_loaded());

        // Duplicate column names are rejected by CREATE TABLE inside the transaction.
        let bad = RecordBatch::new(
            vec![
                Column::new("id", ColumnType::Integer),
                Column::new("ID", ColumnType::Integer),
            ],
            vec![],
        );
        assert!(!load_data(&bad, &db, "transactions").is_loaded());

        assert_eq!(row_count(&db, "transactions"), 2);
    }

    #[test]
    fn test_load_to_unreachable_path_fails_quietly() {
        let temp_dir = TempDir::new().unwrap();
        let db = temp_dir.path().join("missing").join("dir").join("pipeline.db");

        let outcome = load_data(&completed_batch(), &db, "transactions");

        assert!(matches!(outcome, LoadOutcome::Failed { .. }));
        assert!(!db.exists());
    }

    #[traced_test]
    #[test]
    fn test_load_failure_is_logged() {
        let temp_dir = TempDir::new().unwrap();
        let db = temp_dir.path().join("missing").join("pipeline.db");

        let outcome = load_data(&completed_batch(), &db, "transactions");

        assert!(!outcome.is_loaded());
        assert!(logs_contain("[Load] Load failed"));
        assert!(!logs_contain("[Load] Data loaded to database."));
    }

    #[test]
    fn test_identifiers_are_quoted() {
        let temp_dir = TempDir::new().unwrap();
        let db = temp_dir.path().join("pipeline.db");
        let batch = RecordBatch::new(
            vec![Column::new("order \"id\"", ColumnType::Text)],
            vec![Record::from_pairs([("order \"id\"", json!("x-1"))])],
        );

        assert!(load_data(&batch, &db, "daily transactions").is_loaded());
        assert_eq!(
            column_info(&db, "daily transactions"),
            vec![("order \"id\"".to_string(), "TEXT".to_string())]
        );
    }

    #[test]
    fn test_sql_value_conversion() {
        assert_eq!(to_sql_value(&Value::Null, ColumnType::Text), SqlValue::Null);
        assert_eq!(
            to_sql_value(&json!(3), ColumnType::Integer),
            SqlValue::Integer(3)
        );
        assert_eq!(to_sql_value(&json!(3), ColumnType::Real), SqlValue::Real(3.0));
        assert_eq!(
            to_sql_value(&json!("Completed"), ColumnType::Text),
            SqlValue::Text("Completed".to_string())
        );
    }
}
