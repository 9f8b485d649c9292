use crate::domain::model::{Column, ColumnType, Record, RecordBatch};
use crate::utils::error::{EtlError, Result};
use csv::{ReaderBuilder, StringRecord};
use serde_json::{Number, Value};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Cell contents read as missing values.
pub const DEFAULT_NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub delimiter: u8,
    pub na_values: Vec<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            na_values: DEFAULT_NA_VALUES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Reads the whole file into a batch.
///
/// Never fails: a missing, unreadable or malformed file is logged and yields
/// an empty batch so the rest of the run can proceed.
pub fn extract_data(path: &Path, options: &ExtractOptions) -> RecordBatch {
    match read_csv_file(path, options) {
        Ok(batch) => {
            tracing::info!(
                "[Extract] Data successfully extracted from {}",
                path.display()
            );
            tracing::debug!(
                "[Extract] {} rows, columns: {:?}",
                batch.num_rows(),
                batch.column_names()
            );
            batch
        }
        Err(e) => {
            tracing::error!(
                "[Extract] Failed to extract data from {}: {}",
                path.display(),
                e
            );
            RecordBatch::empty()
        }
    }
}

pub fn read_csv_file(path: &Path, options: &ExtractOptions) -> Result<RecordBatch> {
    let file = File::open(path)?;
    parse_csv(file, options)
}

pub fn parse_csv<R: Read>(reader: R, options: &ExtractOptions) -> Result<RecordBatch> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header = rdr.headers()?.clone();
    if header.is_empty() {
        return Err(EtlError::ProcessingError {
            message: "No columns to parse from file".to_string(),
        });
    }

    let names = column_names(&header);
    let na_values: HashSet<&str> = options.na_values.iter().map(String::as_str).collect();

    let mut cells: Vec<Vec<Option<String>>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.len() > names.len() {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(EtlError::ProcessingError {
                message: format!(
                    "Expected {} fields in line {}, saw {}",
                    names.len(),
                    line,
                    record.len()
                ),
            });
        }

        // Short rows are padded with missing values.
        let row = (0..names.len())
            .map(|i| {
                record
                    .get(i)
                    .filter(|field| !na_values.contains(field))
                    .map(str::to_string)
            })
            .collect();
        cells.push(row);
    }

    let columns: Vec<Column> = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let dtype = infer_column_type(cells.iter().filter_map(|row| row[i].as_deref()));
            Column::new(name, dtype)
        })
        .collect();

    let records = cells
        .into_iter()
        .map(|row| Record {
            data: columns
                .iter()
                .zip(row)
                .map(|(column, cell)| {
                    let value = cell.map_or(Value::Null, |c| convert_cell(&c, column.dtype));
                    (column.name.clone(), value)
                })
                .collect(),
        })
        .collect();

    Ok(RecordBatch::new(columns, records))
}

/// Blank headers become `Unnamed: <index>`; repeats get `.1`, `.2`, ... suffixes.
fn column_names(header: &StringRecord) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(header.len());

    for (index, raw) in header.iter().enumerate() {
        let base = if raw.trim().is_empty() {
            format!("Unnamed: {}", index)
        } else {
            raw.to_string()
        };

        let mut name = base.clone();
        let mut suffix = 0;
        while taken.contains(&name) {
            suffix += 1;
            name = format!("{}.{}", base, suffix);
        }

        taken.insert(name.clone());
        names.push(name);
    }

    names
}

fn parse_integer(cell: &str) -> Option<i64> {
    cell.trim().parse::<i64>().ok()
}

fn parse_real(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Picks the narrowest type every non-null cell parses as.
///
/// Nulls do not widen a column: integers with gaps stay `Integer` and load as
/// a nullable `INTEGER` column rather than being promoted to `Real`.
fn infer_column_type<'a, I>(cells: I) -> ColumnType
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = false;
    let mut all_integer = true;

    for cell in cells {
        seen = true;
        if all_integer && parse_integer(cell).is_none() {
            all_integer = false;
        }
        if parse_real(cell).is_none() {
            return ColumnType::Text;
        }
    }

    match (seen, all_integer) {
        (false, _) => ColumnType::Text,
        (true, true) => ColumnType::Integer,
        (true, false) => ColumnType::Real,
    }
}

fn convert_cell(cell: &str, dtype: ColumnType) -> Value {
    match dtype {
        ColumnType::Integer => parse_integer(cell).map_or(Value::Null, Value::from),
        ColumnType::Real => parse_real(cell)
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number),
        ColumnType::Text => Value::String(cell.to_string()),
    }
}
