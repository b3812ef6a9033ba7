use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::datatypes::DataType as ArrowType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Row, Table, Value};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Fichier '{}' non trouvé. Assurez-vous qu'il est dans le même dossier.", .0.display())]
    NotFound(PathBuf),
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("malformed data in {}: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound(_))
    }

    fn malformed(path: &Path, err: anyhow::Error) -> Self {
        LoadError::Malformed {
            path: path.to_path_buf(),
            message: format!("{err:#}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, comma separated, UTF-8 (the default for any
///   other extension)
/// * `.json`    – `[{ "work_year": 2023, "job_title": "...", ... }, ...]`
/// * `.parquet` – flat columns of strings, integers, floats or booleans
pub fn load_file(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        _ => load_csv(path)?,
    };
    log::debug!(
        "parsed {} rows x {} columns from {}",
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per line.
/// Column types are inferred per column: a column is numeric only when every
/// non-missing cell parses as a number, otherwise all its cells stay text.
/// Empty cells and the markers in
/// [`NA_MARKERS`](super::model::NA_MARKERS) are missing in every column.
fn load_csv(path: &Path) -> Result<Table> {
    let reader = csv::Reader::from_path(path)?;
    read_csv(reader)
}

/// Parse CSV from any reader. Split out so tables can be built from strings.
pub fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Table> {
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut raw: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result?;
        raw.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    // Decide per column whether it is numeric before converting any cell.
    let numeric: Vec<bool> = (0..headers.len())
        .map(|col| {
            raw.iter().all(|row| {
                let cell = row.get(col).map(String::as_str).unwrap_or("");
                Value::is_missing_marker(cell) || cell.trim().parse::<f64>().is_ok()
            })
        })
        .collect();

    let rows: Vec<Row> = raw
        .into_iter()
        .map(|row| {
            row.into_iter()
                .enumerate()
                .map(|(col, cell)| {
                    if numeric.get(col).copied().unwrap_or(false) {
                        Value::parse(&cell)
                    } else if Value::is_missing_marker(&cell) {
                        Value::Null
                    } else {
                        Value::String(cell)
                    }
                })
                .collect()
        })
        .collect();

    Ok(Table::from_rows(headers, rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "work_year": 2023, "experience_level": "SE", "salary_in_usd": 85847 },
///   ...
/// ]
/// ```
///
/// Column order follows the keys of the first record; keys first seen later
/// are appended.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root: JsonValue = serde_json::from_str(&text)?;
    json_records_to_table(&root).map_err(|e| LoadError::malformed(path, e))
}

fn json_records_to_table(root: &JsonValue) -> anyhow::Result<Table> {
    let records = root.as_array().context("expected top-level JSON array")?;

    let mut names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            names
                .iter()
                .map(|name| obj.get(name).map(json_to_value).unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    Ok(Table::from_rows(names, rows))
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`), and with the output of
/// `generate-sample --parquet`.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows: Vec<Row> = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(|e| LoadError::malformed(path, e.into()))?;
        let offset = rows.len();
        rows.extend((0..batch.num_rows()).map(|_| Vec::with_capacity(names.len())));

        for col_idx in 0..batch.num_columns() {
            let column = batch.column(col_idx);
            for row in 0..batch.num_rows() {
                let value = extract_value(column, row)
                    .with_context(|| format!("row {row}, column '{}'", names[col_idx]))
                    .map_err(|e| LoadError::malformed(path, e))?;
                rows[offset + row].push(value);
            }
        }
    }

    Ok(Table::from_rows(names, rows))
}

// -- Arrow helpers --

fn downcast<T: 'static>(col: &Arc<dyn Array>) -> anyhow::Result<&T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array type {:?}", col.data_type()))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> anyhow::Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match col.data_type() {
        ArrowType::Utf8 => Value::String(downcast::<StringArray>(col)?.value(row).to_string()),
        ArrowType::LargeUtf8 => {
            Value::String(downcast::<LargeStringArray>(col)?.value(row).to_string())
        }
        ArrowType::Int32 => Value::Integer(downcast::<Int32Array>(col)?.value(row) as i64),
        ArrowType::Int64 => Value::Integer(downcast::<Int64Array>(col)?.value(row)),
        ArrowType::Float32 => Value::Float(downcast::<Float32Array>(col)?.value(row) as f64),
        ArrowType::Float64 => Value::Float(downcast::<Float64Array>(col)?.value(row)),
        ArrowType::Boolean => Value::Bool(downcast::<BooleanArray>(col)?.value(row)),
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::data::model::DataType;

    const SAMPLE: &str = "\
work_year,experience_level,employment_type,job_title,salary,salary_currency,salary_in_usd,employee_residence,remote_ratio,company_location,company_size
2023,SE,FT,Principal Data Scientist,80000,EUR,85847,ES,100,ES,L
2023,MI,CT,ML Engineer,30000,USD,30000,US,100,US,S
2022,EN,FT,Data Scientist,,USD,25500,FR,0,FR,M
";

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn loads_csv_preserving_columns_and_types() {
        let file = write_temp(".csv", SAMPLE);
        let table = load_file(file.path()).expect("load");

        assert_eq!(table.len(), 3);
        let names: Vec<&str> = table.column_names().collect();
        assert_eq!(names[0], "work_year");
        assert_eq!(names[10], "company_size");
        assert_eq!(table.dtype("work_year"), Some(DataType::Integer));
        assert_eq!(table.dtype("salary_in_usd"), Some(DataType::Integer));
        assert_eq!(table.dtype("remote_ratio"), Some(DataType::Integer));
        assert_eq!(table.dtype("job_title"), Some(DataType::Text));
        assert_eq!(table.get(2, "salary"), Some(&Value::Null));
        assert_eq!(table.get(0, "experience_level"), Some(&Value::from("SE")));
    }

    #[test]
    fn numeric_looking_cells_in_text_columns_stay_text() {
        let reader = csv::Reader::from_reader("code\n42\nabc\n".as_bytes());
        let table = read_csv(reader).expect("parse");
        assert_eq!(table.dtype("code"), Some(DataType::Text));
        assert_eq!(table.get(0, "code"), Some(&Value::from("42")));
    }

    #[test]
    fn missing_value_markers_keep_columns_numeric() {
        let reader = csv::Reader::from_reader(
            "work_year,salary_in_usd,job_title\n2023, 100 ,NA\n2023,NA,Data Analyst\n2022,300,null\n"
                .as_bytes(),
        );
        let table = read_csv(reader).expect("parse");
        assert_eq!(table.dtype("salary_in_usd"), Some(DataType::Integer));
        assert_eq!(table.get(0, "salary_in_usd"), Some(&Value::Integer(100)));
        assert_eq!(table.get(1, "salary_in_usd"), Some(&Value::Null));
        assert_eq!(table.get(2, "job_title"), Some(&Value::Null));
        assert_eq!(crate::data::aggregate::mean(&table, "salary_in_usd"), Some(200.0));
        assert_eq!(crate::data::aggregate::null_count(&table), 3);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("dir");
        let err = load_file(&dir.path().join("ds_salaries.csv")).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("non trouvé"));
    }

    #[test]
    fn loads_json_records() {
        let file = write_temp(
            ".json",
            r#"[{"work_year": 2023, "job_title": "Data Analyst", "salary_in_usd": 1000.5},
                {"work_year": 2022, "job_title": "Data Engineer", "salary_in_usd": null}]"#,
        );
        let table = load_file(file.path()).expect("load");
        assert_eq!(table.len(), 2);
        assert_eq!(table.dtype("salary_in_usd"), Some(DataType::Float));
        assert_eq!(table.get(1, "salary_in_usd"), Some(&Value::Null));
        assert_eq!(table.get(0, "job_title"), Some(&Value::from("Data Analyst")));
    }

    #[test]
    fn json_must_be_an_array() {
        let file = write_temp(".json", r#"{"work_year": 2023}"#);
        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }
}
