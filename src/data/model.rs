use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Value – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value. Used as a key in `BTreeMap` / `BTreeSet`
/// downstream, so `Value` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

/// Cell contents read as a missing value, in addition to the empty cell.
pub const NA_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// -- Manual Eq/Ord so we can group and select by Value --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) if v.fract() == 0.0 && v.is_finite() => write!(f, "{v:.1}"),
            Value::Float(v) => write!(f, "{v:.4}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, ""),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        if v.is_nan() { Value::Null } else { Value::Float(v) }
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map(Value::from).unwrap_or(Value::Null)
    }
}

impl Value {
    /// Interpret the value as an `f64` when it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether a raw text cell spells a missing value.
    pub fn is_missing_marker(s: &str) -> bool {
        NA_MARKERS.contains(&s.trim())
    }

    /// Guess the type of a raw text cell. Empty cells and missing-value
    /// markers are null.
    pub fn parse(s: &str) -> Value {
        let s = s.trim();
        if Value::is_missing_marker(s) {
            return Value::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return Value::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return Value::from(f);
        }
        if s == "true" || s == "false" {
            return Value::Bool(s == "true");
        }
        Value::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Column – name plus inferred data type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Float,
    Boolean,
    Text,
    /// Every cell is null.
    Empty,
}

impl DataType {
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }

    /// Infer the column type from its cells: numeric only when every non-null
    /// cell is numeric, otherwise text (a mixed column is an "object" column).
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> DataType {
        let mut dtype = DataType::Empty;
        for v in values {
            let cell = match v {
                Value::Null => continue,
                Value::Integer(_) => DataType::Integer,
                Value::Float(_) => DataType::Float,
                Value::Bool(_) => DataType::Boolean,
                Value::String(_) => return DataType::Text,
            };
            dtype = match (dtype, cell) {
                (DataType::Empty, c) => c,
                (a, b) if a == b => a,
                (DataType::Integer, DataType::Float) | (DataType::Float, DataType::Integer) => {
                    DataType::Float
                }
                _ => return DataType::Text,
            };
        }
        dtype
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub dtype: DataType,
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset or a derived view of it
// ---------------------------------------------------------------------------

/// One row of a [`Table`]; cells are positional, aligned with the columns.
pub type Row = Vec<Value>;

/// An in-memory table with named, typed columns in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Row>,
    index: HashMap<String, usize>,
}

impl Table {
    /// Build a table from column names and rows, inferring column types.
    /// Short rows are padded with nulls.
    pub fn from_rows(names: Vec<String>, mut rows: Vec<Row>) -> Self {
        for row in &mut rows {
            row.resize(names.len(), Value::Null);
        }
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Column {
                dtype: DataType::infer(rows.iter().map(|r| &r[i])),
                name,
            })
            .collect();
        Self::with_columns(columns, rows)
    }

    fn with_columns(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Table {
            columns,
            rows,
            index,
        }
    }

    pub fn empty() -> Self {
        Table::default()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn dtype(&self, name: &str) -> Option<DataType> {
        self.column_index(name).map(|i| self.columns[i].dtype)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Cell at `row` in column `name`, if both exist.
    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        let col = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// All cells of a column in row order; empty when the column is missing.
    pub fn values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Value> + 'a {
        let col = self.column_index(name);
        self.rows.iter().filter_map(move |r| col.map(|c| &r[c]))
    }

    /// Non-null numeric cells of a column.
    pub fn numeric_values(&self, name: &str) -> Vec<f64> {
        self.values(name).filter_map(Value::as_f64).collect()
    }

    /// Names of the columns whose inferred type is numeric.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.dtype.is_numeric())
            .map(|c| c.name.clone())
            .collect()
    }

    /// Distinct non-null values of a column, in first-encountered order.
    pub fn unique_values(&self, name: &str) -> Vec<Value> {
        let mut seen = std::collections::HashSet::new();
        self.values(name)
            .filter(|v| !v.is_null() && seen.insert((*v).clone()))
            .cloned()
            .collect()
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> Table {
        let rows = self.rows.iter().take(n).cloned().collect();
        Table::with_columns(self.columns.clone(), rows)
    }

    /// A new table holding only the rows at `indices`, in that order.
    /// Column types are kept from the parent table.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        let rows = indices
            .iter()
            .filter_map(|&i| self.rows.get(i).cloned())
            .collect();
        Table::with_columns(self.columns.clone(), rows)
    }

    /// Rows sorted by a column, descending; ties keep their order and nulls
    /// go last.
    pub fn sort_desc(&self, name: &str) -> Table {
        let Some(col) = self.column_index(name) else {
            return self.clone();
        };
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| match (a[col].as_f64(), b[col].as_f64()) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => b[col].cmp(&a[col]),
        });
        Table::with_columns(self.columns.clone(), rows)
    }

    /// Replace every cell of one column, re-inferring its type.
    pub fn map_column(&self, name: &str, f: impl Fn(&Value) -> Value) -> Table {
        let Some(col) = self.column_index(name) else {
            return self.clone();
        };
        let rows: Vec<Row> = self
            .rows
            .iter()
            .map(|r| {
                let mut r = r.clone();
                r[col] = f(&r[col]);
                r
            })
            .collect();
        let mut columns = self.columns.clone();
        columns[col].dtype = DataType::infer(rows.iter().map(|r| &r[col]));
        Table::with_columns(columns, rows)
    }

    /// Minimum and maximum of a numeric column.
    pub fn min_max(&self, name: &str) -> Option<(f64, f64)> {
        self.values(name)
            .filter_map(Value::as_f64)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
