use std::collections::BTreeSet;

use super::model::{Table, Value};

// ---------------------------------------------------------------------------
// Predicates over a single column
// ---------------------------------------------------------------------------

/// A boolean condition over one column of a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Numeric value within `[lo, hi]`, both ends inclusive. Nulls and
    /// non-numeric cells never match.
    Range { column: String, lo: f64, hi: f64 },
    /// Value is one of the selected values. An empty selection means
    /// "no constraint on this column".
    OneOf {
        column: String,
        values: BTreeSet<Value>,
    },
    /// Value equals exactly.
    Equals { column: String, value: Value },
}

impl Predicate {
    pub fn range(column: &str, lo: f64, hi: f64) -> Self {
        Predicate::Range {
            column: column.to_string(),
            lo,
            hi,
        }
    }

    pub fn one_of(column: &str, values: impl IntoIterator<Item = Value>) -> Self {
        Predicate::OneOf {
            column: column.to_string(),
            values: values.into_iter().collect(),
        }
    }

    pub fn equals(column: &str, value: impl Into<Value>) -> Self {
        Predicate::Equals {
            column: column.to_string(),
            value: value.into(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Predicate::Range { column, .. }
            | Predicate::OneOf { column, .. }
            | Predicate::Equals { column, .. } => column,
        }
    }

    /// An inactive predicate accepts every row.
    pub fn is_active(&self) -> bool {
        !matches!(self, Predicate::OneOf { values, .. } if values.is_empty())
    }

    /// Whether the row at `row` of `table` satisfies the predicate.
    /// A column missing from the table only satisfies inactive predicates.
    pub fn matches(&self, table: &Table, row: usize) -> bool {
        if !self.is_active() {
            return true;
        }
        let Some(value) = table.get(row, self.column()) else {
            return false;
        };
        match self {
            Predicate::Range { lo, hi, .. } => value
                .as_f64()
                .is_some_and(|v| *lo <= v && v <= *hi),
            Predicate::OneOf { values, .. } => values.contains(value),
            Predicate::Equals { value: expected, .. } => value == expected,
        }
    }
}

// ---------------------------------------------------------------------------
// Conjunction of predicates
// ---------------------------------------------------------------------------

/// A row passes a [`FilterSet`] when it passes every predicate in it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    predicates: Vec<Predicate>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Both sets combined.
    pub fn and(mut self, other: FilterSet) -> Self {
        self.predicates.extend(other.predicates);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches(&self, table: &Table, row: usize) -> bool {
        self.predicates.iter().all(|p| p.matches(table, row))
    }
}

impl From<Predicate> for FilterSet {
    fn from(predicate: Predicate) -> Self {
        FilterSet::new().with(predicate)
    }
}

/// Return indices of rows that pass all active predicates.
pub fn filtered_indices(table: &Table, filters: &FilterSet) -> Vec<usize> {
    (0..table.len())
        .filter(|&row| filters.matches(table, row))
        .collect()
}

/// The rows of `table` that pass `filters`, as a new table.
pub fn apply(table: &Table, filters: &FilterSet) -> Table {
    table.select_rows(&filtered_indices(table, filters))
}
