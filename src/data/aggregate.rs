use std::collections::{BTreeMap, BTreeSet, HashMap};

use statrs::statistics::Statistics;

use super::filter::{FilterSet, Predicate, apply};
use super::model::{Row, Table, Value};

// ---------------------------------------------------------------------------
// Scalar summaries
// ---------------------------------------------------------------------------

/// Mean of the non-null numeric cells of `column`, `None` when there are none.
pub fn mean(table: &Table, column: &str) -> Option<f64> {
    let values = table.numeric_values(column);
    if values.is_empty() {
        return None;
    }
    Some(values.iter().mean())
}

/// Mean of `column` over the rows satisfying `predicate`.
pub fn mean_where(table: &Table, column: &str, predicate: &Predicate) -> Option<f64> {
    mean(&apply(table, &FilterSet::from(predicate.clone())), column)
}

/// Number of null cells summed over every column.
pub fn null_count(table: &Table) -> usize {
    table
        .rows()
        .iter()
        .map(|row| row.iter().filter(|v| v.is_null()).count())
        .sum()
}

/// Round to zero decimals, ties to even.
pub fn round0(v: f64) -> f64 {
    v.round_ties_even()
}

/// Linear-interpolation quantile of already sorted values.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = (n - 1) as f64 * q;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        }
    }
}

pub const DESCRIBE_ROWS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Summary statistics of every numeric column: one row per statistic, one
/// column per numeric column, led by a `statistic` label column.
pub fn describe(table: &Table) -> Table {
    let numeric = table.numeric_columns();
    let stats: Vec<[f64; 8]> = numeric
        .iter()
        .map(|name| {
            let mut values = table.numeric_values(name);
            values.sort_by(f64::total_cmp);
            if values.is_empty() {
                let mut empty = [f64::NAN; 8];
                empty[0] = 0.0;
                return empty;
            }
            [
                values.len() as f64,
                values.iter().mean(),
                values.iter().std_dev(),
                values[0],
                quantile(&values, 0.25),
                quantile(&values, 0.5),
                quantile(&values, 0.75),
                values[values.len() - 1],
            ]
        })
        .collect();

    let rows = DESCRIBE_ROWS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            std::iter::once(Value::from(*label))
                .chain(stats.iter().map(|s| Value::from(s[i])))
                .collect()
        })
        .collect();

    let mut names = vec!["statistic".to_string()];
    names.extend(numeric);
    Table::from_rows(names, rows)
}

// ---------------------------------------------------------------------------
// Grouped aggregation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Mean,
    Median,
}

impl Aggregation {
    fn apply(self, mut values: Vec<f64>) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(match self {
            Aggregation::Mean => values.iter().mean(),
            Aggregation::Median => {
                values.sort_by(f64::total_cmp);
                quantile(&values, 0.5)
            }
        })
    }
}

/// Aggregate `value` per distinct combination of `keys`.
///
/// The result has the key columns followed by a column named `value`, one row
/// per group in ascending key order. Rows with a null key are dropped; a group
/// without any numeric value aggregates to null.
pub fn group_aggregate(table: &Table, keys: &[&str], value: &str, agg: Aggregation) -> Table {
    let mut names: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    names.push(value.to_string());

    let key_idx: Option<Vec<usize>> = keys.iter().map(|k| table.column_index(k)).collect();
    let (Some(key_idx), Some(value_idx)) = (key_idx, table.column_index(value)) else {
        log::warn!("group by {keys:?} on '{value}': column not found");
        return Table::from_rows(names, Vec::new());
    };

    let mut groups: BTreeMap<Vec<Value>, Vec<f64>> = BTreeMap::new();
    for row in table.rows() {
        let key: Vec<Value> = key_idx.iter().map(|&i| row[i].clone()).collect();
        if key.iter().any(Value::is_null) {
            continue;
        }
        let bucket = groups.entry(key).or_default();
        if let Some(v) = row[value_idx].as_f64() {
            bucket.push(v);
        }
    }

    let rows: Vec<Row> = groups
        .into_iter()
        .map(|(mut key, values)| {
            key.push(Value::from(agg.apply(values)));
            key
        })
        .collect();
    Table::from_rows(names, rows)
}

/// Frequency of every non-null value of `column`, most frequent first.
/// Values with equal counts keep the order in which they were first seen.
pub fn value_counts(table: &Table, column: &str) -> Vec<(Value, usize)> {
    let mut counts: Vec<(Value, usize)> = Vec::new();
    let mut position: HashMap<&Value, usize> = HashMap::new();
    for v in table.values(column).filter(|v| !v.is_null()) {
        match position.get(v) {
            Some(&i) => counts[i].1 += 1,
            None => {
                position.insert(v, counts.len());
                counts.push((v.clone(), 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// The `n` most frequent values of `column`.
pub fn top_values(table: &Table, column: &str, n: usize) -> Vec<Value> {
    value_counts(table, column)
        .into_iter()
        .take(n)
        .map(|(v, _)| v)
        .collect()
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Square matrix of Pearson coefficients keyed by column name on both axes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }
}

/// Pearson coefficient over the rows where both columns are numeric.
/// NaN with fewer than two such rows or a constant column.
fn pearson(table: &Table, a: usize, b: usize) -> f64 {
    let (xs, ys): (Vec<f64>, Vec<f64>) = table
        .rows()
        .iter()
        .filter_map(|row| Some((row[a].as_f64()?, row[b].as_f64()?)))
        .unzip();
    if xs.len() < 2 {
        return f64::NAN;
    }
    let sx = xs.iter().std_dev();
    let sy = ys.iter().std_dev();
    if sx == 0.0 || sy == 0.0 {
        return f64::NAN;
    }
    let r = xs.iter().covariance(ys.iter()) / (sx * sy);
    r.clamp(-1.0, 1.0)
}

/// Pairwise Pearson correlation of every numeric column.
pub fn correlation_matrix(table: &Table) -> CorrelationMatrix {
    let columns = table.numeric_columns();
    let idx: Vec<usize> = columns
        .iter()
        .filter_map(|c| table.column_index(c))
        .collect();

    let n = columns.len();
    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(table, idx[i], idx[j]);
            let r = if i == j && !r.is_nan() { 1.0 } else { r };
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    CorrelationMatrix { columns, values }
}

// ---------------------------------------------------------------------------
// Pivot
// ---------------------------------------------------------------------------

/// Mean of a value per (row key, column key). Combinations absent from the
/// data are `None`, never zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotTable {
    pub row_key: String,
    pub column_key: String,
    pub rows: Vec<Value>,
    pub columns: Vec<Value>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl PivotTable {
    pub fn get(&self, row: &Value, column: &Value) -> Option<f64> {
        let i = self.rows.iter().position(|r| r == row)?;
        let j = self.columns.iter().position(|c| c == column)?;
        self.cells[i][j]
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Mean of `value` for every (`row_key`, `column_key`) pair present in the
/// table, rounded to zero decimals. Keys are sorted ascending on both axes.
pub fn pivot_mean(table: &Table, value: &str, row_key: &str, column_key: &str) -> PivotTable {
    let mut pivot = PivotTable {
        row_key: row_key.to_string(),
        column_key: column_key.to_string(),
        ..PivotTable::default()
    };
    let (Some(r), Some(c), Some(v)) = (
        table.column_index(row_key),
        table.column_index(column_key),
        table.column_index(value),
    ) else {
        return pivot;
    };

    let mut sums: BTreeMap<(Value, Value), Vec<f64>> = BTreeMap::new();
    for row in table.rows() {
        if row[r].is_null() || row[c].is_null() {
            continue;
        }
        if let Some(x) = row[v].as_f64() {
            sums.entry((row[r].clone(), row[c].clone()))
                .or_default()
                .push(x);
        }
    }

    let rows: BTreeSet<Value> = sums.keys().map(|(r, _)| r.clone()).collect();
    let columns: BTreeSet<Value> = sums.keys().map(|(_, c)| c.clone()).collect();
    pivot.cells = rows
        .iter()
        .map(|r| {
            columns
                .iter()
                .map(|c| {
                    sums.get(&(r.clone(), c.clone()))
                        .map(|xs| round0(xs.iter().mean()))
                })
                .collect()
        })
        .collect();
    pivot.rows = rows.into_iter().collect();
    pivot.columns = columns.into_iter().collect();
    pivot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::salary_table;
    use crate::data::recode::{FULLY_REMOTE, recode};

    fn salaries_only(values: &[f64]) -> Table {
        Table::from_rows(
            vec!["salary_in_usd".into()],
            values.iter().map(|v| vec![Value::Float(*v)]).collect(),
        )
    }

    #[test]
    fn mean_of_three_salaries() {
        let table = salaries_only(&[100.0, 200.0, 300.0]);
        assert_eq!(mean(&table, "salary_in_usd"), Some(200.0));
    }

    #[test]
    fn mean_of_nothing_is_none() {
        assert_eq!(mean(&salaries_only(&[]), "salary_in_usd"), None);
        assert_eq!(mean(&salaries_only(&[1.0]), "missing"), None);
    }

    #[test]
    fn mean_over_fully_remote_rows() {
        let table = recode(&salary_table(&[
            (2023, "SE", "FT", "A", 100, "M", 100.0),
            (2023, "SE", "FT", "A", 0, "M", 300.0),
        ]));
        let remote = mean_where(
            &table,
            "salary_in_usd",
            &Predicate::equals("remote_ratio", FULLY_REMOTE),
        );
        assert_eq!(remote, Some(100.0));
    }

    #[test]
    fn counts_nulls_across_columns() {
        let table = Table::from_rows(
            vec!["a".into(), "b".into()],
            vec![
                vec![Value::Null, Value::Integer(1)],
                vec![Value::Null, Value::Null],
                vec![Value::Integer(2), Value::Integer(3)],
            ],
        );
        assert_eq!(null_count(&table), 3);
        assert_eq!(null_count(&Table::empty()), 0);
    }

    #[test]
    fn rounds_half_to_even() {
        assert_eq!(round0(2.5), 2.0);
        assert_eq!(round0(3.5), 4.0);
        assert_eq!(round0(66666.67), 66667.0);
    }

    #[test]
    fn describe_numeric_columns() {
        let table = salary_table(&[
            (2020, "SE", "FT", "A", 0, "M", 10.0),
            (2021, "SE", "FT", "A", 0, "M", 20.0),
            (2022, "SE", "FT", "A", 0, "M", 30.0),
            (2023, "SE", "FT", "A", 0, "M", 40.0),
        ]);
        let summary = describe(&table);
        assert_eq!(
            summary.column_names().collect::<Vec<_>>(),
            vec!["statistic", "work_year", "remote_ratio", "salary_in_usd"]
        );
        let stat = |row: usize| summary.get(row, "salary_in_usd").and_then(Value::as_f64);
        assert_eq!(stat(0), Some(4.0));
        assert_eq!(stat(1), Some(25.0));
        assert!((stat(2).unwrap_or_default() - 12.909944).abs() < 1e-6);
        assert_eq!(stat(3), Some(10.0));
        assert_eq!(stat(4), Some(17.5));
        assert_eq!(stat(5), Some(25.0));
        assert_eq!(stat(6), Some(32.5));
        assert_eq!(stat(7), Some(40.0));
    }

    #[test]
    fn group_mean_sorted_descending() {
        let table = salary_table(&[
            (2023, "EN", "FT", "A", 0, "M", 50.0),
            (2023, "EN", "FT", "A", 0, "M", 70.0),
            (2023, "SE", "FT", "A", 0, "M", 100.0),
        ]);
        let grouped = group_aggregate(&table, &["experience_level"], "salary_in_usd", Aggregation::Mean);
        let sorted = grouped.sort_desc("salary_in_usd");
        let pairs: Vec<(String, f64)> = sorted
            .rows()
            .iter()
            .map(|r| (r[0].to_string(), r[1].as_f64().unwrap_or(f64::NAN)))
            .collect();
        assert_eq!(pairs, vec![("SE".to_string(), 100.0), ("EN".to_string(), 60.0)]);
    }

    #[test]
    fn group_median_by_two_keys_in_key_order() {
        let table = salary_table(&[
            (2023, "SE", "FT", "A", 0, "L", 100.0),
            (2023, "SE", "FT", "A", 0, "L", 300.0),
            (2023, "EN", "FT", "A", 0, "S", 10.0),
            (2023, "SE", "FT", "A", 0, "S", 50.0),
            (2023, "EN", "FT", "A", 0, "S", 20.0),
            (2023, "EN", "FT", "A", 0, "S", 90.0),
        ]);
        let grouped = group_aggregate(
            &table,
            &["experience_level", "company_size"],
            "salary_in_usd",
            Aggregation::Median,
        );
        let rows: Vec<Vec<Value>> = grouped.rows().to_vec();
        assert_eq!(
            rows,
            vec![
                vec!["EN".into(), "S".into(), Value::Float(20.0)],
                vec!["SE".into(), "L".into(), Value::Float(200.0)],
                vec!["SE".into(), "S".into(), Value::Float(50.0)],
            ]
        );
    }

    #[test]
    fn grouping_an_empty_table_is_empty() {
        let table = salary_table(&[]);
        let grouped = group_aggregate(&table, &["experience_level"], "salary_in_usd", Aggregation::Mean);
        assert!(grouped.is_empty());
        assert!(pivot_mean(&table, "salary_in_usd", "experience_level", "remote_ratio").is_empty());
        assert!(value_counts(&table, "job_title").is_empty());
    }

    #[test]
    fn value_counts_break_ties_by_first_appearance() {
        let table = salary_table(&[
            (2023, "SE", "FT", "B", 0, "M", 1.0),
            (2023, "SE", "FT", "A", 0, "M", 1.0),
            (2023, "SE", "FT", "C", 0, "M", 1.0),
            (2023, "SE", "FT", "C", 0, "M", 1.0),
            (2023, "SE", "FT", "A", 0, "M", 1.0),
            (2023, "SE", "FT", "B", 0, "M", 1.0),
            (2023, "SE", "FT", "D", 0, "M", 1.0),
        ]);
        assert_eq!(
            value_counts(&table, "job_title"),
            vec![
                (Value::from("B"), 2),
                (Value::from("A"), 2),
                (Value::from("C"), 2),
                (Value::from("D"), 1),
            ]
        );
        assert_eq!(
            top_values(&table, "job_title", 2),
            vec![Value::from("B"), Value::from("A")]
        );
    }

    #[test]
    fn correlation_is_symmetric_with_unit_diagonal() {
        let table = Table::from_rows(
            vec!["x".into(), "y".into(), "z".into(), "label".into()],
            vec![
                vec![Value::Float(1.0), Value::Float(2.0), Value::Float(9.0), "a".into()],
                vec![Value::Float(2.0), Value::Float(4.1), Value::Float(7.0), "b".into()],
                vec![Value::Float(3.0), Value::Float(6.2), Value::Float(8.0), "c".into()],
                vec![Value::Float(4.0), Value::Float(7.9), Value::Float(1.0), "d".into()],
            ],
        );
        let corr = correlation_matrix(&table);
        assert_eq!(corr.columns, vec!["x", "y", "z"]);
        for i in 0..3 {
            assert_eq!(corr.values[i][i], 1.0);
            for j in 0..3 {
                assert_eq!(corr.values[i][j], corr.values[j][i]);
                assert!(corr.values[i][j].abs() <= 1.0);
            }
        }
        assert!(corr.get("x", "y").is_some_and(|r| r > 0.99));
        assert!(corr.get("x", "z").is_some_and(|r| r < 0.0));
    }

    #[test]
    fn perfectly_anticorrelated_columns() {
        let table = Table::from_rows(
            vec!["a".into(), "b".into()],
            (0..5)
                .map(|i| vec![Value::Integer(i), Value::Integer(10 - 2 * i)])
                .collect(),
        );
        let r = correlation_matrix(&table).get("a", "b").unwrap_or_default();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pivot_cells_are_means_of_matching_rows_and_absent_is_none() {
        let table = recode(&salary_table(&[
            (2023, "SE", "FT", "A", 100, "M", 100.0),
            (2023, "SE", "FT", "A", 100, "M", 201.0),
            (2023, "SE", "FT", "A", 0, "M", 50.0),
            (2023, "EN", "FT", "A", 0, "M", 10.0),
        ]));
        let pivot = pivot_mean(&table, "salary_in_usd", "experience_level", "remote_ratio");
        assert_eq!(pivot.rows, vec![Value::from("Débutant"), Value::from("Senior")]);
        assert_eq!(
            pivot.columns,
            vec![Value::from("Présentiel"), Value::from(FULLY_REMOTE)]
        );
        // 150.5 rounds to the even neighbour
        assert_eq!(
            pivot.get(&Value::from("Senior"), &Value::from(FULLY_REMOTE)),
            Some(150.0)
        );
        assert_eq!(
            pivot.get(&Value::from("Senior"), &Value::from("Présentiel")),
            Some(50.0)
        );
        assert_eq!(
            pivot.get(&Value::from("Débutant"), &Value::from(FULLY_REMOTE)),
            None
        );
        assert_eq!(pivot.cells, vec![vec![Some(10.0), None], vec![Some(50.0), Some(150.0)]]);
    }
}
