use std::collections::BTreeMap;

use crate::data::aggregate::CorrelationMatrix;
use crate::data::model::{Table, Value};

/// How a chart is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Distribution of `y` per `x` category, every point shown.
    Box,
    /// One bar per `x` category.
    Bar,
    /// Bars per `x` category, one bar per `color` group side by side.
    GroupedBar,
    /// One line per `color` group over a numeric `x`.
    Line,
    /// Jittered points of `y` per `x` category.
    Strip,
    /// `color` holds the cell value of the (`x`, `y`) grid.
    Heatmap,
}

/// Everything a renderer needs to draw one chart: the data and which of its
/// columns go where.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x: String,
    pub y: String,
    pub color: Option<String>,
    /// Display names by column name.
    pub labels: BTreeMap<String, String>,
    pub data: Table,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: impl Into<String>, x: &str, y: &str, data: Table) -> Self {
        Self {
            kind,
            title: title.into(),
            x: x.to_string(),
            y: y.to_string(),
            color: None,
            labels: BTreeMap::new(),
            data,
        }
    }

    pub fn color(mut self, column: &str) -> Self {
        self.color = Some(column.to_string());
        self
    }

    pub fn label(mut self, column: &str, text: &str) -> Self {
        self.labels.insert(column.to_string(), text.to_string());
        self
    }

    /// Display name of a column, falling back to the column name.
    pub fn label_for<'a>(&'a self, column: &'a str) -> &'a str {
        self.labels.get(column).map(String::as_str).unwrap_or(column)
    }

    pub fn x_label(&self) -> &str {
        self.label_for(&self.x)
    }

    pub fn y_label(&self) -> &str {
        self.label_for(&self.y)
    }

    /// Long-form heatmap of a correlation matrix: one row per cell.
    pub fn heatmap(title: impl Into<String>, matrix: &CorrelationMatrix) -> Self {
        let rows = matrix
            .columns
            .iter()
            .enumerate()
            .flat_map(|(i, a)| {
                matrix.columns.iter().enumerate().map(move |(j, b)| {
                    vec![
                        Value::from(a.as_str()),
                        Value::from(b.as_str()),
                        Value::from(matrix.values[i][j]),
                    ]
                })
            })
            .collect();
        let data = Table::from_rows(
            vec!["variable_x".into(), "variable_y".into(), "correlation".into()],
            rows,
        );
        ChartSpec::new(ChartKind::Heatmap, title, "variable_x", "variable_y", data).color("correlation")
    }

    /// Distinct values of the `x` column in data order.
    pub fn categories(&self) -> Vec<Value> {
        self.data.unique_values(&self.x)
    }

    /// Distinct values of the `color` column in data order.
    pub fn groups(&self) -> Vec<Value> {
        self.color
            .as_deref()
            .map(|c| self.data.unique_values(c))
            .unwrap_or_default()
    }
}
