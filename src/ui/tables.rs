use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::aggregate::PivotTable;
use crate::data::model::{Table, Value};

const ROW_HEIGHT: f32 = 18.0;

/// Cell text: whole floats without decimals, other floats with two.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Float(v) if v.fract() == 0.0 => format!("{v:.0}"),
        Value::Float(v) => format!("{v:.2}"),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Data table
// ---------------------------------------------------------------------------

/// Render a table with a sticky header and virtual scrolling.
pub fn data_table(ui: &mut Ui, id: &str, table: &Table, max_height: f32) {
    let names: Vec<&str> = table.column_names().collect();
    if names.is_empty() {
        return;
    }
    ui.push_id(id, |ui: &mut Ui| {
        egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .max_scroll_height(max_height)
                .columns(Column::auto().at_least(60.0), names.len())
                .header(ROW_HEIGHT + 2.0, |mut header| {
                    for name in &names {
                        header.col(|ui: &mut Ui| {
                            ui.strong(*name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(ROW_HEIGHT, table.len(), |mut row| {
                        let cells = &table.rows()[row.index()];
                        for cell in cells {
                            row.col(|ui: &mut Ui| {
                                ui.label(cell_text(cell));
                            });
                        }
                    });
                });
        });
    });
}

// ---------------------------------------------------------------------------
// Pivot table
// ---------------------------------------------------------------------------

/// Render a pivot; missing combinations are left blank.
pub fn pivot_table(ui: &mut Ui, id: &str, pivot: &PivotTable) {
    if pivot.is_empty() {
        return;
    }
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .columns(Column::auto().at_least(90.0), pivot.columns.len() + 1)
            .header(ROW_HEIGHT + 2.0, |mut header| {
                header.col(|ui: &mut Ui| {
                    ui.strong(format!("{} \\ {}", pivot.row_key, pivot.column_key));
                });
                for column in &pivot.columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(column.to_string());
                    });
                }
            })
            .body(|mut body| {
                for (label, cells) in pivot.rows.iter().zip(&pivot.cells) {
                    body.row(ROW_HEIGHT, |mut row| {
                        row.col(|ui: &mut Ui| {
                            ui.strong(label.to_string());
                        });
                        for cell in cells {
                            row.col(|ui: &mut Ui| {
                                if let Some(v) = cell {
                                    ui.label(format!("{v:.0}"));
                                }
                            });
                        }
                    });
                }
            });
    });
}
