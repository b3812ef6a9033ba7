use std::ops::RangeInclusive;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, Vec2};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoints, PlotUi,
    Points, uniform_grid_spacer,
};

use crate::color::{ColorMap, diverging, sequential};
use crate::data::aggregate::quantile;
use crate::data::model::Value;
use crate::report::chart::{ChartKind, ChartSpec};

const PLOT_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Render any chart spec.
pub fn chart(ui: &mut Ui, spec: &ChartSpec) {
    ui.label(egui::RichText::new(&spec.title).strong());
    if spec.data.is_empty() {
        ui.label("Aucune donnée.");
        return;
    }
    match spec.kind {
        ChartKind::Box => box_chart(ui, spec),
        ChartKind::Bar => bar_chart(ui, spec),
        ChartKind::GroupedBar => grouped_bar_chart(ui, spec),
        ChartKind::Line => line_chart(ui, spec),
        ChartKind::Strip => strip_chart(ui, spec),
        ChartKind::Heatmap => heatmap(ui, spec),
    }
}

// -- Shared helpers --

/// Show a plot whose x axis names the categories at integer positions.
fn categorical_plot(
    ui: &mut Ui,
    spec: &ChartSpec,
    categories: &[Value],
    add_contents: impl FnOnce(&mut PlotUi),
) {
    let names: Vec<String> = categories.iter().map(|c| c.to_string()).collect();
    Plot::new(&spec.title)
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(spec.x_label())
        .y_axis_label(spec.y_label())
        .x_grid_spacer(uniform_grid_spacer(|_| [1.0, 5.0, 10.0]))
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            let i = mark.value.round();
            if (mark.value - i).abs() > 1e-6 || i < 0.0 {
                return String::new();
            }
            names.get(i as usize).cloned().unwrap_or_default()
        })
        .allow_scroll(false)
        .show(ui, add_contents);
}

/// (category position, y, row index) for every row with a numeric y.
fn positioned(spec: &ChartSpec, categories: &[Value]) -> Vec<(usize, f64, usize)> {
    (0..spec.data.len())
        .filter_map(|row| {
            let x = spec.data.get(row, &spec.x)?;
            let y = spec.data.get(row, &spec.y)?.as_f64()?;
            let pos = categories.iter().position(|c| c == x)?;
            Some((pos, y, row))
        })
        .collect()
}

/// Value of the colour column at `row`, or null.
fn group_of(spec: &ChartSpec, row: usize) -> Value {
    spec.color
        .as_deref()
        .and_then(|c| spec.data.get(row, c))
        .cloned()
        .unwrap_or(Value::Null)
}

/// Deterministic horizontal spread in [-0.15, 0.15] so points do not overlap.
fn jitter(row: usize) -> f64 {
    ((row.wrapping_mul(7919) % 101) as f64 / 100.0 - 0.5) * 0.3
}

// ---------------------------------------------------------------------------
// Box plot with all points
// ---------------------------------------------------------------------------

fn box_chart(ui: &mut Ui, spec: &ChartSpec) {
    let categories = spec.categories();
    let colors = ColorMap::new(&categories);
    let points = positioned(spec, &categories);

    categorical_plot(ui, spec, &categories, |plot_ui| {
        for (i, category) in categories.iter().enumerate() {
            let mut ys: Vec<f64> = points
                .iter()
                .filter(|(pos, _, _)| *pos == i)
                .map(|(_, y, _)| *y)
                .collect();
            if ys.is_empty() {
                continue;
            }
            ys.sort_by(f64::total_cmp);
            let (q1, median, q3) = (quantile(&ys, 0.25), quantile(&ys, 0.5), quantile(&ys, 0.75));
            let reach = 1.5 * (q3 - q1);
            let low = ys.iter().copied().find(|y| *y >= q1 - reach).unwrap_or(q1);
            let high = ys.iter().rev().copied().find(|y| *y <= q3 + reach).unwrap_or(q3);

            let color = colors.color_for(category);
            let name = category.to_string();
            let elem = BoxElem::new(i as f64, BoxSpread::new(low, q1, median, q3, high))
                .name(&name)
                .box_width(0.5)
                .fill(color.linear_multiply(0.25))
                .stroke(Stroke::new(1.5, color));
            plot_ui.box_plot(BoxPlot::new(vec![elem]).name(&name));

            let scatter: PlotPoints = points
                .iter()
                .filter(|(pos, _, _)| *pos == i)
                .map(|(pos, y, row)| [*pos as f64 + 0.35 + jitter(*row) * 0.3, *y])
                .collect();
            plot_ui.points(Points::new(scatter).name(&name).color(color).radius(2.0));
        }
    });
}

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

/// One bar per category, coloured by its value.
fn bar_chart(ui: &mut Ui, spec: &ChartSpec) {
    let categories = spec.categories();
    let points = positioned(spec, &categories);
    let (lo, hi) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, y, _)| (lo.min(*y), hi.max(*y)));
    let span = if hi > lo { hi - lo } else { 1.0 };

    let bars: Vec<Bar> = points
        .iter()
        .map(|(pos, y, _)| {
            Bar::new(*pos as f64, *y)
                .width(0.7)
                .name(categories[*pos].to_string())
                .fill(sequential((y - lo) / span))
        })
        .collect();

    categorical_plot(ui, spec, &categories, |plot_ui| {
        plot_ui.bar_chart(BarChart::new(bars).name(spec.y_label()));
    });
}

/// Bars per category, one side-by-side bar per colour group.
fn grouped_bar_chart(ui: &mut Ui, spec: &ChartSpec) {
    let categories = spec.categories();
    let groups = spec.groups();
    let colors = ColorMap::new(&groups);
    let points = positioned(spec, &categories);
    let width = 0.8 / groups.len().max(1) as f64;

    categorical_plot(ui, spec, &categories, |plot_ui| {
        for (g, group) in groups.iter().enumerate() {
            let offset = (g as f64 - (groups.len() as f64 - 1.0) / 2.0) * width;
            let bars: Vec<Bar> = points
                .iter()
                .filter(|(_, _, row)| group_of(spec, *row) == *group)
                .map(|(pos, y, _)| {
                    Bar::new(*pos as f64 + offset, *y)
                        .width(width * 0.95)
                        .name(format!("{} / {}", categories[*pos], group))
                })
                .collect();
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .name(group.to_string())
                    .color(colors.color_for(group)),
            );
        }
    });
}

// ---------------------------------------------------------------------------
// Line chart over a numeric x
// ---------------------------------------------------------------------------

fn line_chart(ui: &mut Ui, spec: &ChartSpec) {
    let groups = spec.groups();
    let colors = ColorMap::new(&groups);

    Plot::new(&spec.title)
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(spec.x_label())
        .y_axis_label(spec.y_label())
        .x_grid_spacer(uniform_grid_spacer(|_| [1.0, 5.0, 10.0]))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for group in &groups {
                let mut series: Vec<[f64; 2]> = (0..spec.data.len())
                    .filter(|&row| group_of(spec, row) == *group)
                    .filter_map(|row| {
                        let x = spec.data.get(row, &spec.x)?.as_f64()?;
                        let y = spec.data.get(row, &spec.y)?.as_f64()?;
                        Some([x, y])
                    })
                    .collect();
                series.sort_by(|a, b| a[0].total_cmp(&b[0]));
                let color = colors.color_for(group);
                plot_ui.points(
                    Points::new(PlotPoints::from(series.clone()))
                        .color(color)
                        .radius(3.0),
                );
                plot_ui.line(
                    Line::new(PlotPoints::from(series))
                        .name(group.to_string())
                        .color(color)
                        .width(1.5),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Strip chart
// ---------------------------------------------------------------------------

fn strip_chart(ui: &mut Ui, spec: &ChartSpec) {
    let categories = spec.categories();
    let groups = spec.groups();
    let colors = ColorMap::new(&groups);
    let points = positioned(spec, &categories);

    categorical_plot(ui, spec, &categories, |plot_ui| {
        for group in &groups {
            let scatter: PlotPoints = points
                .iter()
                .filter(|(_, _, row)| group_of(spec, *row) == *group)
                .map(|(pos, y, row)| [*pos as f64 + jitter(*row), *y])
                .collect();
            plot_ui.points(
                Points::new(scatter)
                    .name(group.to_string())
                    .color(colors.color_for(group))
                    .radius(2.5),
            );
        }
    });
}

// ---------------------------------------------------------------------------
// Annotated heatmap
// ---------------------------------------------------------------------------

fn heatmap(ui: &mut Ui, spec: &ChartSpec) {
    let columns = spec.categories();
    let n = columns.len();
    let value_column = spec.color.as_deref().unwrap_or(&spec.y);
    let margin = 120.0;
    let cell = ((ui.available_width() - margin) / n as f32).clamp(40.0, 90.0);

    let (rect, _response) = ui.allocate_exact_size(
        Vec2::new(margin + cell * n as f32, margin / 2.0 + cell * n as f32),
        Sense::hover(),
    );
    let painter = ui.painter_at(rect);
    let text_color = ui.visuals().text_color();
    let origin = rect.min + Vec2::new(margin, margin / 2.0);

    for (i, name) in columns.iter().enumerate() {
        let offset = (i as f32 + 0.5) * cell;
        painter.text(
            origin + Vec2::new(-6.0, offset),
            Align2::RIGHT_CENTER,
            name.to_string(),
            FontId::proportional(12.0),
            text_color,
        );
        painter.text(
            origin + Vec2::new(offset, -6.0),
            Align2::CENTER_BOTTOM,
            name.to_string(),
            FontId::proportional(12.0),
            text_color,
        );
    }

    for row in 0..spec.data.len() {
        let (Some(a), Some(b)) = (spec.data.get(row, &spec.x), spec.data.get(row, &spec.y)) else {
            continue;
        };
        let (Some(i), Some(j)) = (
            columns.iter().position(|c| c == a),
            columns.iter().position(|c| c == b),
        ) else {
            continue;
        };
        let r = spec
            .data
            .get(row, value_column)
            .and_then(Value::as_f64)
            .unwrap_or(f64::NAN);
        let min = origin + Vec2::new(j as f32 * cell, i as f32 * cell);
        let cell_rect = egui::Rect::from_min_size(min, Vec2::splat(cell - 1.0));
        painter.rect_filled(cell_rect, 0.0, diverging(r));
        let label = if r.is_nan() { String::new() } else { format!("{r:.2}") };
        painter.text(
            cell_rect.center(),
            Align2::CENTER_CENTER,
            label,
            FontId::proportional(12.0),
            Color32::BLACK,
        );
    }
}
