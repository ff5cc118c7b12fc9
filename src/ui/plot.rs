use std::collections::BTreeMap;

use eframe::egui::{self, Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoints, Points};

use crate::data::model::CellValue;
use crate::state::AppState;

const HIST_BINS: usize = 20;
const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Histogram of one numeric column
// ---------------------------------------------------------------------------

/// Render a histogram of the chosen numeric column over the filtered rows.
pub fn histogram(ui: &mut Ui, state: &mut AppState) {
    let Some(dataset) = state.dataset.clone() else {
        return;
    };

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Column:");
        let current = state.hist_column.clone().unwrap_or_default();
        egui::ComboBox::from_id_salt("hist_column")
            .selected_text(&current)
            .show_ui(ui, |ui: &mut Ui| {
                for col in dataset.numeric_columns() {
                    if ui.selectable_label(current == col, &col).clicked() {
                        state.hist_column = Some(col.clone());
                    }
                }
            });
    });

    let Some(col) = state.hist_column.clone() else {
        return;
    };

    let values: Vec<f64> = state
        .view
        .indices
        .iter()
        .filter_map(|&i| dataset.records[i].get(&col).and_then(CellValue::as_f64))
        .collect();
    if values.is_empty() {
        ui.label("No data for the current filters.");
        return;
    }

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let width = ((max - min) / HIST_BINS as f64).max(f64::EPSILON);

    let mut counts = vec![0usize; HIST_BINS];
    for &v in &values {
        let bin = (((v - min) / width) as usize).min(HIST_BINS - 1);
        counts[bin] += 1;
    }

    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            Bar::new(min + (i as f64 + 0.5) * width, count as f64).width(width * 0.95)
        })
        .collect();

    Plot::new("histogram")
        .height(CHART_HEIGHT)
        .x_axis_label(&col)
        .y_axis_label("count")
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name(&col).color(Color32::LIGHT_BLUE));
        });
}

// ---------------------------------------------------------------------------
// Scatter chart of two numeric columns
// ---------------------------------------------------------------------------

/// Render a scatter chart of two chosen numeric columns, coloured by the
/// colour column.
pub fn scatter(ui: &mut Ui, state: &mut AppState) {
    let Some(dataset) = state.dataset.clone() else {
        return;
    };

    ui.horizontal(|ui: &mut Ui| {
        for (label, id, current) in [
            ("X:", "scatter_x", state.scatter_x.clone()),
            ("Y:", "scatter_y", state.scatter_y.clone()),
        ] {
            ui.label(label);
            let current_name = current.unwrap_or_default();
            egui::ComboBox::from_id_salt(id)
                .selected_text(&current_name)
                .show_ui(ui, |ui: &mut Ui| {
                    for col in dataset.numeric_columns() {
                        if ui.selectable_label(current_name == col, &col).clicked() {
                            if id == "scatter_x" {
                                state.scatter_x = Some(col.clone());
                            } else {
                                state.scatter_y = Some(col.clone());
                            }
                        }
                    }
                });
        }
    });

    let (Some(x_col), Some(y_col)) = (state.scatter_x.clone(), state.scatter_y.clone()) else {
        return;
    };

    // Group points by the colour column value so each category becomes one
    // legend entry.
    let color_col = state.color_column.clone();
    let mut groups: BTreeMap<String, (Color32, Vec<[f64; 2]>)> = BTreeMap::new();

    for &idx in &state.view.indices {
        let rec = &dataset.records[idx];
        let (Some(x), Some(y)) = (
            rec.get(&x_col).and_then(CellValue::as_f64),
            rec.get(&y_col).and_then(CellValue::as_f64),
        ) else {
            continue;
        };

        let (name, color) = match (&color_col, &state.color_map) {
            (Some(col), Some(cm)) => match rec.get(col.as_str()) {
                Some(val) => (val.to_string(), cm.color_for(val)),
                None => ("<null>".to_string(), Color32::GRAY),
            },
            _ => ("rows".to_string(), Color32::LIGHT_BLUE),
        };

        groups.entry(name).or_insert_with(|| (color, Vec::new())).1.push([x, y]);
    }

    Plot::new("scatter")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(&x_col)
        .y_axis_label(&y_col)
        .show(ui, |plot_ui| {
            for (name, (color, coords)) in groups {
                let points: PlotPoints = coords.into_iter().collect();
                plot_ui.points(Points::new(points).name(&name).color(color).radius(2.5));
            }
        });
}
