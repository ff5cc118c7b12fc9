use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

/// Rows shown in the preview table.
const PREVIEW_ROWS: usize = 100;

// ---------------------------------------------------------------------------
// Preview table (filtered rows)
// ---------------------------------------------------------------------------

/// Render the first rows of the derived view.
pub fn data_table(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = state.dataset.clone() else {
        return;
    };
    let columns = dataset.column_names();

    let shown = state.view.indices.len().min(PREVIEW_ROWS);
    if shown < state.view.indices.len() {
        ui.label(format!(
            "Showing {shown} of {} filtered rows",
            state.view.indices.len()
        ));
    }

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .columns(Column::auto().resizable(true), columns.len())
        .header(20.0, |mut header| {
            for col in &columns {
                header.col(|ui: &mut Ui| {
                    ui.strong(col);
                });
            }
        })
        .body(|mut body| {
            for &idx in state.view.indices.iter().take(PREVIEW_ROWS) {
                body.row(18.0, |mut row| {
                    for col in &columns {
                        row.col(|ui: &mut Ui| {
                            let text = dataset.records[idx]
                                .get(col)
                                .map(|v| v.to_string())
                                .unwrap_or_default();
                            ui.label(text);
                        });
                    }
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Summary statistics table
// ---------------------------------------------------------------------------

/// Render descriptive statistics of the numeric columns over the filtered
/// rows.
pub fn summary_table(ui: &mut Ui, state: &AppState) {
    if state.view.summaries.is_empty() {
        ui.label("No numeric columns to summarise.");
        return;
    }

    eframe::egui::Grid::new("summary_grid")
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            for head in ["column", "count", "mean", "std", "min", "max"] {
                ui.strong(head);
            }
            ui.end_row();

            for summary in &state.view.summaries {
                ui.label(&summary.column);
                ui.label(summary.count.to_string());
                ui.label(format!("{:.3}", summary.mean));
                ui.label(format!("{:.3}", summary.std));
                ui.label(format!("{:.3}", summary.min));
                ui.label(format!("{:.3}", summary.max));
                ui.end_row();
            }
        });
}
