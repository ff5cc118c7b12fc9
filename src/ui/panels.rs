use eframe::egui::{self, Color32, RichText, ScrollArea, Slider, Ui};

use crate::data::model::ColumnType;
use crate::state::{AppState, Mode};

/// Columns with at most this many distinct values get checkbox filters even
/// when numeric (passenger class, survival flags, …).
const CHECKBOX_CARDINALITY: usize = 12;

// ---------------------------------------------------------------------------
// Left side panel – mode switch, filters, prediction inputs
// ---------------------------------------------------------------------------

/// Render the left panel for the active mode.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.add_space(4.0);
    ui.horizontal(|ui: &mut Ui| {
        if ui
            .selectable_label(state.mode == Mode::Explore, "Explore")
            .clicked()
        {
            state.mode = Mode::Explore;
        }
        if ui
            .selectable_label(state.mode == Mode::Predict, "Predict")
            .clicked()
        {
            state.mode = Mode::Predict;
        }
    });
    ui.separator();

    match state.mode {
        Mode::Explore => filter_panel(ui, state),
        Mode::Predict => predict_panel(ui, state),
    }
}

// ---------------------------------------------------------------------------
// Explore mode – per-column filter widgets
// ---------------------------------------------------------------------------

fn filter_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Colour-by selector ----
            ui.strong("Color by");
            let current_color_col = state.color_column.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("color_by")
                .selected_text(&current_color_col)
                .show_ui(ui, |ui: &mut Ui| {
                    for col in dataset.categorical_columns() {
                        if ui
                            .selectable_label(current_color_col == col, &col)
                            .clicked()
                        {
                            state.set_color_column(col.clone());
                        }
                    }
                });

            if ui.small_button("Reset filters").clicked() {
                state.reset_filters();
            }
            ui.separator();

            // ---- Per-column filter widgets (collapsible) ----
            for spec in dataset.schema.clone() {
                let col = &spec.name;
                let Some(all_values) = dataset.unique_values.get(col) else {
                    continue;
                };

                let checkboxes =
                    spec.ty == ColumnType::Categorical || all_values.len() <= CHECKBOX_CARDINALITY;

                if checkboxes {
                    let selected = state.selected_values(col);
                    let header_text =
                        format!("{col}  ({}/{})", selected.len(), all_values.len());

                    egui::CollapsingHeader::new(RichText::new(header_text).strong())
                        .id_salt(col)
                        .default_open(false)
                        .show(ui, |ui: &mut Ui| {
                            ui.horizontal(|ui: &mut Ui| {
                                if ui.small_button("All").clicked() {
                                    state.select_all(col);
                                }
                                if ui.small_button("None").clicked() {
                                    state.select_none(col);
                                }
                            });

                            let selected = state.selected_values(col);
                            for val in all_values {
                                let mut checked = selected.contains(val);
                                let mut text = RichText::new(val.to_string());
                                if state.color_column.as_deref() == Some(col.as_str()) {
                                    if let Some(cm) = &state.color_map {
                                        text = text.color(cm.color_for(val));
                                    }
                                }
                                if ui.checkbox(&mut checked, text).changed() {
                                    state.toggle_filter_value(col, val);
                                }
                            }
                        });
                } else if let Some((full_lo, full_hi)) =
                    dataset.numeric_ranges.get(col).copied()
                {
                    egui::CollapsingHeader::new(RichText::new(col.clone()).strong())
                        .id_salt(col)
                        .default_open(false)
                        .show(ui, |ui: &mut Ui| {
                            let (mut lo, mut hi) =
                                state.selected_range(col).unwrap_or((full_lo, full_hi));

                            let lo_changed = ui
                                .add(Slider::new(&mut lo, full_lo..=full_hi).text("min"))
                                .changed();
                            let hi_changed = ui
                                .add(Slider::new(&mut hi, full_lo..=full_hi).text("max"))
                                .changed();

                            if lo_changed || hi_changed {
                                state.set_range(col, lo.min(hi), hi.max(lo));
                            }
                        });
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Predict mode – label selector and feature sliders
// ---------------------------------------------------------------------------

fn predict_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Prediction");
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Label column selector ----
            ui.strong("Label column");
            let current_target = state.target_column.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("target_column")
                .selected_text(&current_target)
                .show_ui(ui, |ui: &mut Ui| {
                    for col in dataset.column_names() {
                        if ui.selectable_label(current_target == col, &col).clicked() {
                            state.set_target_column(col.clone());
                        }
                    }
                });
            ui.separator();

            // ---- Feature sliders, bounded by the observed ranges ----
            ui.strong("Input features");
            for col in state.feature_columns() {
                let (lo, hi) = dataset
                    .numeric_ranges
                    .get(&col)
                    .copied()
                    .unwrap_or((0.0, 1.0));
                let mid = (lo + hi) / 2.0;
                let value = state.feature_inputs.entry(col.clone()).or_insert(mid);
                ui.add(Slider::new(value, lo..=hi).text(&col));
            }

            ui.add_space(8.0);
            if ui.button("Predict").clicked() {
                state.run_prediction();
            }

            // ---- Training status ----
            if let Some(provider) = &state.model {
                if let Some(report) = provider.report() {
                    ui.add_space(4.0);
                    ui.label(format!(
                        "Trained on {} rows, held-out accuracy {:.1}%",
                        report.n_train,
                        report.accuracy * 100.0
                    ));
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!("{} rows loaded, {} visible", ds.len(), state.view.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open tabular data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_dataset(path);
    }
}
