use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::state::{AppState, Mode};
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DatascopeApp {
    pub state: AppState,
}

impl Default for DatascopeApp {
    fn default() -> Self {
        Self {
            state: AppState::default(),
        }
    }
}

impl eframe::App for DatascopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: mode switch, filters, prediction inputs ----
        egui::SidePanel::left("side_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.mode {
            Mode::Explore => explore_page(ui, &mut self.state),
            Mode::Predict => predict_page(ui, &mut self.state),
        });
    }
}

// ---------------------------------------------------------------------------
// Explore page – table, summary and charts of the filtered rows
// ---------------------------------------------------------------------------

fn explore_page(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to explore it  (File → Open…)");
        });
        return;
    }

    ScrollArea::vertical()
        .id_salt("explore_page")
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            egui::CollapsingHeader::new(RichText::new("Summary").strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    table::summary_table(ui, state);
                });

            egui::CollapsingHeader::new(RichText::new("Preview").strong())
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    table::data_table(ui, state);
                });

            egui::CollapsingHeader::new(RichText::new("Charts").strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    plot::histogram(ui, state);
                    ui.separator();
                    plot::scatter(ui, state);
                });
        });
}

// ---------------------------------------------------------------------------
// Predict page – labelled confidence breakdown
// ---------------------------------------------------------------------------

fn predict_page(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to make predictions  (File → Open…)");
        });
        return;
    }

    let Some(result) = state.prediction.clone() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("Set the feature sliders and press Predict.");
        });
        return;
    };

    ui.add_space(8.0);
    ui.heading(format!("Predicted: {}", result.label));
    ui.add_space(8.0);

    ui.strong("Confidence breakdown");
    for (label, probability) in &result.ranked {
        ui.add(
            egui::ProgressBar::new(*probability as f32)
                .text(format!("{label}  {:.1}%", probability * 100.0)),
        );
    }
}
