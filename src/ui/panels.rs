use std::path::PathBuf;

use eframe::egui::{self, Color32, RichText, Ui};

use crate::state::{AppState, Tab};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the menu bar and the tab strip.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open dataset…").clicked() {
                if let Some(path) = pick_table("Open crop-yield dataset") {
                    state.set_dataset_path(path);
                }
                ui.close_menu();
            }
            if ui.button("Open history…").clicked() {
                if let Some(path) = pick_table("Open historical yield series") {
                    state.set_trend_path(path);
                }
                ui.close_menu();
            }
            if ui.button("Open model…").clicked() {
                if let Some(path) = pick_model() {
                    state.set_model_path(path);
                }
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} records, {} states",
                ds.len(),
                ds.states().count()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });

    ui.horizontal(|ui: &mut Ui| {
        for tab in Tab::ALL {
            ui.selectable_value(&mut state.tab, tab, tab.title());
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn pick_table(title: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Supported files", &["parquet", "pq", "csv", "tsv", "txt"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("CSV", &["csv", "tsv", "txt"])
        .pick_file()
}

fn pick_model() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open yield model")
        .add_filter("JSON model", &["json"])
        .pick_file()
}
