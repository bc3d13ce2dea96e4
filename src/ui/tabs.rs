use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crop_yield::aggregate::{Granularity, Reduction};
use crop_yield::data::Season;

use crate::state::{AppState, ChartKind, PredictionOutcome, MAX_YEAR, MIN_YEAR};
use crate::ui::plot;

// ---------------------------------------------------------------------------
// Prediction tab
// ---------------------------------------------------------------------------

pub fn prediction(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Welcome to the Crop Yields Prediction app!");
    ui.add_space(8.0);

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.  (File → Open dataset…)");
        return;
    };

    egui::Grid::new("prediction_form")
        .num_columns(2)
        .spacing([16.0, 8.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("Select State");
            let mut chosen_state = state.prediction.state.clone();
            egui::ComboBox::from_id_salt("state")
                .selected_text(&chosen_state)
                .width(240.0)
                .show_ui(ui, |ui: &mut Ui| {
                    for s in dataset.states() {
                        ui.selectable_value(&mut chosen_state, s.to_string(), s);
                    }
                });
            state.select_state(chosen_state);
            ui.end_row();

            ui.label("Select District");
            let districts = state.districts();
            ui.add_enabled_ui(!districts.is_empty(), |ui: &mut Ui| {
                egui::ComboBox::from_id_salt("district")
                    .selected_text(&state.prediction.district)
                    .width(240.0)
                    .show_ui(ui, |ui: &mut Ui| {
                        for d in &districts {
                            ui.selectable_value(&mut state.prediction.district, d.clone(), d);
                        }
                    });
            });
            ui.end_row();

            ui.label("Enter Year");
            ui.add(egui::DragValue::new(&mut state.prediction.year).range(MIN_YEAR..=MAX_YEAR));
            ui.end_row();

            ui.label("Select Season");
            egui::ComboBox::from_id_salt("season")
                .selected_text(state.prediction.season.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for season in Season::ALL {
                        ui.selectable_value(&mut state.prediction.season, season, season.to_string());
                    }
                });
            ui.end_row();

            ui.label("Enter Area (Hectare)");
            ui.add(
                egui::DragValue::new(&mut state.prediction.area)
                    .range(0.0..=f64::MAX)
                    .speed(1.0),
            );
            ui.end_row();

            ui.label("Enter Production (Tonnes)");
            ui.add(
                egui::DragValue::new(&mut state.prediction.production)
                    .range(0.0..=f64::MAX)
                    .speed(1.0),
            );
            ui.end_row();
        });

    ui.add_space(8.0);
    if ui.button("Predict Yield").clicked() {
        state.run_prediction();
    }

    match &state.prediction.outcome {
        Some(PredictionOutcome::Success(msg)) => {
            ui.label(RichText::new(msg).color(Color32::from_rgb(40, 160, 70)));
        }
        Some(PredictionOutcome::Warning(msg)) => {
            ui.label(RichText::new(msg).color(Color32::from_rgb(220, 160, 0)));
        }
        Some(PredictionOutcome::Error(msg)) => {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
        None => {}
    }
}

// ---------------------------------------------------------------------------
// Distribution tab
// ---------------------------------------------------------------------------

pub fn distribution(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Explore Crop Yield Distribution Across India");

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.  (File → Open dataset…)");
        return;
    };

    ui.horizontal(|ui: &mut Ui| {
        let form = &mut state.distribution;
        ui.label("Select Crop:");
        egui::ComboBox::from_id_salt("map_crop")
            .selected_text(&form.crop)
            .show_ui(ui, |ui: &mut Ui| {
                for crop in dataset.crops() {
                    ui.selectable_value(&mut form.crop, crop.to_string(), crop);
                }
            });

        ui.label("Enter Year");
        ui.add(egui::DragValue::new(&mut form.year).range(MIN_YEAR..=MAX_YEAR));

        ui.label("Group by");
        for g in Granularity::ALL {
            ui.selectable_value(&mut form.policy.granularity, g, g.to_string());
        }
        ui.label("Reduce with");
        for r in Reduction::ALL {
            ui.selectable_value(&mut form.policy.reduction, r, r.to_string());
        }
    });

    if ui.button("Show Map").clicked() {
        state.show_map();
    }

    let Some(aggregate) = &state.distribution.result else {
        return;
    };
    ui.label(format!(
        "Showing crop yield information for {} in {}",
        aggregate.crop, aggregate.year
    ));
    if aggregate.is_empty() {
        ui.label("No records for this crop and year.");
        return;
    }

    ui.columns(2, |cols| {
        plot::region_map(&mut cols[0], aggregate);
        plot::region_table(&mut cols[1], aggregate, &mut state.distribution.sort);
    });
}

// ---------------------------------------------------------------------------
// Analysis tab
// ---------------------------------------------------------------------------

fn chart_picker(ui: &mut Ui, id: &str, kind: &mut ChartKind) {
    ui.push_id(id, |ui: &mut Ui| {
        ui.horizontal(|ui: &mut Ui| {
            for k in ChartKind::ALL {
                ui.selectable_value(kind, k, k.label());
            }
        });
    });
}

pub fn analysis(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Analyze the Time-Series Trends over the Years");

    let Some(trends) = state.trends.clone() else {
        ui.label("No historical data loaded.  (File → Open history…)");
        return;
    };
    let crops: Vec<String> = trends.crops().map(str::to_string).collect();

    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        let mut changed = false;

        ui.horizontal(|ui: &mut Ui| {
            ui.label("Reduce across regions with");
            for r in Reduction::ALL {
                changed |= ui
                    .selectable_value(&mut state.analysis.reduction, r, r.to_string())
                    .changed();
            }
        });

        // ---- Single crop ----
        ui.separator();
        ui.strong("Single Crop Analysis");
        egui::ComboBox::from_id_salt("single_crop")
            .selected_text(&state.analysis.crop)
            .show_ui(ui, |ui: &mut Ui| {
                for crop in &crops {
                    changed |= ui
                        .selectable_value(&mut state.analysis.crop, crop.clone(), crop)
                        .changed();
                }
            });
        if changed {
            state.refresh_series();
        }

        chart_picker(ui, "single_chart", &mut state.analysis.single_chart);
        let color = state
            .crop_colors
            .as_ref()
            .map(|c| c.color_for(&state.analysis.crop))
            .unwrap_or(Color32::LIGHT_BLUE);
        plot::single_crop_chart(
            ui,
            &state.analysis.crop,
            &state.analysis.single,
            state.analysis.single_chart,
            color,
        );

        // ---- Comparison ----
        ui.separator();
        ui.strong("Compare Different Crops");
        ui.horizontal_wrapped(|ui: &mut Ui| {
            for crop in &crops {
                let mut checked = state.analysis.compare.contains(crop);
                if ui.checkbox(&mut checked, crop).changed() {
                    state.toggle_compare(crop);
                }
            }
        });

        chart_picker(ui, "compare_chart", &mut state.analysis.compare_chart);
        plot::comparison_chart(
            ui,
            &state.analysis.comparison,
            state.analysis.compare_chart,
            state.crop_colors.as_ref(),
        );
    });
}
