use eframe::egui;

use crop_yield::config::DashboardConfig;

use crate::state::{AppState, Tab};
use crate::ui::{panels, tabs};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CropYieldApp {
    pub state: AppState,
}

impl CropYieldApp {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for CropYieldApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar + tab strip ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Central panel: active tab ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.tab {
            Tab::Prediction => tabs::prediction(ui, &mut self.state),
            Tab::Distribution => tabs::distribution(ui, &mut self.state),
            Tab::Analysis => tabs::analysis(ui, &mut self.state),
        });
    }
}
