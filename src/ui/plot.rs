use std::collections::BTreeMap;

use eframe::egui::{Color32, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Legend, Line, MarkerShape, Plot, PlotPoints, Points};

use crop_yield::aggregate::{Granularity, RegionAggregate, SeriesPoint, SeriesSet};
use crop_yield::geo::centroid;

use crate::color::{ColorMap, SequentialScale};
use crate::state::{ChartKind, RegionSort};

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Region map (centroid scatter) and table
// ---------------------------------------------------------------------------

/// Plot each state's value at its centroid, shaded on a sequential scale.
pub fn region_map(ui: &mut Ui, aggregate: &RegionAggregate) {
    if aggregate.policy.granularity == Granularity::District {
        ui.label("District values have no map positions; see the table.");
        return;
    }
    let Some((lo, hi)) = aggregate.value_range() else {
        return;
    };
    let scale = SequentialScale::new(lo, hi);

    Plot::new("region_map")
        .legend(Legend::default())
        .data_aspect(1.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .include_x(68.0)
        .include_x(98.0)
        .include_y(6.0)
        .include_y(37.0)
        .height(480.0)
        .show(ui, |plot_ui| {
            for (region, value) in &aggregate.regions {
                let Some((lon, lat)) = centroid(region) else {
                    log::debug!("No centroid for region '{region}'");
                    continue;
                };
                let radius = 6.0 + 10.0 * scale.fraction(value.value);
                plot_ui.points(
                    Points::new(vec![[lon, lat]])
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(radius)
                        .color(scale.color_for(value.value))
                        .name(format!("{region}: {:.3}", value.value)),
                );
            }
        });
}

/// Region / value / record-count table; clicking a header changes the sort.
pub fn region_table(ui: &mut Ui, aggregate: &RegionAggregate, sort: &mut RegionSort) {
    let mut rows: Vec<(&String, f64, usize)> = aggregate
        .regions
        .iter()
        .map(|(name, v)| (name, v.value, v.records))
        .collect();
    if *sort == RegionSort::ValueDescending {
        rows.sort_by(|a, b| b.1.total_cmp(&a.1));
    }

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(160.0))
        .column(Column::auto().at_least(80.0))
        .column(Column::remainder())
        .header(22.0, |mut header| {
            header.col(|ui| {
                if ui.button(aggregate.policy.granularity.to_string()).clicked() {
                    *sort = RegionSort::Name;
                }
            });
            header.col(|ui| {
                if ui.button(format!("{} yield", aggregate.policy.reduction)).clicked() {
                    *sort = RegionSort::ValueDescending;
                }
            });
            header.col(|ui| {
                ui.strong("Records");
            });
        })
        .body(|mut body| {
            for (name, value, records) in rows {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(name);
                    });
                    row.col(|ui| {
                        ui.label(format!("{value:.3}"));
                    });
                    row.col(|ui| {
                        ui.label(records.to_string());
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Time-series charts
// ---------------------------------------------------------------------------

fn series_points(points: &[SeriesPoint]) -> PlotPoints<'_> {
    points.iter().map(|p| [p.year as f64, p.value]).collect()
}

fn chart(id: &str) -> Plot<'_> {
    Plot::new(id.to_string())
        .legend(Legend::default())
        .x_axis_label("Year")
        .y_axis_label("Yield")
        .height(CHART_HEIGHT)
        .allow_drag(true)
        .allow_zoom(true)
}

/// Line, area or bar rendering of one crop's series.
pub fn single_crop_chart(
    ui: &mut Ui,
    crop: &str,
    points: &[SeriesPoint],
    kind: ChartKind,
    color: Color32,
) {
    if points.is_empty() {
        ui.label(format!("No history for {crop}."));
        return;
    }
    chart("single_crop_chart").show(ui, |plot_ui| match kind {
        ChartKind::Line => {
            plot_ui.line(Line::new(series_points(points)).name(crop).color(color).width(2.0));
        }
        ChartKind::Area => {
            plot_ui.line(
                Line::new(series_points(points))
                    .name(crop)
                    .color(color)
                    .fill(0.0),
            );
        }
        ChartKind::Bar => {
            let bars = points
                .iter()
                .map(|p| Bar::new(p.year as f64, p.value).width(0.7).fill(color))
                .collect();
            plot_ui.bar_chart(BarChart::new(bars).name(crop).color(color));
        }
    });
}

/// Cumulative per-year totals for stacking, in crop order.
fn stacked_layers(set: &SeriesSet) -> Vec<(&str, Vec<[f64; 2]>)> {
    let mut running: BTreeMap<i32, f64> = BTreeMap::new();
    set.iter()
        .filter(|(_, points)| !points.is_empty())
        .map(|(crop, points)| {
            for p in points {
                *running.entry(p.year).or_default() += p.value;
            }
            let layer = running.iter().map(|(&y, &v)| [y as f64, v]).collect();
            (crop.as_str(), layer)
        })
        .collect()
}

/// Multi-crop rendering: lines, stacked areas, or grouped bars.
pub fn comparison_chart(ui: &mut Ui, set: &SeriesSet, kind: ChartKind, colors: Option<&ColorMap>) {
    if set.values().all(Vec::is_empty) {
        ui.label("Select one or more crops to compare.");
        return;
    }
    let color_of = |crop: &str| colors.map_or(Color32::LIGHT_BLUE, |c| c.color_for(crop));

    chart("comparison_chart").show(ui, |plot_ui| match kind {
        ChartKind::Line => {
            for (crop, points) in set {
                plot_ui.line(
                    Line::new(series_points(points))
                        .name(crop)
                        .color(color_of(crop))
                        .width(2.0),
                );
            }
        }
        ChartKind::Area => {
            // Top layer first so lower layers paint over its fill.
            for (crop, layer) in stacked_layers(set).into_iter().rev() {
                plot_ui.line(
                    Line::new(PlotPoints::from(layer))
                        .name(crop)
                        .color(color_of(crop))
                        .fill(0.0),
                );
            }
        }
        ChartKind::Bar => {
            let n = set.len().max(1) as f64;
            let width = 0.8 / n;
            for (i, (crop, points)) in set.iter().enumerate() {
                let offset = (i as f64 - (n - 1.0) / 2.0) * width;
                let color = color_of(crop);
                let bars = points
                    .iter()
                    .map(|p| Bar::new(p.year as f64 + offset, p.value).width(width).fill(color))
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).name(crop).color(color));
            }
        }
    });
}
