/*
 * UI Module
 *
 * This module contains functions for creating and updating the user interface
 * using nannou_egui. The panel edits a working copy of SimulationParams; the
 * app compares it with the running simulation's parameters afterwards and
 * applies whatever changed.
 */

use nannou_egui::{egui, Egui};

use crate::debug::DebugInfo;
use crate::params::SimulationParams;
use crate::spatial_index::IndexKind;

// Viewer-only switches that never reach the simulation
pub struct ViewOptions {
    pub show_structure: bool,
    pub show_debug: bool,
    pub paused: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self { show_structure: false, show_debug: true, paused: false }
    }
}

// One-shot requests raised by buttons this frame
#[derive(Debug, Default, Clone, Copy)]
pub struct UiActions {
    pub reset_boids: bool,
    pub reset_camera: bool,
}

pub fn update_ui(
    egui: &mut Egui,
    params: &mut SimulationParams,
    options: &mut ViewOptions,
    info: &DebugInfo,
    fps: f32,
) -> UiActions {
    let mut actions = UiActions::default();
    let ctx = egui.begin_frame();

    egui::Window::new("Simulation Controls")
        .default_pos([10.0, 10.0])
        .show(&ctx, |ui| {
            ui.label("Data structure");
            for kind in [IndexKind::Grid, IndexKind::Octree] {
                ui.radio_value(&mut params.index_kind, kind, kind.label());
            }
            ui.checkbox(&mut options.show_structure, "View Structure");

            ui.separator();

            ui.collapsing("Boid Parameters", |ui| {
                ui.add(egui::Slider::new(&mut params.num_boids, SimulationParams::num_boids_range()).text("Number of Boids"));
                if ui.button("Reset Boids").clicked() {
                    actions.reset_boids = true;
                }
                ui.add(egui::Slider::new(&mut params.max_speed, SimulationParams::max_speed_range()).text("Max Speed"));
                ui.checkbox(&mut params.contain_boids, "Contain Boids");
                ui.checkbox(&mut params.predator.enabled, "Predator");
            });

            ui.collapsing("Flocking Behavior", |ui| {
                ui.add(egui::Slider::new(&mut params.separation_strength, SimulationParams::separation_strength_range()).text("Separation Strength"));
                ui.add(egui::Slider::new(&mut params.cohesion_strength, SimulationParams::flock_strength_range()).text("Cohesion Strength"));
                ui.add(egui::Slider::new(&mut params.alignment_strength, SimulationParams::flock_strength_range()).text("Alignment Strength"));
                ui.add(egui::Slider::new(&mut params.separation_radius, SimulationParams::radius_range()).text("Separation Radius"));
                ui.add(egui::Slider::new(&mut params.cohesion_radius, SimulationParams::radius_range()).text("Cohesion Radius"));
            });

            ui.collapsing("Spatial Index", |ui| {
                ui.add(egui::Slider::new(&mut params.cell_size, SimulationParams::cell_size_range()).text("Cell Size"));
                ui.add(egui::Slider::new(&mut params.neighbor_cells_offset, 1..=4).text("Neighbor Cells"));
                ui.add(egui::Slider::new(&mut params.cell_capacity, SimulationParams::cell_capacity_range()).text("Octree Capacity"));
                ui.label(format!(
                    "Query range {:.1} / steering reach {:.1}",
                    params.query_half_extent(),
                    params.steering_reach()
                ));
            });

            ui.collapsing("Performance", |ui| {
                ui.checkbox(&mut params.enable_parallel, "Enable Parallel Processing");
                ui.separator();
                ui.label(format!("FPS: {:.1}", fps));
                ui.label(format!("Tick time: {:.2} ms", info.step_time.as_secs_f64() * 1000.0));
                ui.label(format!("Candidates per boid: {:.1}", info.candidates_per_agent()));
            });

            if ui.button("Reset Camera").clicked() {
                actions.reset_camera = true;
            }
            ui.checkbox(&mut options.show_debug, "Show Debug Info");
            ui.checkbox(&mut options.paused, "Pause Simulation");
        });

    actions
}

// Draw the tick summary in the top-left corner of the window
pub fn draw_debug_info(draw: &nannou::Draw, info: &DebugInfo, window_rect: nannou::geom::Rect, fps: f32, zoom: f32) {
    let margin = 20.0;
    let line_height = 20.0;
    let panel_width = 240.0;

    let mut lines = vec![
        format!("FPS: {:.1}", fps),
        format!("Tick: {}", info.tick),
        format!("Boids: {}", info.agents),
        format!("{}: {} cells", info.index_kind.label(), info.index_cells),
        format!("Candidates/boid: {:.1}", info.candidates_per_agent()),
        format!("Tick time: {:.2} ms", info.step_time.as_secs_f64() * 1000.0),
        format!("Zoom: {:.2}x", zoom),
    ];
    if info.dropped_points > 0 {
        lines.push(format!("Outside octree: {}", info.dropped_points));
    }
    if let Some(mode) = info.predator_mode {
        lines.push(format!("Predator: {:?}", mode));
    }

    let panel_height = line_height * lines.len() as f32 + margin;
    draw.rect()
        .x_y(window_rect.right() - panel_width / 2.0, window_rect.top() - panel_height / 2.0)
        .w_h(panel_width, panel_height)
        .color(nannou::color::rgba(0.0, 0.0, 0.0, 0.7));

    let text_x = window_rect.right() - panel_width / 2.0;
    let text_y = window_rect.top() - margin;
    for (i, text) in lines.iter().enumerate() {
        draw.text(text)
            .x_y(text_x, text_y - i as f32 * line_height)
            .w(panel_width - margin)
            .left_justify()
            .color(nannou::color::WHITE)
            .font_size(14);
    }
}
