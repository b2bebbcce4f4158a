/*
 * Application Module
 *
 * This module defines the viewer's model and its nannou callbacks. The model
 * wraps a Simulation plus the editable parameter copy shown in the UI, the
 * camera and a few view switches. Each frame the UI runs first, parameter
 * edits are pushed into the simulation, and then the simulation is stepped
 * by the elapsed frame time.
 *
 * Input:
 * - Drag with the left mouse button to pan, scroll to zoom
 * - Left click (without dragging) selects the nearest boid and highlights
 *   the neighbor candidates the active index returns for it
 */

use std::sync::OnceLock;

use nannou::prelude::*;
use nannou::winit::event::{MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};
use nannou_egui::Egui;
use tracing::warn;

use crate::camera::Camera;
use crate::debug::DebugInfo;
use crate::params::SimulationParams;
use crate::renderer;
use crate::simulation::Simulation;
use crate::ui::{self, ViewOptions};

// Longest frame the simulation will integrate in one step
const MAX_FRAME_DT: f32 = 1.0 / 20.0;

static STARTUP_PARAMS: OnceLock<SimulationParams> = OnceLock::new();

// Parameters the next model() call starts from. nannou builds the model
// from a plain function pointer, so they are handed over here.
pub fn set_startup_params(params: SimulationParams) {
    let _ = STARTUP_PARAMS.set(params);
}

pub struct Model {
    pub sim: Simulation,
    // Working copy edited by the UI
    pub params: SimulationParams,
    pub options: ViewOptions,
    pub egui: Egui,
    pub camera: Camera,
    pub mouse_position: Vec2,
    pub press_position: Option<Vec2>,
    pub selected_boid: Option<usize>,
    pub debug_info: DebugInfo,
    pub fps: f32,
}

// Initialize the model
pub fn model(app: &App) -> Model {
    let window_id = app
        .new_window()
        .title("Shoal")
        .size(1280, 860)
        .view(renderer::view)
        .mouse_moved(mouse_moved)
        .mouse_pressed(mouse_pressed)
        .mouse_released(mouse_released)
        .mouse_wheel(mouse_wheel)
        .raw_event(raw_window_event)
        .build()
        .expect("failed to open the viewer window");

    let window = app.window(window_id).expect("viewer window closed during startup");
    let egui = Egui::from_window(&window);

    let params = STARTUP_PARAMS.get().cloned().unwrap_or_default();
    let sim = Simulation::new(params.clone()).expect("parameters are validated before the viewer starts");
    let camera = Camera::fit(params.bounds, app.window_rect());

    Model {
        sim,
        params,
        options: ViewOptions::default(),
        egui,
        camera,
        mouse_position: Vec2::ZERO,
        press_position: None,
        selected_boid: None,
        debug_info: DebugInfo::default(),
        fps: 0.0,
    }
}

// Update the model
pub fn update(app: &App, model: &mut Model, update: Update) {
    model.fps = app.fps();

    let actions = ui::update_ui(&mut model.egui, &mut model.params, &mut model.options, &model.debug_info, model.fps);

    if actions.reset_camera {
        model.camera = Camera::fit(model.params.bounds, app.window_rect());
    }

    apply_param_changes(model);

    if actions.reset_boids {
        model.sim.reset_boids();
        model.selected_boid = None;
    }

    if !model.options.paused {
        let dt = update.since_last.as_secs_f32().min(MAX_FRAME_DT);
        if dt > 0.0 {
            model.debug_info = model.sim.step(dt);
        }
    }
}

// Push UI edits into the simulation. Edits that fail validation are undone
// so the panel always shows what is actually running.
fn apply_param_changes(model: &mut Model) {
    if &model.params == model.sim.params() {
        return;
    }
    if let Err(err) = model.sim.update_params(model.params.clone()) {
        warn!(%err, "rejected parameter change");
        model.params = model.sim.params().clone();
    }
    if model.selected_boid.map_or(false, |i| i >= model.sim.boids().len()) {
        model.selected_boid = None;
    }
}

// Index of the boid whose projection is closest to `screen`, if any is
// within a few pixels
fn pick_boid(model: &Model, screen: Vec2, window_rect: Rect) -> Option<usize> {
    let pick_radius = 8.0;
    model
        .sim
        .boids()
        .iter()
        .enumerate()
        .map(|(i, b)| (i, model.camera.project(b.position.x, b.position.z, window_rect).distance(screen)))
        .filter(|(_, d)| *d < pick_radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

pub fn mouse_moved(_app: &App, model: &mut Model, pos: Point2) {
    let new_pos = Vec2::new(pos.x, pos.y);
    if model.camera.is_dragging {
        model.camera.drag(new_pos);
    }
    model.mouse_position = new_pos;
}

pub fn mouse_pressed(_app: &App, model: &mut Model, button: MouseButton) {
    // Clicks on the UI never reach the camera
    if button == MouseButton::Left && !model.egui.ctx().is_pointer_over_area() {
        model.camera.start_drag(model.mouse_position);
        model.press_position = Some(model.mouse_position);
    }
}

pub fn mouse_released(app: &App, model: &mut Model, button: MouseButton) {
    if button != MouseButton::Left {
        return;
    }
    model.camera.end_drag();

    // A press and release in the same spot is a click, not a pan
    if let Some(pressed) = model.press_position.take() {
        if pressed.distance(model.mouse_position) < 3.0 {
            model.selected_boid = pick_boid(model, model.mouse_position, app.window_rect());
        }
    }
}

pub fn mouse_wheel(app: &App, model: &mut Model, delta: MouseScrollDelta, _phase: TouchPhase) {
    let window_rect = app.window_rect();
    match delta {
        MouseScrollDelta::LineDelta(x, y) => {
            model.camera.zoom(vec2(x, y), model.mouse_position, window_rect);
        }
        MouseScrollDelta::PixelDelta(pos) => {
            model.camera.zoom(vec2(pos.x as f32, pos.y as f32) * 0.01, model.mouse_position, window_rect);
        }
    }
}

// Pass raw window events to egui
pub fn raw_window_event(_app: &App, model: &mut Model, event: &WindowEvent) {
    model.egui.handle_raw_event(event);
}
