/*
 * Renderer Module
 *
 * This module draws the viewer frame: the volume outline, the active index
 * structure when "View Structure" is on, the flock, the predator and the
 * target, seen from above. Boids are small triangles pointing along their
 * velocity and tinted by height so the third axis is not lost entirely.
 */

use nannou::prelude::*;
use tracing::warn;

use crate::app::Model;
use crate::spatial_index::IndexKind;
use crate::ui;

const BOID_SIZE: f32 = 5.0;

// Render the model
pub fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    draw.background().color(BLACK);

    let window_rect = app.window_rect();
    let camera = &model.camera;
    let bounds = model.sim.params().bounds;

    // Volume outline
    let corner_a = camera.project(-bounds, -bounds, window_rect);
    let corner_b = camera.project(bounds, bounds, window_rect);
    let volume = Rect::from_corners(corner_a, corner_b);
    draw.rect()
        .xy(volume.xy())
        .wh(volume.wh())
        .no_fill()
        .stroke_weight(1.0)
        .stroke(rgba(0.3, 0.3, 0.3, 1.0));

    if model.options.show_structure {
        draw_structure(&draw, model, window_rect);
    }

    // Candidates the index returns for the selected boid
    let highlighted = model
        .selected_boid
        .and_then(|i| model.sim.boids().get(i))
        .map(|boid| model.sim.find_near(boid.position))
        .unwrap_or_default();

    for (i, boid) in model.sim.boids().iter().enumerate() {
        let pos = camera.project(boid.position.x, boid.position.z, window_rect);
        if !window_rect.pad(-BOID_SIZE * 2.0).contains(pos) {
            continue;
        }

        let heading = vec2(boid.velocity.x, boid.velocity.z);
        let angle = if heading.length_squared() > 0.0 { heading.y.atan2(heading.x) } else { 0.0 };

        let color = if model.selected_boid == Some(i) {
            rgba(1.0, 1.0, 0.0, 1.0)
        } else if highlighted.contains(&i) {
            rgba(0.2, 1.0, 0.4, 1.0)
        } else {
            // Higher boids are brighter
            let height = (boid.position.y / bounds * 0.5 + 0.5).clamp(0.0, 1.0);
            rgba(0.4 + 0.6 * height, 0.6 + 0.4 * height, 1.0, 0.9)
        };

        draw.tri()
            .points(pt2(BOID_SIZE, 0.0), pt2(-BOID_SIZE * 0.6, BOID_SIZE * 0.5), pt2(-BOID_SIZE * 0.6, -BOID_SIZE * 0.5))
            .xy(pos)
            .rotate(angle)
            .color(color);
    }

    if let Some(predator) = model.sim.predator() {
        let pos = camera.project(predator.position.x, predator.position.z, window_rect);
        let heading = vec2(predator.velocity.x, predator.velocity.z);
        let angle = if heading.length_squared() > 0.0 { heading.y.atan2(heading.x) } else { 0.0 };
        let size = BOID_SIZE * 2.5;
        draw.tri()
            .points(pt2(size, 0.0), pt2(-size * 0.6, size * 0.5), pt2(-size * 0.6, -size * 0.5))
            .xy(pos)
            .rotate(angle)
            .color(rgb(1.0, 0.53, 0.0));

        if model.options.show_debug {
            draw.ellipse()
                .xy(pos)
                .radius(model.sim.params().predator.chase_radius * camera.zoom)
                .no_fill()
                .stroke(rgba(1.0, 0.53, 0.0, 0.5))
                .stroke_weight(1.0);
        }
    }

    let target = model.sim.target();
    draw.ellipse()
        .xy(camera.project(target.position.x, target.position.z, window_rect))
        .radius(4.0)
        .color(RED);

    if model.options.show_debug {
        if let Some(boid) = model.selected_boid.and_then(|i| model.sim.boids().get(i)) {
            let pos = camera.project(boid.position.x, boid.position.z, window_rect);
            let params = model.sim.params();
            draw.ellipse()
                .xy(pos)
                .radius(params.separation_radius * camera.zoom)
                .no_fill()
                .stroke(RED)
                .stroke_weight(1.0);
            draw.ellipse()
                .xy(pos)
                .radius(params.cohesion_radius * camera.zoom)
                .no_fill()
                .stroke(BLUE)
                .stroke_weight(1.0);
        }
        ui::draw_debug_info(&draw, &model.debug_info, window_rect, model.fps, camera.zoom);
    }

    if let Err(err) = draw.to_frame(app, &frame) {
        warn!(?err, "failed to draw frame");
    }
    if let Err(err) = model.egui.draw_to_frame(&frame) {
        warn!(?err, "failed to draw ui");
    }
}

// Grid cells are filled by occupancy, octree nodes are outlined
fn draw_structure(draw: &Draw, model: &Model, window_rect: Rect) {
    let camera = &model.camera;
    let kind = model.sim.index_kind();

    for cell in model.sim.structure_cells() {
        let min = camera.project(cell.bounds.min.x, cell.bounds.min.z, window_rect);
        let max = camera.project(cell.bounds.max.x, cell.bounds.max.z, window_rect);
        let rect = Rect::from_corners(min, max);

        match kind {
            IndexKind::Grid => {
                draw.rect()
                    .xy(rect.xy())
                    .wh(rect.wh())
                    .color(rgba(cell.heat, 0.2, 1.0 - cell.heat, 0.15 + 0.35 * cell.heat));
            }
            IndexKind::Octree => {
                draw.rect()
                    .xy(rect.xy())
                    .wh(rect.wh())
                    .no_fill()
                    .stroke_weight(1.0)
                    .stroke(rgba(0.2, 0.8, 0.3, 0.15 + 0.5 * cell.heat));
            }
        }
    }
}
