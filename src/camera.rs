/*
 * Camera Module
 *
 * This module defines the Camera struct that handles zooming and panning
 * in the viewer. The flock lives in 3D; the viewer looks straight down the
 * y axis, so world (x, z) maps to screen (x, y).
 */

use nannou::prelude::*;

pub struct Camera {
    pub position: Vec2,
    pub zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub is_dragging: bool,
    pub last_cursor_pos: Vec2,
}

impl Camera {
    pub fn new(zoom: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom,
            min_zoom: 0.2,
            max_zoom: 30.0,
            is_dragging: false,
            last_cursor_pos: Vec2::ZERO,
        }
    }

    // Zoom that fits a cube of half-width `extent` into the window with a margin
    pub fn fit(extent: f32, window_rect: Rect) -> Self {
        let span = window_rect.w().min(window_rect.h()) * 0.45;
        Self::new((span / extent.max(1.0)).max(0.2))
    }

    // Top-down projection of a world position
    pub fn project(&self, x: f32, z: f32, window_rect: Rect) -> Vec2 {
        self.world_to_screen(vec2(x, z), window_rect)
    }

    // Convert a point from world space to screen space
    pub fn world_to_screen(&self, point: Vec2, window_rect: Rect) -> Vec2 {
        (point - self.position) * self.zoom + window_rect.xy()
    }

    // Convert a point from screen space to world space
    pub fn screen_to_world(&self, point: Vec2, window_rect: Rect) -> Vec2 {
        (point - window_rect.xy()) / self.zoom + self.position
    }

    // Zoom around the cursor so the world point under it stays put
    pub fn zoom(&mut self, scroll_delta: Vec2, cursor_position: Vec2, window_rect: Rect) {
        let zoom_factor = 1.0 + scroll_delta.y * 0.1;
        let cursor_world_before = self.screen_to_world(cursor_position, window_rect);

        self.zoom = (self.zoom * zoom_factor).clamp(self.min_zoom, self.max_zoom);

        let cursor_world_after = self.screen_to_world(cursor_position, window_rect);
        self.position += cursor_world_before - cursor_world_after;
    }

    pub fn start_drag(&mut self, position: Vec2) {
        self.last_cursor_pos = position;
        self.is_dragging = true;
    }

    // Pan by the cursor movement since the last drag event
    pub fn drag(&mut self, position: Vec2) {
        if self.is_dragging {
            let delta = position - self.last_cursor_pos;
            if delta.length_squared() > 0.0 {
                self.position -= delta / self.zoom;
                self.last_cursor_pos = position;
            }
        }
    }

    pub fn end_drag(&mut self) {
        self.is_dragging = false;
    }
}
