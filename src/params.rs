/*
 * Simulation Parameters Module
 *
 * This module defines the SimulationParams struct that holds every named
 * constant of the simulation: volume bounds, index layout, steering weights
 * and speed limits. Parameters can be loaded from JSON (missing fields fall
 * back to the defaults) and must pass validate() before a simulation is built.
 */

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::spatial_index::IndexKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub num_boids: usize,
    // Boids spawn uniformly inside +/- spawn_extent on every axis
    pub spawn_extent: f32,

    // Simulation volume is the cube [-bounds, bounds]^3
    pub bounds: f32,
    pub bounds_softness: f32,
    pub bounds_strength: f32,
    pub contain_boids: bool,
    // Target speed in world units per second
    pub target_speed: f32,

    // Spatial index layout
    pub index_kind: IndexKind,
    pub cell_size: f32,
    pub neighbor_cells_offset: u32,
    pub cell_capacity: usize,
    pub octree_max_depth: u32,

    // Flocking
    pub separation_strength: f32,
    pub cohesion_strength: f32,
    pub alignment_strength: f32,
    pub steering_strength: f32,
    pub separation_radius: f32,
    pub cohesion_radius: f32,

    // Seeking and integration
    pub spring: f32,
    pub seek_blend: f32,
    pub damping: f32,
    pub max_speed: f32,
    pub speed_clamp_jitter: f32,
    pub velocity_jitter: f32,

    // Reaction to the predator
    pub flee_radius: f32,
    pub flee_strength: f32,

    pub predator: PredatorParams,

    // Performance settings
    pub enable_parallel: bool,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredatorParams {
    pub enabled: bool,
    // Nearest prey closer than this switches the predator into pursuit
    pub chase_radius: f32,
    pub cruise_speed: f32,
    pub pursuit_speed: f32,
    pub cruise_blend: f32,
    pub pursuit_blend: f32,
    pub max_speed: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            num_boids: 1000,
            spawn_extent: 25.0,
            bounds: 100.0,
            bounds_softness: 10.0,
            bounds_strength: 20.0,
            contain_boids: true,
            target_speed: 20.0,
            index_kind: IndexKind::Grid,
            cell_size: 5.0,
            neighbor_cells_offset: 2,
            cell_capacity: 10,
            octree_max_depth: 12,
            separation_strength: 8.0,
            cohesion_strength: 0.008,
            alignment_strength: 0.008,
            steering_strength: 0.05,
            separation_radius: 10.0,
            cohesion_radius: 8.0,
            spring: 0.9,
            seek_blend: 0.05,
            damping: 0.98,
            max_speed: 60.0,
            speed_clamp_jitter: 0.05,
            velocity_jitter: 0.01,
            flee_radius: 20.0,
            flee_strength: 4.0,
            predator: PredatorParams::default(),
            enable_parallel: true,
            seed: None,
        }
    }
}

impl Default for PredatorParams {
    fn default() -> Self {
        Self {
            enabled: true,
            chase_radius: 8.0,
            cruise_speed: 20.0,
            pursuit_speed: 30.0,
            cruise_blend: 0.05,
            pursuit_blend: 0.1,
            max_speed: 65.0,
        }
    }
}

impl SimulationParams {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    // Fail fast on anything the simulation loop assumes never happens
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("bounds", self.bounds)?;
        positive("cell_size", self.cell_size)?;
        positive("max_speed", self.max_speed)?;
        positive("predator.max_speed", self.predator.max_speed)?;

        if self.cell_capacity == 0 {
            return Err(ConfigError::invalid("cell_capacity", "must be at least 1"));
        }
        if !(self.bounds_softness > 0.0 && self.bounds_softness <= self.bounds) {
            return Err(ConfigError::invalid("bounds_softness", "must lie in (0, bounds]"));
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(ConfigError::invalid("damping", "must lie in (0, 1]"));
        }

        for (field, value) in [
            ("spawn_extent", self.spawn_extent),
            ("bounds_strength", self.bounds_strength),
            ("target_speed", self.target_speed),
            ("separation_strength", self.separation_strength),
            ("cohesion_strength", self.cohesion_strength),
            ("alignment_strength", self.alignment_strength),
            ("steering_strength", self.steering_strength),
            ("separation_radius", self.separation_radius),
            ("cohesion_radius", self.cohesion_radius),
            ("spring", self.spring),
            ("seek_blend", self.seek_blend),
            ("speed_clamp_jitter", self.speed_clamp_jitter),
            ("velocity_jitter", self.velocity_jitter),
            ("flee_radius", self.flee_radius),
            ("flee_strength", self.flee_strength),
            ("predator.chase_radius", self.predator.chase_radius),
            ("predator.cruise_speed", self.predator.cruise_speed),
            ("predator.pursuit_speed", self.predator.pursuit_speed),
            ("predator.cruise_blend", self.predator.cruise_blend),
            ("predator.pursuit_blend", self.predator.pursuit_blend),
        ] {
            non_negative(field, value)?;
        }

        if self.speed_clamp_jitter >= self.max_speed {
            return Err(ConfigError::invalid("speed_clamp_jitter", "must be below max_speed"));
        }

        let range = self.query_half_extent();
        let radius = self.steering_reach();
        if range < radius {
            return Err(ConfigError::RangeTooSmall { range, radius });
        }

        Ok(())
    }

    // Half-width of the neighbor query box in world units
    pub fn query_half_extent(&self) -> f32 {
        self.cell_size * self.neighbor_cells_offset as f32
    }

    // Largest radius any steering rule reads neighbors within
    pub fn steering_reach(&self) -> f32 {
        let mut reach = self.separation_radius.max(self.cohesion_radius);
        if self.predator.enabled {
            reach = reach.max(self.predator.chase_radius);
        }
        reach
    }

    // Worst-case overshoot of max_speed after an update: the randomized clamp
    // target plus the per-axis jitter added afterwards
    pub fn speed_tolerance(&self) -> f32 {
        self.speed_clamp_jitter + 0.5 * self.velocity_jitter * 3f32.sqrt()
    }

    // True when switching from `other` to `self` requires rebuilding the index
    pub fn index_layout_changed(&self, other: &SimulationParams) -> bool {
        self.cell_size != other.cell_size
            || self.neighbor_cells_offset != other.neighbor_cells_offset
            || self.cell_capacity != other.cell_capacity
            || self.octree_max_depth != other.octree_max_depth
            || self.bounds != other.bounds
    }

    // Get parameter ranges for UI sliders
    pub fn num_boids_range() -> std::ops::RangeInclusive<usize> {
        10..=20000
    }

    pub fn max_speed_range() -> std::ops::RangeInclusive<f32> {
        1.0..=120.0
    }

    pub fn separation_strength_range() -> std::ops::RangeInclusive<f32> {
        0.0..=20.0
    }

    pub fn flock_strength_range() -> std::ops::RangeInclusive<f32> {
        0.0..=0.05
    }

    pub fn radius_range() -> std::ops::RangeInclusive<f32> {
        0.0..=20.0
    }

    pub fn cell_size_range() -> std::ops::RangeInclusive<f32> {
        1.0..=25.0
    }

    pub fn cell_capacity_range() -> std::ops::RangeInclusive<usize> {
        1..=64
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be positive and finite"))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be non-negative and finite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SimulationParams::default().validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let params = SimulationParams::from_json_str(
            r#"{ "num_boids": 42, "index_kind": "octree", "predator": { "chase_radius": 6.0 } }"#,
        )
        .unwrap();

        assert_eq!(params.num_boids, 42);
        assert_eq!(params.index_kind, IndexKind::Octree);
        assert_eq!(params.predator.chase_radius, 6.0);
        assert_eq!(params.predator.pursuit_speed, PredatorParams::default().pursuit_speed);
        assert_eq!(params.cell_size, SimulationParams::default().cell_size);
    }

    #[test]
    fn rejects_zero_cell_capacity() {
        let params = SimulationParams { cell_capacity: 0, ..Default::default() };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::Invalid { field: "cell_capacity", .. })
        ));
    }

    #[test]
    fn rejects_non_positive_bounds() {
        for bounds in [0.0, -5.0, f32::NAN] {
            let params = SimulationParams { bounds, ..Default::default() };
            assert!(matches!(
                params.validate(),
                Err(ConfigError::Invalid { field: "bounds", .. })
            ));
        }
    }

    #[test]
    fn rejects_softness_larger_than_bounds() {
        let params = SimulationParams { bounds_softness: 150.0, ..Default::default() };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::Invalid { field: "bounds_softness", .. })
        ));
    }

    #[test]
    fn rejects_query_range_smaller_than_radii() {
        let params = SimulationParams {
            cell_size: 2.0,
            neighbor_cells_offset: 1,
            ..Default::default()
        };
        match params.validate() {
            Err(ConfigError::RangeTooSmall { range, radius }) => {
                assert_eq!(range, 2.0);
                assert_eq!(radius, 10.0);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            SimulationParams::from_json_str("{ num_boids: }"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn detects_index_layout_changes() {
        let base = SimulationParams::default();
        let weights_only = SimulationParams { cohesion_strength: 0.02, ..base.clone() };
        let new_cells = SimulationParams { cell_size: 10.0, ..base.clone() };

        assert!(!weights_only.index_layout_changed(&base));
        assert!(new_cells.index_layout_changed(&base));
    }
}
