/*
 * Shoal - 3D Flocking Simulation - Module Definitions
 *
 * This file defines the module structure of the library. The simulation
 * core (agents, predator, target and the two spatial indexes) builds
 * without any graphics; the nannou viewer modules are compiled only with
 * the `viewer` feature.
 */

// Re-export key components for easier access
pub use boid::{Boid, Environment, FlockReport, Neighbor};
pub use debug::DebugInfo;
pub use error::ConfigError;
pub use octree::{Aabb, Octree};
pub use params::{PredatorParams, SimulationParams};
pub use predator::{Predator, PredatorMode};
pub use simulation::Simulation;
pub use spatial_grid::UniformGrid;
pub use spatial_index::{IndexKind, NeighborIndex, SpatialIndex, StructureCell};
pub use target::Target;

// Define modules
pub mod boid;
pub mod debug;
pub mod error;
pub mod octree;
pub mod params;
pub mod predator;
pub mod simulation;
pub mod spatial_grid;
pub mod spatial_index;
pub mod target;

#[cfg(feature = "viewer")]
pub mod app;
#[cfg(feature = "viewer")]
pub mod camera;
#[cfg(feature = "viewer")]
pub mod renderer;
#[cfg(feature = "viewer")]
pub mod ui;

// Fixed tick length used when no frame time is available
pub const DEFAULT_DT: f32 = 1.0 / 60.0;
