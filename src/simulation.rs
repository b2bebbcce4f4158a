/*
 * Simulation Module
 *
 * This module owns the flock, the predator, the target and the active
 * spatial index, and advances them one tick at a time:
 *
 * 1. Refresh the index. The octree is rebuilt from scratch every tick; the
 *    grid is only filled from scratch after a reset or a structure switch
 *    and is otherwise kept current by relocating agents as they move.
 * 2. Snapshot every agent's position and velocity.
 * 3. Update every agent against the snapshot, in parallel when enabled.
 * 4. Update the predator against the same snapshot.
 * 5. Relocate grid entries whose agent changed cell.
 * 6. Move the target.
 *
 * Each agent draws from its own RNG, seeded from a per-tick seed and its
 * index, so the parallel and sequential paths give identical results.
 */

use std::time::Instant;

use glam::{Quat, Vec3};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::boid::{Boid, Environment, Neighbor};
use crate::debug::DebugInfo;
use crate::error::ConfigError;
use crate::params::SimulationParams;
use crate::predator::{Predator, PredatorMode};
use crate::spatial_index::{IndexKind, NeighborIndex, SpatialIndex, StructureCell};
use crate::target::Target;

// Spreads agent indices across the seed space before mixing with the tick seed
const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

pub struct Simulation {
    params: SimulationParams,
    boids: Vec<Boid>,
    predator: Option<Predator>,
    target: Target,
    index: SpatialIndex,
    // The grid must be refilled from scratch before the next query
    index_stale: bool,
    // The previous octree fill dropped agents outside its volume
    dropping: bool,
    snapshot: Vec<Neighbor>,
    rng: SmallRng,
    tick: u64,
}

impl Simulation {
    pub fn new(params: SimulationParams) -> Result<Self, ConfigError> {
        params.validate()?;

        let mut rng = match params.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let boids = spawn_boids(&mut rng, params.num_boids, params.spawn_extent);
        let target = Target::random(&mut rng, params.bounds, params.target_speed);
        let predator = params.predator.enabled.then(|| spawn_predator(&mut rng, params.bounds));
        let index = SpatialIndex::new(params.index_kind, &params);

        debug!(
            boids = boids.len(),
            index = params.index_kind.label(),
            predator = predator.is_some(),
            seed = ?params.seed,
            "simulation created"
        );

        Ok(Self {
            params,
            boids,
            predator,
            target,
            index,
            index_stale: true,
            dropping: false,
            snapshot: Vec::new(),
            rng,
            tick: 0,
        })
    }

    // Advance everything by `dt` seconds
    pub fn step(&mut self, dt: f32) -> DebugInfo {
        let start = Instant::now();

        self.refresh_index();
        let dropped_points = self.index.as_octree().map_or(0, |tree| tree.dropped());
        if starts_dropping(self.dropping, dropped_points) {
            warn!(dropped_points, tick = self.tick, "agents outside the octree volume were not indexed");
        } else if dropped_points > 0 {
            debug!(dropped_points, tick = self.tick, "agents still outside the octree volume");
        }
        self.dropping = dropped_points > 0;

        self.snapshot.clear();
        self.snapshot.extend(self.boids.iter().enumerate().map(|(i, b)| b.snapshot(i)));

        let tick_seed: u64 = self.rng.gen();
        let neighbor_candidates = self.update_boids(dt, tick_seed);

        let predator_mode = self.update_predator(dt);

        if let SpatialIndex::Grid(grid) = &mut self.index {
            for (before, boid) in self.snapshot.iter().zip(&self.boids) {
                grid.relocate(before.position, boid.position, before.index);
            }
        }

        self.target.update(dt);
        self.tick += 1;

        let info = DebugInfo {
            tick: self.tick,
            agents: self.boids.len(),
            index_kind: self.index.kind(),
            indexed: self.index.len(),
            index_cells: self.index_cells(),
            neighbor_candidates,
            dropped_points,
            predator_mode,
            step_time: start.elapsed(),
        };
        trace!(%info, "tick");
        info
    }

    fn refresh_index(&mut self) {
        let rebuild = match self.index {
            SpatialIndex::Octree(_) => true,
            SpatialIndex::Grid(_) => self.index_stale,
        };
        if rebuild {
            self.index.clear();
            for (i, boid) in self.boids.iter().enumerate() {
                self.index.insert(boid.position, i);
            }
            self.index_stale = false;
        }
    }

    // Update every agent and return the total number of neighbor candidates
    // the index produced
    fn update_boids(&mut self, dt: f32, tick_seed: u64) -> usize {
        let index = &self.index;
        let snapshot = &self.snapshot;
        let env = Environment {
            target: &self.target,
            predator: self.predator.as_ref().map(|p| p.position),
            params: &self.params,
        };

        if self.params.enable_parallel {
            self.boids
                .par_iter_mut()
                .enumerate()
                .map_init(
                    || (Vec::<usize>::new(), Vec::<Neighbor>::new()),
                    |(handles, near), (i, boid)| {
                        update_agent(i, boid, index, snapshot, &env, dt, tick_seed, handles, near)
                    },
                )
                .sum()
        } else {
            let mut handles = Vec::new();
            let mut near = Vec::new();
            self.boids
                .iter_mut()
                .enumerate()
                .map(|(i, boid)| {
                    update_agent(i, boid, index, snapshot, &env, dt, tick_seed, &mut handles, &mut near)
                })
                .sum()
        }
    }

    fn update_predator(&mut self, dt: f32) -> Option<PredatorMode> {
        let predator = self.predator.as_mut()?;

        let mut handles = Vec::new();
        self.index.find_near(predator.position, &mut handles);
        let prey: Vec<Neighbor> = handles
            .iter()
            .filter_map(|&h| self.snapshot.get(h).copied())
            .collect();

        let before = predator.mode;
        let mode = predator.update(&prey, &self.target, &self.params, dt);
        if mode != before {
            trace!(?mode, tick = self.tick, "predator changed mode");
        }
        Some(mode)
    }

    fn index_cells(&self) -> usize {
        match &self.index {
            SpatialIndex::Grid(grid) => grid.cell_count(),
            SpatialIndex::Octree(tree) => tree.node_count(),
        }
    }

    // Switch neighbor structure. The old structure is dropped and the new one
    // is filled on the next tick.
    pub fn set_index_kind(&mut self, kind: IndexKind) {
        if kind == self.index.kind() {
            return;
        }
        debug!(from = self.index.kind().label(), to = kind.label(), "switching spatial index");
        self.params.index_kind = kind;
        self.index = SpatialIndex::new(kind, &self.params);
        self.index_stale = true;
    }

    // Scatter the flock again around the origin
    pub fn reset_boids(&mut self) {
        self.boids = spawn_boids(&mut self.rng, self.boids.len(), self.params.spawn_extent);
        self.invalidate_index();
        debug!(boids = self.boids.len(), "flock reset");
    }

    // Grow or shrink the flock. New agents spawn like the initial ones.
    pub fn set_boid_count(&mut self, count: usize) {
        if count == self.boids.len() {
            return;
        }
        if count < self.boids.len() {
            self.boids.truncate(count);
        } else {
            let extra = spawn_boids(&mut self.rng, count - self.boids.len(), self.params.spawn_extent);
            self.boids.extend(extra);
        }
        self.params.num_boids = count;
        self.invalidate_index();
        debug!(boids = count, "flock resized");
    }

    // Replace the parameters mid-run. The index is rebuilt only when its
    // layout changed.
    pub fn update_params(&mut self, params: SimulationParams) -> Result<(), ConfigError> {
        params.validate()?;

        let rebuild = params.index_layout_changed(&self.params) || params.index_kind != self.index.kind();
        let count = params.num_boids;

        self.target.bounds = params.bounds;
        if params.target_speed != self.params.target_speed {
            self.target.set_speed(params.target_speed);
        }
        match (params.predator.enabled, self.predator.is_some()) {
            (true, false) => self.predator = Some(spawn_predator(&mut self.rng, params.bounds)),
            (false, true) => self.predator = None,
            _ => {}
        }
        self.params = params;

        if rebuild {
            self.index = SpatialIndex::new(self.params.index_kind, &self.params);
            self.index_stale = true;
            debug!(index = self.params.index_kind.label(), "index layout changed");
        }
        self.set_boid_count(count);
        Ok(())
    }

    fn invalidate_index(&mut self) {
        self.index.clear();
        self.index_stale = true;
    }

    // Candidate neighbors of `position` from the active structure
    pub fn find_near(&self, position: Vec3) -> Vec<usize> {
        let mut out = Vec::new();
        self.index.find_near(position, &mut out);
        out
    }

    // Position and orientation of every agent, in agent order
    pub fn transforms(&self) -> Vec<(Vec3, Quat)> {
        self.boids.iter().map(|b| (b.position, b.orientation)).collect()
    }

    pub fn structure_cells(&self) -> Vec<StructureCell> {
        self.index.structure_cells()
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn predator(&self) -> Option<&Predator> {
        self.predator.as_ref()
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn index_kind(&self) -> IndexKind {
        self.index.kind()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }
}

// Warn once when agents first leave the octree, not on every tick they stay out
fn starts_dropping(was_dropping: bool, dropped: usize) -> bool {
    !was_dropping && dropped > 0
}

#[allow(clippy::too_many_arguments)]
fn update_agent(
    i: usize,
    boid: &mut Boid,
    index: &SpatialIndex,
    snapshot: &[Neighbor],
    env: &Environment<'_>,
    dt: f32,
    tick_seed: u64,
    handles: &mut Vec<usize>,
    near: &mut Vec<Neighbor>,
) -> usize {
    handles.clear();
    near.clear();
    index.find_near(boid.position, handles);
    near.extend(handles.iter().filter_map(|&h| snapshot.get(h).copied()));

    let mut rng = SmallRng::seed_from_u64(tick_seed ^ (i as u64).wrapping_mul(SEED_MIX));
    boid.update(near, i, dt, env, &mut rng);
    handles.len()
}

fn spawn_boids(rng: &mut SmallRng, count: usize, extent: f32) -> Vec<Boid> {
    (0..count).map(|_| Boid::random(rng, extent)).collect()
}

fn spawn_predator(rng: &mut SmallRng, bounds: f32) -> Predator {
    let half = bounds * 0.5;
    Predator::new(Vec3::new(
        rng.gen_range(-half..=half),
        rng.gen_range(-half..=half),
        rng.gen_range(-half..=half),
    ))
}
