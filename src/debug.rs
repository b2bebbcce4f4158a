/*
 * Debug Information Module
 *
 * This module defines the DebugInfo struct returned by every simulation
 * tick. It is what the CLI prints every few ticks and what the viewer shows
 * in its debug panel.
 *
 * Includes metrics for:
 * - Tick number and agent count
 * - Neighbor candidates returned by the index (summed over all agents)
 * - Size of the active index structure
 * - Octree points dropped for being outside the root volume
 * - Wall-clock time spent in the tick
 */

use std::fmt;
use std::time::Duration;

use crate::predator::PredatorMode;
use crate::spatial_index::IndexKind;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DebugInfo {
    pub tick: u64,
    pub agents: usize,
    pub index_kind: IndexKind,
    pub indexed: usize,
    // Occupied grid cells or octree nodes
    pub index_cells: usize,
    pub neighbor_candidates: usize,
    pub dropped_points: usize,
    pub predator_mode: Option<PredatorMode>,
    pub step_time: Duration,
}

impl DebugInfo {
    // Average number of candidates each agent had to test
    pub fn candidates_per_agent(&self) -> f32 {
        if self.agents == 0 {
            0.0
        } else {
            self.neighbor_candidates as f32 / self.agents as f32
        }
    }
}

impl fmt::Display for DebugInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tick {} | {} agents | {} cells: {} | {:.1} candidates/agent | dropped {} | {:.2} ms",
            self.tick,
            self.agents,
            self.index_kind.label(),
            self.index_cells,
            self.candidates_per_agent(),
            self.dropped_points,
            self.step_time.as_secs_f64() * 1000.0,
        )?;
        if let Some(mode) = self.predator_mode {
            write!(f, " | predator {mode:?}")?;
        }
        Ok(())
    }
}
