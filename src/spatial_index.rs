/*
 * Spatial Index Module
 *
 * Both neighbor structures answer the same question: which handles were
 * filed near this point? The NeighborIndex trait is that contract, and
 * SpatialIndex is the concrete value the simulation owns, switching between
 * the uniform grid and the octree at runtime.
 */

use std::hash::Hash;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::octree::{Aabb, Octree};
use crate::params::SimulationParams;
use crate::spatial_grid::UniformGrid;

pub trait NeighborIndex<H> {
    // Drop every entry
    fn clear(&mut self);

    // File `handle` at `position`
    fn insert(&mut self, position: Vec3, handle: H);

    // Append candidate neighbors of `position` to `out`
    fn find_near(&self, position: Vec3, out: &mut Vec<H>);
}

impl<H: Copy + Eq + Hash> NeighborIndex<H> for UniformGrid<H> {
    fn clear(&mut self) {
        self.reset();
    }

    fn insert(&mut self, position: Vec3, handle: H) {
        self.add(position, handle);
    }

    fn find_near(&self, position: Vec3, out: &mut Vec<H>) {
        UniformGrid::find_near(self, position, out);
    }
}

impl<H: Copy> NeighborIndex<H> for Octree<H> {
    fn clear(&mut self) {
        Octree::clear(self);
    }

    fn insert(&mut self, position: Vec3, handle: H) {
        Octree::insert(self, position, handle);
    }

    fn find_near(&self, position: Vec3, out: &mut Vec<H>) {
        Octree::find_near(self, position, out);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    #[default]
    Grid,
    Octree,
}

impl IndexKind {
    pub fn label(self) -> &'static str {
        match self {
            IndexKind::Grid => "Spatial Partition/Mapping",
            IndexKind::Octree => "Octree",
        }
    }
}

impl std::str::FromStr for IndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "grid" | "spatial" => Ok(IndexKind::Grid),
            "octree" => Ok(IndexKind::Octree),
            other => Err(format!("unknown index kind `{other}` (expected grid or octree)")),
        }
    }
}

// One box of the active structure, for visualisation. `heat` is the grid
// cell's occupancy relative to the fullest cell, or the octree node's fill
// relative to its capacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructureCell {
    pub bounds: Aabb,
    pub heat: f32,
}

#[derive(Debug, Clone)]
pub enum SpatialIndex {
    Grid(UniformGrid<usize>),
    Octree(Octree<usize>),
}

impl SpatialIndex {
    pub fn new(kind: IndexKind, params: &SimulationParams) -> Self {
        match kind {
            IndexKind::Grid => {
                SpatialIndex::Grid(UniformGrid::new(params.cell_size, params.neighbor_cells_offset))
            }
            IndexKind::Octree => SpatialIndex::Octree(Octree::new(
                Aabb::around(Vec3::ZERO, params.bounds),
                params.cell_capacity,
                params.octree_max_depth,
                params.query_half_extent(),
            )),
        }
    }

    pub fn kind(&self) -> IndexKind {
        match self {
            SpatialIndex::Grid(_) => IndexKind::Grid,
            SpatialIndex::Octree(_) => IndexKind::Octree,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SpatialIndex::Grid(grid) => grid.len(),
            SpatialIndex::Octree(tree) => tree.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_grid(&self) -> Option<&UniformGrid<usize>> {
        match self {
            SpatialIndex::Grid(grid) => Some(grid),
            SpatialIndex::Octree(_) => None,
        }
    }

    pub fn as_octree(&self) -> Option<&Octree<usize>> {
        match self {
            SpatialIndex::Octree(tree) => Some(tree),
            SpatialIndex::Grid(_) => None,
        }
    }

    // Boxes describing the current structure: occupied grid cells or every
    // octree node
    pub fn structure_cells(&self) -> Vec<StructureCell> {
        match self {
            SpatialIndex::Grid(grid) => {
                let max_count = grid.occupied_cells().map(|(_, n)| n).max().unwrap_or(0).max(1);
                let size = grid.cell_size();
                grid.occupied_cells()
                    .map(|(key, count)| {
                        let min = key.as_vec3() * size;
                        StructureCell {
                            bounds: Aabb::new(min, min + Vec3::splat(size)),
                            heat: count as f32 / max_count as f32,
                        }
                    })
                    .collect()
            }
            SpatialIndex::Octree(tree) => {
                let capacity = tree.cell_capacity() as f32;
                tree.node_bounds()
                    .into_iter()
                    .map(|node| StructureCell {
                        bounds: node.bounds,
                        heat: (node.entries as f32 / capacity).min(1.0),
                    })
                    .collect()
            }
        }
    }
}

impl NeighborIndex<usize> for SpatialIndex {
    fn clear(&mut self) {
        match self {
            SpatialIndex::Grid(grid) => grid.reset(),
            SpatialIndex::Octree(tree) => tree.clear(),
        }
    }

    fn insert(&mut self, position: Vec3, handle: usize) {
        match self {
            SpatialIndex::Grid(grid) => grid.add(position, handle),
            SpatialIndex::Octree(tree) => {
                tree.insert(position, handle);
            }
        }
    }

    fn find_near(&self, position: Vec3, out: &mut Vec<usize>) {
        match self {
            SpatialIndex::Grid(grid) => grid.find_near(position, out),
            SpatialIndex::Octree(tree) => tree.find_near(position, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(index: &mut impl NeighborIndex<usize>, points: &[Vec3]) {
        index.clear();
        for (i, p) in points.iter().enumerate() {
            index.insert(*p, i);
        }
    }

    #[test]
    fn both_kinds_answer_the_same_close_query() {
        let params = SimulationParams::default();
        let points = [Vec3::ZERO, Vec3::new(3.0, 1.0, -2.0), Vec3::new(60.0, 60.0, 60.0)];

        for kind in [IndexKind::Grid, IndexKind::Octree] {
            let mut index = SpatialIndex::new(kind, &params);
            fill(&mut index, &points);
            assert_eq!(index.kind(), kind);
            assert_eq!(index.len(), 3);

            let mut near = Vec::new();
            index.find_near(Vec3::new(1.0, 0.0, 0.0), &mut near);
            near.sort_unstable();
            assert_eq!(near, vec![0, 1], "{kind:?}");
        }
    }

    #[test]
    fn parses_index_kinds() {
        assert_eq!("Octree".parse::<IndexKind>(), Ok(IndexKind::Octree));
        assert_eq!("spatial".parse::<IndexKind>(), Ok(IndexKind::Grid));
        assert!("kd-tree".parse::<IndexKind>().is_err());
    }

    #[test]
    fn grid_heat_is_relative_to_fullest_cell() {
        let params = SimulationParams::default();
        let mut index = SpatialIndex::new(IndexKind::Grid, &params);
        fill(&mut index, &[Vec3::splat(1.0), Vec3::splat(2.0), Vec3::splat(40.0)]);

        let mut heats: Vec<f32> = index.structure_cells().iter().map(|c| c.heat).collect();
        heats.sort_by(f32::total_cmp);
        assert_eq!(heats, vec![0.5, 1.0]);
    }
}
