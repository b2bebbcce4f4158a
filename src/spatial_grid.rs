/*
 * Spatial Grid Module
 *
 * This module defines the UniformGrid struct for efficient neighbor lookups.
 * Space is divided into cubic cells of a fixed size, hashed by their integer
 * cell coordinate, so only occupied cells take memory and the grid needs no
 * world extent.
 *
 * A reverse map remembers which cell each handle was last filed under. That
 * lets agents be relocated in O(1) as they move, and guarantees a handle is
 * never present in two cells at once. Cells are dropped as soon as they
 * empty so a long-running simulation never accumulates dead buckets.
 */

use std::collections::HashMap;
use std::hash::Hash;

use glam::{IVec3, Vec3};

#[derive(Debug, Clone)]
pub struct UniformGrid<H> {
    cell_size: f32,
    neighbor_offset: i32,
    cells: HashMap<IVec3, Vec<H>>,
    locations: HashMap<H, IVec3>,
}

impl<H: Copy + Eq + Hash> UniformGrid<H> {
    pub fn new(cell_size: f32, neighbor_offset: u32) -> Self {
        Self {
            cell_size,
            neighbor_offset: neighbor_offset as i32,
            cells: HashMap::new(),
            locations: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    // Convert world coordinates to the integer cell coordinate
    #[inline]
    pub fn cell_of(&self, position: Vec3) -> IVec3 {
        (position / self.cell_size).floor().as_ivec3()
    }

    // Drop every entry
    pub fn reset(&mut self) {
        self.cells.clear();
        self.locations.clear();
    }

    // File `handle` under the cell containing `position`, moving it out of
    // whatever cell it was filed under before
    pub fn add(&mut self, position: Vec3, handle: H) {
        let key = self.cell_of(position);

        if let Some(previous) = self.locations.get(&handle).copied() {
            if previous == key {
                return;
            }
            self.take_from_cell(previous, handle);
        }

        self.cells.entry(key).or_default().push(handle);
        self.locations.insert(handle, key);
    }

    // Remove `handle` from the cell containing `position`. If it is not there
    // but the reverse map knows a different cell, it is removed from that one
    // instead so both maps stay in agreement.
    pub fn remove(&mut self, position: Vec3, handle: H) -> bool {
        let key = self.cell_of(position);

        let removed = match self.locations.get(&handle).copied() {
            Some(recorded) if recorded != key => self.take_from_cell(recorded, handle),
            _ => self.take_from_cell(key, handle),
        };
        self.locations.remove(&handle);
        removed
    }

    // Move a handle from its old position to its new one
    pub fn relocate(&mut self, old: Vec3, new: Vec3, handle: H) {
        if self.cell_of(old) != self.cell_of(new) || !self.locations.contains_key(&handle) {
            self.remove(old, handle);
            self.add(new, handle);
        }
    }

    // Append the contents of every cell within neighbor_offset cells of the
    // query cell (the (2*offset+1)^3 block including it)
    pub fn find_near(&self, position: Vec3, out: &mut Vec<H>) {
        let center = self.cell_of(position);
        let r = self.neighbor_offset;

        for x in -r..=r {
            for y in -r..=r {
                for z in -r..=r {
                    if let Some(cell) = self.cells.get(&(center + IVec3::new(x, y, z))) {
                        out.extend_from_slice(cell);
                    }
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, handle: H) -> bool {
        self.locations.contains_key(&handle)
    }

    pub fn location(&self, handle: H) -> Option<IVec3> {
        self.locations.get(&handle).copied()
    }

    pub fn cell(&self, key: IVec3) -> &[H] {
        self.cells.get(&key).map_or(&[], Vec::as_slice)
    }

    // Occupied cells with their occupant counts
    pub fn occupied_cells(&self) -> impl Iterator<Item = (IVec3, usize)> + '_ {
        self.cells.iter().map(|(key, cell)| (*key, cell.len()))
    }

    fn take_from_cell(&mut self, key: IVec3, handle: H) -> bool {
        let Some(cell) = self.cells.get_mut(&key) else {
            return false;
        };

        let removed = match cell.iter().position(|&h| h == handle) {
            Some(i) => {
                cell.swap_remove(i);
                true
            }
            None => false,
        };

        if cell.is_empty() {
            self.cells.remove(&key);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> UniformGrid<usize> {
        UniformGrid::new(5.0, 1)
    }

    #[test]
    fn cell_keys_floor_negative_coordinates() {
        let grid = grid();
        assert_eq!(grid.cell_of(Vec3::new(0.0, 4.99, 5.0)), IVec3::new(0, 0, 1));
        assert_eq!(grid.cell_of(Vec3::new(-0.1, -5.0, -5.1)), IVec3::new(-1, -1, -2));
    }

    #[test]
    fn add_then_remove_leaves_no_cells() {
        let mut grid = grid();
        let p = Vec3::new(3.0, -7.0, 12.0);

        grid.add(p, 7);
        assert_eq!(grid.cell_count(), 1);
        assert!(grid.remove(p, 7));

        assert!(grid.is_empty());
        assert_eq!(grid.cell_count(), 0);
    }

    #[test]
    fn readding_in_the_same_cell_does_not_duplicate() {
        let mut grid = grid();
        grid.add(Vec3::new(1.0, 1.0, 1.0), 3);
        grid.add(Vec3::new(2.0, 2.0, 2.0), 3);

        let mut near = Vec::new();
        grid.find_near(Vec3::ZERO, &mut near);
        assert_eq!(near, vec![3]);
    }

    #[test]
    fn adding_elsewhere_moves_the_handle() {
        let mut grid = grid();
        let p1 = Vec3::new(1.0, 1.0, 1.0);
        let p2 = Vec3::new(51.0, 1.0, 1.0);

        grid.add(p1, 0);
        grid.add(p1, 1);
        grid.add(p2, 0);

        assert_eq!(grid.cell(grid.cell_of(p1)), &[1]);
        assert_eq!(grid.cell(grid.cell_of(p2)), &[0]);
        assert_eq!(grid.location(0), Some(grid.cell_of(p2)));
        assert_eq!(grid.cell_count(), 2);
    }

    #[test]
    fn remove_with_stale_position_uses_recorded_cell() {
        let mut grid = grid();
        grid.add(Vec3::new(1.0, 1.0, 1.0), 9);

        assert!(grid.remove(Vec3::new(80.0, 0.0, 0.0), 9));
        assert!(grid.is_empty());
        assert_eq!(grid.cell_count(), 0);
    }

    #[test]
    fn remove_of_unknown_handle_is_a_no_op() {
        let mut grid = grid();
        grid.add(Vec3::ZERO, 1);
        assert!(!grid.remove(Vec3::ZERO, 2));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn relocate_tracks_cell_changes() {
        let mut grid = grid();
        let a = Vec3::new(1.0, 1.0, 1.0);
        let b = Vec3::new(2.0, 2.0, 2.0);
        let c = Vec3::new(-20.0, 2.0, 2.0);

        grid.add(a, 4);
        grid.relocate(a, b, 4);
        assert_eq!(grid.location(4), Some(grid.cell_of(a)));

        grid.relocate(b, c, 4);
        assert_eq!(grid.location(4), Some(grid.cell_of(c)));
        assert_eq!(grid.cell_count(), 1);
    }

    #[test]
    fn find_near_visits_the_surrounding_block_only() {
        let mut grid = grid();
        grid.add(Vec3::new(2.0, 2.0, 2.0), 0); // cell (0,0,0)
        grid.add(Vec3::new(7.0, -3.0, 9.0), 1); // cell (1,-1,1)
        grid.add(Vec3::new(12.0, 2.0, 2.0), 2); // cell (2,0,0), outside offset 1

        let mut near = Vec::new();
        grid.find_near(Vec3::new(1.0, 1.0, 1.0), &mut near);
        near.sort_unstable();
        assert_eq!(near, vec![0, 1]);
    }

    #[test]
    fn reset_clears_both_maps() {
        let mut grid = grid();
        for i in 0..10 {
            grid.add(Vec3::splat(i as f32 * 3.0), i);
        }
        grid.reset();
        assert!(grid.is_empty());
        assert_eq!(grid.cell_count(), 0);
        assert!(!grid.contains(0));
    }
}
