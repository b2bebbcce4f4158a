/*
 * Octree Module
 *
 * This module defines an adaptive spatial index over a cubic volume. Nodes
 * live in a flat arena and refer to their children by index, so the tree is
 * a plain Vec that can be cleared and refilled every tick without touching
 * the allocator more than necessary.
 *
 * A leaf holds up to `cell_capacity` (position, handle) pairs. The insert
 * that would overflow it splits the leaf once into eight equal octants and
 * pushes its entries down. Nodes never merge back; the simulation rebuilds
 * the whole tree from current positions each tick instead.
 */

use glam::Vec3;
use tracing::trace;

// Axis-aligned box used for node bounds and query ranges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min: min.min(max), max: min.max(max) }
    }

    pub fn from_center_half_extent(center: Vec3, half_extent: Vec3) -> Self {
        Self::new(center - half_extent, center + half_extent)
    }

    // Cube of half-width `half_extent` centred on `point`
    pub fn around(point: Vec3, half_extent: f32) -> Self {
        Self::from_center_half_extent(point, Vec3::splat(half_extent))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn volume(&self) -> f32 {
        let size = self.size();
        size.x * size.y * size.z
    }

    // Inclusive on every face
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    // Child octant `i`: bit 0 selects the upper x half, bit 1 upper y, bit 2 upper z.
    // Children share the parent's centre exactly, so their union is the parent.
    pub fn octant(&self, i: usize) -> Aabb {
        let c = self.center();
        let pick = |bit: usize, lo: f32, mid: f32, hi: f32| {
            if i & bit == 0 {
                (lo, mid)
            } else {
                (mid, hi)
            }
        };
        let (x0, x1) = pick(1, self.min.x, c.x, self.max.x);
        let (y0, y1) = pick(2, self.min.y, c.y, self.max.y);
        let (z0, z1) = pick(4, self.min.z, c.z, self.max.z);
        Aabb { min: Vec3::new(x0, y0, z0), max: Vec3::new(x1, y1, z1) }
    }

    // Octant of this box that `point` falls into, decided against the centre
    // so a point on a shared face always has exactly one home
    #[inline]
    fn octant_index(&self, point: Vec3) -> usize {
        let c = self.center();
        (point.x >= c.x) as usize | ((point.y >= c.y) as usize) << 1 | ((point.z >= c.z) as usize) << 2
    }
}

#[derive(Debug, Clone)]
enum NodeKind<H> {
    Leaf(Vec<(Vec3, H)>),
    Internal([u32; 8]),
}

#[derive(Debug, Clone)]
struct Node<H> {
    bounds: Aabb,
    depth: u32,
    kind: NodeKind<H>,
}

// Bounds of one node, for drawing the tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeBounds {
    pub bounds: Aabb,
    pub depth: u32,
    pub is_leaf: bool,
    pub entries: usize,
}

#[derive(Debug, Clone)]
pub struct Octree<H> {
    nodes: Vec<Node<H>>,
    bounds: Aabb,
    cell_capacity: usize,
    max_depth: u32,
    query_half_extent: f32,
    len: usize,
    dropped: usize,
}

const ROOT: usize = 0;

impl<H: Copy> Octree<H> {
    pub fn new(bounds: Aabb, cell_capacity: usize, max_depth: u32, query_half_extent: f32) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            bounds,
            cell_capacity: cell_capacity.max(1),
            max_depth,
            query_half_extent,
            len: 0,
            dropped: 0,
        };
        tree.clear();
        tree
    }

    // Discard the whole tree and start over with an empty root leaf
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node { bounds: self.bounds, depth: 0, kind: NodeKind::Leaf(Vec::new()) });
        self.len = 0;
        self.dropped = 0;
    }

    // Store `handle` at `position`. Points outside the root volume (including
    // non-finite ones) cannot be placed in any leaf; they are counted and
    // skipped.
    pub fn insert(&mut self, position: Vec3, handle: H) -> bool {
        if !self.bounds.contains(position) {
            self.dropped += 1;
            trace!(?position, "octree dropped point outside root bounds");
            return false;
        }

        let mut index = ROOT;
        loop {
            let node = &mut self.nodes[index];
            match &mut node.kind {
                NodeKind::Internal(children) => {
                    index = children[node.bounds.octant_index(position)] as usize;
                }
                NodeKind::Leaf(entries) => {
                    if entries.len() < self.cell_capacity || node.depth >= self.max_depth {
                        entries.push((position, handle));
                        self.len += 1;
                        return true;
                    }
                    self.subdivide(index);
                }
            }
        }
    }

    // Split a full leaf into eight children and move its entries down. The
    // entries of one full leaf always fit in the children without a further
    // split, whatever octants they land in.
    fn subdivide(&mut self, index: usize) {
        let bounds = self.nodes[index].bounds;
        let depth = self.nodes[index].depth + 1;
        let first = self.nodes.len() as u32;

        let mut children = [0u32; 8];
        for (i, child) in children.iter_mut().enumerate() {
            *child = first + i as u32;
            self.nodes.push(Node { bounds: bounds.octant(i), depth, kind: NodeKind::Leaf(Vec::new()) });
        }

        let entries = match std::mem::replace(&mut self.nodes[index].kind, NodeKind::Internal(children)) {
            NodeKind::Leaf(entries) => entries,
            NodeKind::Internal(_) => unreachable!("only leaves are subdivided"),
        };

        for (position, handle) in entries {
            let child = children[bounds.octant_index(position)] as usize;
            if let NodeKind::Leaf(child_entries) = &mut self.nodes[child].kind {
                child_entries.push((position, handle));
            }
        }
    }

    // Append every handle whose stored position lies inside `range`
    pub fn query(&self, range: &Aabb, out: &mut Vec<H>) {
        let mut stack = vec![ROOT];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !node.bounds.intersects(range) {
                continue;
            }
            match &node.kind {
                NodeKind::Internal(children) => stack.extend(children.iter().map(|&c| c as usize)),
                NodeKind::Leaf(entries) => out.extend(
                    entries
                        .iter()
                        .filter(|(position, _)| range.contains(*position))
                        .map(|&(_, handle)| handle),
                ),
            }
        }
    }

    // Box query of half-width query_half_extent around `position`
    pub fn find_near(&self, position: Vec3, out: &mut Vec<H>) {
        self.query(&Aabb::around(position, self.query_half_extent), out);
    }

    // Walk the tree and report every node's bounds, root first
    pub fn node_bounds(&self) -> Vec<NodeBounds> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![ROOT];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            let (is_leaf, entries) = match &node.kind {
                NodeKind::Leaf(entries) => (true, entries.len()),
                NodeKind::Internal(children) => {
                    stack.extend(children.iter().rev().map(|&c| c as usize));
                    (false, 0)
                }
            };
            out.push(NodeBounds { bounds: node.bounds, depth: node.depth, is_leaf, entries });
        }
        out
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n.kind, NodeKind::Leaf(_))).count()
    }

    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    // Points rejected since the last clear()
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn cell_capacity(&self) -> usize {
        self.cell_capacity
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn query_half_extent(&self) -> f32 {
        self.query_half_extent
    }
}
