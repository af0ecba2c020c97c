// Sparse voxel grid: the world's spatial truth.
//
// Blocks are stored in an `FxHashMap<CellKey, Block>`: O(1) insert, remove
// and lookup, memory proportional to the number of blocks rather than the
// world's extent. The key is the integer cell triple from `types.rs`, so two
// callers naming the same cell (one by a raw world coordinate, one by the
// intended lattice point) always agree.
//
// Invariants:
// - At most one block per cell. Inserting into an occupied cell is a no-op
//   that reports `false` (first writer wins).
// - `remove` refuses indestructible blocks and reports `None`.
// - Iteration order of `all()` is unspecified but stable for a given
//   sequence of mutations (FxHash has no random seed). Callers that need an
//   order (snapshots, collision) impose one themselves.
//
// Also provides `raycast()`, a 3D DDA (Amanatides & Woo) traversal over
// block-centred cells, used to pick the block under the crosshair for build
// and mine actions.
//
// See also: `types.rs` for `CellKey`/quantization, `collision.rs` which reads
// the grid each tick, `terrain.rs` for the initial fill, `persist.rs` for
// bulk replace on load.
//
// All mutation happens on the tick thread between resolver passes; the
// resolver only ever holds `&VoxelGrid`.

use crate::types::{Block, BlockType, CellKey, CELL_SIZE, HALF_CELL};
use glam::{IVec3, Vec3};
use rustc_hash::FxHashMap;

/// Result of a successful `raycast`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// The first occupied cell along the ray.
    pub key: CellKey,
    /// Distance from the ray origin to the entry point.
    pub distance: f32,
    /// Outward normal of the face the ray entered through, as a unit axis.
    /// `None` when the origin is already inside the block.
    pub normal: Option<IVec3>,
}

/// Sparse map from cell to block.
#[derive(Clone, Debug, Default)]
pub struct VoxelGrid {
    blocks: FxHashMap<CellKey, Block>,
}

impl VoxelGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Quantize `pos` and create a block there. Returns `false` without
    /// changing anything if the cell is occupied.
    pub fn insert(&mut self, pos: Vec3, block_type: BlockType, indestructible: bool) -> bool {
        self.insert_cell(CellKey::containing(pos), block_type, indestructible)
    }

    /// Create a block in the given cell. Returns `false` if occupied.
    pub fn insert_cell(&mut self, key: CellKey, block_type: BlockType, indestructible: bool) -> bool {
        if self.blocks.contains_key(&key) {
            return false;
        }
        self.blocks.insert(
            key,
            Block {
                key,
                block_type,
                indestructible,
            },
        );
        true
    }

    /// Remove and return the block in the cell containing `pos`. Returns
    /// `None` (and leaves the grid unchanged) if the cell is empty or the
    /// block is indestructible.
    pub fn remove(&mut self, pos: Vec3) -> Option<Block> {
        self.remove_cell(CellKey::containing(pos))
    }

    pub fn remove_cell(&mut self, key: CellKey) -> Option<Block> {
        match self.blocks.get(&key) {
            Some(block) if !block.indestructible => self.blocks.remove(&key),
            _ => None,
        }
    }

    /// The block in the cell containing `pos`.
    pub fn get(&self, pos: Vec3) -> Option<Block> {
        self.get_cell(CellKey::containing(pos)).copied()
    }

    pub fn get_cell(&self, key: CellKey) -> Option<&Block> {
        self.blocks.get(&key)
    }

    pub fn contains_cell(&self, key: CellKey) -> bool {
        self.blocks.contains_key(&key)
    }

    /// Every block, lazily. Restartable: each call yields a fresh iterator.
    pub fn all(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks.values()
    }

    /// Remove every block, including indestructible ones.
    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Clear the grid and insert the given blocks. Later duplicates of an
    /// already-filled cell are dropped. Returns the number of blocks stored.
    pub fn replace_all<I>(&mut self, blocks: I) -> usize
    where
        I: IntoIterator<Item = Block>,
    {
        self.clear();
        for block in blocks {
            self.insert_cell(block.key, block.block_type, block.indestructible);
        }
        self.len()
    }

    /// 3D DDA raycast over block cubes. Returns the first occupied cell
    /// whose cube the ray enters within `max_distance`.
    ///
    /// Traversal happens in block-centred cell space: cell `i` on an axis
    /// spans `[i*S - S/2, i*S + S/2)` in world units, matching the geometry
    /// used by rendering and collision. `direction` need not be normalized;
    /// a zero or non-finite direction never hits.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let dir = direction.try_normalize()?;
        if !origin.is_finite() || !max_distance.is_finite() || max_distance < 0.0 {
            return None;
        }

        // Origin in cell units, shifted so that cell boundaries are integers.
        let local = (origin + Vec3::splat(HALF_CELL)) / CELL_SIZE;
        let o = local.to_array();
        let d = dir.to_array();

        let mut cell = [
            o[0].floor() as i32,
            o[1].floor() as i32,
            o[2].floor() as i32,
        ];

        // Step direction and t_max/t_delta per axis, with t in world units.
        let mut step = [0i32; 3];
        let mut t_max = [f32::INFINITY; 3];
        let mut t_delta = [f32::INFINITY; 3];
        for axis in 0..3 {
            if d[axis] > 0.0 {
                step[axis] = 1;
                t_delta[axis] = CELL_SIZE / d[axis];
                t_max[axis] = ((cell[axis] as f32 + 1.0) - o[axis]) * CELL_SIZE / d[axis];
            } else if d[axis] < 0.0 {
                step[axis] = -1;
                t_delta[axis] = CELL_SIZE / -d[axis];
                t_max[axis] = (o[axis] - cell[axis] as f32) * CELL_SIZE / -d[axis];
            }
            // A zero component never advances: t_max stays infinite.
        }

        let mut distance = 0.0;
        let mut normal = None;
        loop {
            let key = CellKey::new(cell[0], cell[1], cell[2]);
            if self.blocks.contains_key(&key) {
                return Some(RayHit {
                    key,
                    distance,
                    normal,
                });
            }

            let axis = if t_max[0] <= t_max[1] && t_max[0] <= t_max[2] {
                0
            } else if t_max[1] <= t_max[2] {
                1
            } else {
                2
            };
            if t_max[axis] > max_distance {
                return None;
            }

            distance = t_max[axis];
            cell[axis] = cell[axis].checked_add(step[axis])?;
            t_max[axis] += t_delta[axis];
            let mut n = [0i32; 3];
            n[axis] = -step[axis];
            normal = Some(IVec3::from_array(n));
        }
    }
}
