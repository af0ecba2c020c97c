// Core types shared across the simulation.
//
// Defines the grid resolution (`CELL_SIZE`), the quantization rule that maps
// continuous world coordinates onto cells, the integer cell key used as the
// `VoxelGrid` map key, block materials, and the block record itself. All
// types derive `Serialize` and `Deserialize` so they can ride along in events
// and snapshots.
//
// Coordinate conventions:
// - World space is continuous `f32`, Y up, right-handed (-Z is "forward" at
//   yaw 0).
// - A cell is `CELL_SIZE` world units on each axis. Cell key `(i, j, k)`
//   names the cell whose quantized world position is `(i*S, j*S, k*S)`.
// - A block's cube is centred on its quantized position and extends
//   `CELL_SIZE / 2` to each side. Collision and picking use this geometry;
//   grid lookups by raw coordinate use `floor(v / S)`.
//
// See also: `grid.rs` for the map keyed by `CellKey`, `terrain.rs` which
// emits `(CellKey, BlockType)` pairs, `persist.rs` for the snapshot form.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Grid resolution and quantization
// ---------------------------------------------------------------------------

/// Edge length of one cell in world units. Each cell holds at most one block.
pub const CELL_SIZE: f32 = 10.0;

/// Half of `CELL_SIZE`: distance from a block's centre to any of its faces.
pub const HALF_CELL: f32 = CELL_SIZE / 2.0;

/// Largest absolute world coordinate a pose may hold. Cell indices within
/// this bound, and their integer world positions, stay well inside `i32`.
pub const WORLD_LIMIT: f32 = 1.0e9;

/// Quantize a continuous coordinate to its containing cell's world-space key:
/// `floor(v / S) * S`.
///
/// Idempotent: `quantize(quantize(v)) == quantize(v)` for all finite `v`
/// whose cell index is exactly representable.
pub fn quantize(v: f32) -> f32 {
    (v / CELL_SIZE).floor() * CELL_SIZE
}

/// Cell index along one axis for a continuous coordinate.
fn cell_index(v: f32) -> i32 {
    // Saturating float-to-int cast; NaN maps to 0.
    (v / CELL_SIZE).floor() as i32
}

// ---------------------------------------------------------------------------
// Cell key
// ---------------------------------------------------------------------------

/// Integer identity of a grid cell, in cell units (world coordinate / S).
///
/// Used as the `VoxelGrid` map key. Structured integers rather than a
/// formatted string: hashing and equality are exact and independent of how
/// a float happens to print.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellKey {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The cell containing a world-space point (floor quantization).
    pub fn containing(pos: Vec3) -> Self {
        Self::new(cell_index(pos.x), cell_index(pos.y), cell_index(pos.z))
    }

    /// The cell whose quantized position is exactly the given world-space
    /// lattice point. Non-lattice inputs are floored like `containing`.
    pub fn from_world(pos: IVec3) -> Self {
        Self::new(
            pos.x.div_euclid(CELL_SIZE as i32),
            pos.y.div_euclid(CELL_SIZE as i32),
            pos.z.div_euclid(CELL_SIZE as i32),
        )
    }

    /// Quantized world position as integers (`index * S`).
    pub fn world(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z) * CELL_SIZE as i32
    }

    /// Quantized world position as floats. This is also the centre of the
    /// block's cube.
    pub fn center(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32) * CELL_SIZE
    }

    /// Neighbouring key, or `None` if it would leave the `i32` index range.
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
        Some(Self::new(
            self.x.checked_add(dx)?,
            self.y.checked_add(dy)?,
            self.z.checked_add(dz)?,
        ))
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = self.world();
        write!(f, "({}, {}, {})", w.x, w.y, w.z)
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// The material of a block.
///
/// Serialized as lowercase names (`"stone"`, `"dirt"`, ...), which is also
/// the form stored as the persisted `selectedBlock`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Stone,
    #[default]
    Dirt,
    Grass,
    Sand,
    Wood,
}

impl BlockType {
    /// All block types in hotkey order (`1` = Stone ... `5` = Wood).
    pub const ALL: [BlockType; 5] = [
        BlockType::Stone,
        BlockType::Dirt,
        BlockType::Grass,
        BlockType::Sand,
        BlockType::Wood,
    ];

    /// Map a selection hotkey (1–5) to a block type.
    pub fn from_hotkey(key: u8) -> Option<Self> {
        key.checked_sub(1)
            .and_then(|i| Self::ALL.get(i as usize))
            .copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockType::Stone => "stone",
            BlockType::Dirt => "dirt",
            BlockType::Grass => "grass",
            BlockType::Sand => "sand",
            BlockType::Wood => "wood",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single block. Identity is its cell; the grid owns every block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub key: CellKey,
    pub block_type: BlockType,
    /// Mine actions on this block are rejected.
    pub indestructible: bool,
}

impl Block {
    /// Quantized world position (also the cube centre).
    pub fn position(&self) -> Vec3 {
        self.key.center()
    }
}

// ---------------------------------------------------------------------------
// Simulation enums
// ---------------------------------------------------------------------------

/// Top-level run state, toggled by the pause input edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Running,
    Paused,
}

impl RunState {
    pub fn toggled(self) -> Self {
        match self {
            RunState::Running => RunState::Paused,
            RunState::Paused => RunState::Running,
        }
    }
}
