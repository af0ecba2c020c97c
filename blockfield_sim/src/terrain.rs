// Procedural terrain generation.
//
// Produces the initial block layout from a sine height field:
//
//   h(x) = amplitude * sin(x * frequency) + base_height
//
// For every `(x, z)` on the step lattice inside the configured ranges, a
// column is emitted from y=0 upward in `step` increments while `y < h`. The
// topmost block of each column is Grass, the band below it (one step) is
// Dirt, and everything beneath is Stone. With `bedrock_floor` set, the y=0
// layer is indestructible.
//
// Generation is a pure function of `TerrainConfig`: the same config always
// yields the same blocks in the same order, so a world can be regenerated
// for tests or as the fallback when no save exists.
//
// See also: `config.rs` for `TerrainConfig`, `grid.rs` for the grid being
// filled, `sim.rs` which calls `fill_grid()` on a fresh world.

use crate::config::TerrainConfig;
use crate::grid::VoxelGrid;
use crate::types::{Block, BlockType, CellKey};
use glam::IVec3;

/// Column height at world X.
pub fn column_height(config: &TerrainConfig, x: i32) -> f32 {
    config.amplitude * (x as f32 * config.frequency).sin() + config.base_height
}

/// Material for a block at height `y` in a column of height `h`.
fn classify(y: i32, h: f32, step: i32) -> BlockType {
    if (y + step) as f32 >= h {
        BlockType::Grass
    } else if (y + 2 * step) as f32 >= h {
        BlockType::Dirt
    } else {
        BlockType::Stone
    }
}

fn lattice((lo, hi): (i32, i32), step: i32) -> impl Iterator<Item = i32> {
    (lo..=hi).step_by(step as usize)
}

/// One column of blocks at `(x, z)`, bottom to top.
fn column(config: &TerrainConfig, x: i32, z: i32) -> impl Iterator<Item = Block> + use<> {
    let step = config.step.max(1);
    let h = column_height(config, x);
    let bedrock = config.bedrock_floor;
    (0..)
        .step_by(step as usize)
        .take_while(move |&y| (y as f32) < h)
        .map(move |y| Block {
            key: CellKey::from_world(IVec3::new(x, y, z)),
            block_type: classify(y, h, step),
            indestructible: bedrock && y == 0,
        })
}

/// Lazily generate every terrain block for the given config.
pub fn generate(config: &TerrainConfig) -> impl Iterator<Item = Block> + '_ {
    let step = config.step.max(1);
    lattice(config.x_range, step).flat_map(move |x| {
        lattice(config.z_range, step).flat_map(move |z| column(config, x, z))
    })
}

/// Generate terrain into `grid`. Cells that are already occupied keep their
/// block. Returns the number of blocks inserted.
pub fn fill_grid(grid: &mut VoxelGrid, config: &TerrainConfig) -> usize {
    let inserted = generate(config)
        .filter(|b| grid.insert_cell(b.key, b.block_type, b.indestructible))
        .count();
    log::info!(
        "terrain: generated {inserted} blocks over x {:?}, z {:?}",
        config.x_range,
        config.z_range
    );
    inserted
}
