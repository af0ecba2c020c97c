// Per-tick collision resolution between the avatar and the voxel grid.
//
// Runs after movement and gravity have been integrated, as two ordered
// passes. Offsets are avatar-relative: `d = avatar.position - block.position`
// with both points being centres.
//
// 1. Vertical pass. `on_ground` is cleared, then for each block with
//    `|dx| < horizontal_overlap`, `|dz| < horizontal_overlap` and
//    `|dy| <= vertical_reach`:
//    - `dy >= landing_threshold` and not rising: snap to
//      `block.y + snap_offset`, zero vertical velocity, set `on_ground`.
//    - `dy <= -landing_threshold` and rising: snap to `block.y - snap_offset`,
//      zero vertical velocity (head hit a ceiling).
//    Only exposed faces count: a block with another block directly above
//    it is never a floor, and one with a block directly below is never a
//    ceiling. The landing window `[landing_threshold, vertical_reach]` is
//    wider than any per-tick fall reachable from the spawn height, so a
//    descending avatar cannot pass through a block top between two ticks,
//    and in a column it is always the top block that catches it.
//
// 2. Horizontal pass. For each block whose cube of half-extent `push_extent`
//    contains the avatar centre, push the avatar out along X or Z, whichever
//    has the smaller penetration (`push_extent - |d|`), snapping that
//    coordinate to `block ± push_extent` on the side the avatar is on. Ties
//    go to X. One axis per block per tick.
//
// Known limitation: the horizontal pass is greedy per block and per axis.
// At exact corners, or at speeds above `push_extent` per tick, the avatar
// can end on the far side of a block or remain inside one until the next
// tick. For the same reason `resolve` is not idempotent around corners: a
// push can carry the avatar into the landing window of a block it was
// clear of, and a second call then snaps it. Away from corners a second
// call is a no-op. Both behaviors are covered as such in tests.
//
// Candidates are the blocks in a fixed neighbourhood around the avatar's
// position at the start of each pass, visited in ascending `CellKey` order,
// with every test evaluated against the avatar's current (possibly already
// snapped) position. The resolver never mutates the grid.
//
// See also: `avatar.rs` for the tick sequence that calls `resolve()`,
// `config.rs` for the thresholds.

use crate::avatar::AvatarState;
use crate::config::PhysicsConfig;
use crate::grid::VoxelGrid;
use crate::types::{Block, CELL_SIZE, CellKey};
use glam::Vec3;
use smallvec::SmallVec;

type Candidates = SmallVec<[Block; 32]>;

/// What the resolver did this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Contacts {
    /// Snapped onto a block top.
    pub landed: bool,
    /// Snapped below a block bottom.
    pub ceiling: bool,
    /// Number of horizontal push-outs applied.
    pub pushes: u32,
}

/// Cell index range whose block centres lie within `reach` of `c`.
fn axis_range(c: f32, reach: f32) -> std::ops::RangeInclusive<i32> {
    let lo = ((c - reach) / CELL_SIZE).ceil() as i32;
    let hi = ((c + reach) / CELL_SIZE).floor() as i32;
    lo..=hi
}

/// Blocks whose centres lie within the given reach of `center`, in
/// ascending key order.
fn gather(grid: &VoxelGrid, center: Vec3, reach_xz: f32, reach_y: f32) -> Candidates {
    let mut out = Candidates::new();
    if !center.is_finite() {
        return out;
    }
    for x in axis_range(center.x, reach_xz) {
        for y in axis_range(center.y, reach_y) {
            for z in axis_range(center.z, reach_xz) {
                if let Some(block) = grid.get_cell(CellKey::new(x, y, z)) {
                    out.push(*block);
                }
            }
        }
    }
    out
}

/// True if the face of `key` toward `dy` is buried under another block.
fn covered(grid: &VoxelGrid, key: CellKey, dy: i32) -> bool {
    key.offset(0, dy, 0).is_some_and(|k| grid.contains_cell(k))
}

/// Floor and ceiling snapping.
pub fn resolve_vertical(
    avatar: &mut AvatarState,
    grid: &VoxelGrid,
    config: &PhysicsConfig,
) -> Contacts {
    let mut contacts = Contacts::default();
    avatar.on_ground = false;

    // One cell of slack covers the drift of earlier snaps in this pass.
    let candidates = gather(
        grid,
        avatar.position,
        config.horizontal_overlap + CELL_SIZE,
        config.vertical_reach + CELL_SIZE,
    );
    for block in &candidates {
        let b = block.position();
        let d = avatar.position - b;
        if d.x.abs() >= config.horizontal_overlap
            || d.z.abs() >= config.horizontal_overlap
            || d.y.abs() > config.vertical_reach
        {
            continue;
        }
        if d.y >= config.landing_threshold && avatar.velocity.y <= 0.0 {
            if covered(grid, block.key, 1) {
                continue;
            }
            avatar.position.y = b.y + config.snap_offset;
            avatar.velocity.y = 0.0;
            avatar.on_ground = true;
            contacts.landed = true;
        } else if d.y <= -config.landing_threshold && avatar.velocity.y > 0.0 {
            if covered(grid, block.key, -1) {
                continue;
            }
            avatar.position.y = b.y - config.snap_offset;
            avatar.velocity.y = 0.0;
            contacts.ceiling = true;
        }
    }
    contacts
}

/// Push the avatar centre out of any block cube it sits inside.
pub fn resolve_horizontal(
    avatar: &mut AvatarState,
    grid: &VoxelGrid,
    config: &PhysicsConfig,
) -> u32 {
    let e = config.push_extent;
    let candidates = gather(grid, avatar.position, e + CELL_SIZE, e + CELL_SIZE);
    let mut pushes = 0;
    for block in &candidates {
        let b = block.position();
        let d = avatar.position - b;
        if d.x.abs() >= e || d.y.abs() >= e || d.z.abs() >= e {
            continue;
        }
        let pen_x = e - d.x.abs();
        let pen_z = e - d.z.abs();
        if pen_x <= pen_z {
            avatar.position.x = if d.x >= 0.0 { b.x + e } else { b.x - e };
        } else {
            avatar.position.z = if d.z >= 0.0 { b.z + e } else { b.z - e };
        }
        pushes += 1;
    }
    pushes
}

/// Both passes, vertical first.
pub fn resolve(avatar: &mut AvatarState, grid: &VoxelGrid, config: &PhysicsConfig) -> Contacts {
    let mut contacts = resolve_vertical(avatar, grid, config);
    contacts.pushes = resolve_horizontal(avatar, grid, config);
    if contacts != Contacts::default() {
        log::trace!("collision: {contacts:?} -> {}", avatar.position);
    }
    contacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockType;

    fn grid_with(cells: &[(i32, i32, i32)]) -> VoxelGrid {
        let mut grid = VoxelGrid::new();
        for &(x, y, z) in cells {
            grid.insert_cell(CellKey::new(x, y, z), BlockType::Stone, false);
        }
        grid
    }

    fn avatar_at(x: f32, y: f32, z: f32, vy: f32) -> AvatarState {
        let mut a = AvatarState::at(Vec3::new(x, y, z));
        a.velocity.y = vy;
        a
    }

    #[test]
    fn ground_snap_from_twenty_units_above() {
        let grid = grid_with(&[(0, 0, 0)]);
        let mut avatar = avatar_at(0.0, 20.0, 0.0, -2.0);
        let contacts = resolve(&mut avatar, &grid, &PhysicsConfig::default());
        assert_eq!(avatar.position.y, 15.0);
        assert_eq!(avatar.velocity.y, 0.0);
        assert!(avatar.on_ground);
        assert!(contacts.landed);
    }

    #[test]
    fn rising_avatar_does_not_land() {
        let grid = grid_with(&[(0, 0, 0)]);
        let mut avatar = avatar_at(0.0, 18.0, 0.0, 3.0);
        resolve(&mut avatar, &grid, &PhysicsConfig::default());
        assert_eq!(avatar.position.y, 18.0);
        assert_eq!(avatar.velocity.y, 3.0);
        assert!(!avatar.on_ground);
    }

    #[test]
    fn out_of_reach_block_is_ignored() {
        let grid = grid_with(&[(0, 0, 0)]);
        let mut avatar = avatar_at(0.0, 20.5, 0.0, -2.0);
        resolve(&mut avatar, &grid, &PhysicsConfig::default());
        assert_eq!(avatar.position.y, 20.5);
        assert!(!avatar.on_ground);
    }

    #[test]
    fn horizontal_overlap_is_strict() {
        let grid = grid_with(&[(0, 0, 0)]);
        // Exactly one overlap width away: no contact.
        let mut avatar = avatar_at(10.0, 18.0, 0.0, -1.0);
        resolve_vertical(&mut avatar, &grid, &PhysicsConfig::default());
        assert_eq!(avatar.position.y, 18.0);
        // Just inside: lands.
        let mut avatar = avatar_at(9.9, 18.0, 0.0, -1.0);
        resolve_vertical(&mut avatar, &grid, &PhysicsConfig::default());
        assert_eq!(avatar.position.y, 15.0);
    }

    #[test]
    fn ceiling_hit_stops_ascent() {
        let grid = grid_with(&[(0, 3, 0)]);
        // Block centre at y=30; avatar 12 below and rising.
        let mut avatar = avatar_at(0.0, 18.0, 0.0, 4.0);
        let contacts = resolve(&mut avatar, &grid, &PhysicsConfig::default());
        assert!(contacts.ceiling);
        assert_eq!(avatar.position.y, 15.0);
        assert_eq!(avatar.velocity.y, 0.0);
        assert!(!avatar.on_ground);
    }

    #[test]
    fn on_ground_clears_when_unsupported() {
        let grid = VoxelGrid::new();
        let mut avatar = avatar_at(0.0, 15.0, 0.0, 0.0);
        avatar.on_ground = true;
        resolve(&mut avatar, &grid, &PhysicsConfig::default());
        assert!(!avatar.on_ground);
    }

    #[test]
    fn horizontal_push_prefers_shallower_axis() {
        let grid = grid_with(&[(0, 0, 0)]);
        // Penetration along X is 2, along Z is 7: push along X.
        let mut avatar = avatar_at(8.0, 0.0, 3.0, 0.0);
        let pushes = resolve_horizontal(&mut avatar, &grid, &PhysicsConfig::default());
        assert_eq!(pushes, 1);
        assert_eq!(avatar.position, Vec3::new(10.0, 0.0, 3.0));

        // Penetration along Z is smaller on the negative side.
        let mut avatar = avatar_at(1.0, 0.0, -9.0, 0.0);
        resolve_horizontal(&mut avatar, &grid, &PhysicsConfig::default());
        assert_eq!(avatar.position, Vec3::new(1.0, 0.0, -10.0));
    }

    #[test]
    fn horizontal_tie_prefers_x() {
        let grid = grid_with(&[(0, 0, 0)]);
        let mut avatar = avatar_at(-6.0, 2.0, 6.0, 0.0);
        resolve_horizontal(&mut avatar, &grid, &PhysicsConfig::default());
        assert_eq!(avatar.position, Vec3::new(-10.0, 2.0, 6.0));
    }

    #[test]
    fn centred_avatar_pushes_toward_positive_x() {
        let grid = grid_with(&[(0, 0, 0)]);
        let mut avatar = avatar_at(0.0, 0.0, 0.0, 0.0);
        resolve_horizontal(&mut avatar, &grid, &PhysicsConfig::default());
        assert_eq!(avatar.position, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn horizontal_pass_ignores_blocks_above_and_below() {
        let grid = grid_with(&[(0, 0, 0)]);
        let mut avatar = avatar_at(3.0, 10.0, 3.0, 0.0);
        assert_eq!(resolve_horizontal(&mut avatar, &grid, &PhysicsConfig::default()), 0);
        assert_eq!(avatar.position, Vec3::new(3.0, 10.0, 3.0));
    }

    #[test]
    fn column_is_caught_by_its_top_block() {
        // Block centres at y=0 and y=10; the top face is at y=15.
        let grid = grid_with(&[(0, 0, 0), (0, 1, 0)]);
        let config = PhysicsConfig::default();
        for y in [19.0, 22.0, 28.0, 30.0] {
            let mut avatar = avatar_at(0.0, y, 0.0, -1.0);
            let contacts = resolve(&mut avatar, &grid, &config);
            assert_eq!(avatar.position, Vec3::new(0.0, 25.0, 0.0), "from y={y}");
            assert!(avatar.on_ground);
            assert_eq!(contacts.pushes, 0);
        }
    }

    #[test]
    fn fast_fall_onto_column_stays_on_top() {
        let grid = grid_with(&[(0, 0, 0), (0, 1, 0)]);
        let config = PhysicsConfig::default();
        let mut avatar = avatar_at(0.0, 31.0, 0.0, -11.75);
        crate::avatar::step(&mut avatar, &crate::input::InputSnapshot::idle(), &grid, &config);
        for _ in 0..5 {
            assert_eq!(avatar.position, Vec3::new(0.0, 25.0, 0.0));
            assert!(avatar.on_ground);
            crate::avatar::step(&mut avatar, &crate::input::InputSnapshot::idle(), &grid, &config);
        }
    }

    #[test]
    fn ceiling_is_the_bottom_of_an_overhang() {
        // Blocks at y=30 and y=40; rising into the lower one from below.
        // The upper block's bottom face is buried and never counts.
        let grid = grid_with(&[(0, 3, 0), (0, 4, 0)]);
        let mut avatar = avatar_at(0.0, 19.0, 0.0, 4.0);
        let contacts = resolve(&mut avatar, &grid, &PhysicsConfig::default());
        assert!(contacts.ceiling);
        assert_eq!(avatar.position.y, 15.0);

        let mut inside = avatar_at(0.0, 27.0, 0.0, 4.0);
        let contacts = resolve_vertical(&mut inside, &grid, &PhysicsConfig::default());
        assert!(!contacts.ceiling);
        assert_eq!(inside.position.y, 27.0);
        assert_eq!(inside.velocity.y, 4.0);
    }

    #[test]
    fn resolver_is_idempotent() {
        // Starts away from exact footprint centres and corners.
        let grid = grid_with(&[(0, 0, 0), (1, 0, 0), (1, 1, 0), (0, 0, 1)]);
        let config = PhysicsConfig::default();
        let starts = [
            avatar_at(0.0, 20.0, 0.0, -2.0),
            avatar_at(5.0, 17.0, 2.0, -0.5),
            avatar_at(4.0, 10.0, 0.0, 0.0),
            avatar_at(-3.0, 12.0, 14.0, -6.0),
            avatar_at(2.0, 40.0, 2.0, -1.0),
        ];
        for start in starts {
            let mut once = start.clone();
            resolve(&mut once, &grid, &config);
            let mut twice = once.clone();
            resolve(&mut twice, &grid, &config);
            assert_eq!(once.position, twice.position, "position changed from {start:?}");
            assert_eq!(once.velocity, twice.velocity, "velocity changed from {start:?}");
        }
    }

    #[test]
    fn push_can_open_a_landing_for_the_next_call() {
        // Centred in a block's footprint, the tie push carries the avatar
        // onto the column of a neighbour it was clear of. Only a second
        // call lands it there.
        let grid = grid_with(&[(0, 1, 0), (1, 0, 0)]);
        let config = PhysicsConfig::default();
        let mut avatar = avatar_at(0.0, 12.0, 0.0, -1.0);
        let first = resolve(&mut avatar, &grid, &config);
        assert_eq!(avatar.position, Vec3::new(10.0, 12.0, 0.0));
        assert!(!first.landed);
        let second = resolve(&mut avatar, &grid, &config);
        assert!(second.landed);
        assert_eq!(avatar.position, Vec3::new(10.0, 15.0, 0.0));
    }

    #[test]
    fn resolver_does_not_touch_grid() {
        let grid = grid_with(&[(0, 0, 0), (0, 1, 0)]);
        let before: Vec<Block> = {
            let mut v: Vec<Block> = grid.all().copied().collect();
            v.sort_by_key(|b| b.key);
            v
        };
        let mut avatar = avatar_at(1.0, 5.0, 1.0, -3.0);
        resolve(&mut avatar, &grid, &PhysicsConfig::default());
        let mut after: Vec<Block> = grid.all().copied().collect();
        after.sort_by_key(|b| b.key);
        assert_eq!(before, after);
    }

    #[test]
    fn fast_diagonal_motion_can_tunnel() {
        // A thin wall one block thick. At 12 units/tick the avatar centre
        // jumps from one side to past the far face without ever being
        // inside the cube at a tick boundary, so nothing pushes it back.
        let grid = grid_with(&[(0, 0, 0)]);
        let config = PhysicsConfig::default();
        let mut avatar = avatar_at(-11.0, 0.0, 0.0, 0.0);
        avatar.position.x += 22.0;
        resolve_horizontal(&mut avatar, &grid, &config);
        assert_eq!(avatar.position.x, 11.0);
    }

    #[test]
    fn deep_penetration_exits_through_far_face() {
        // Entering 9 units deep on X: the shallower exit is the far face.
        let grid = grid_with(&[(0, 0, 0)]);
        let mut avatar = avatar_at(1.0, 0.0, 0.0, 0.0);
        resolve_horizontal(&mut avatar, &grid, &PhysicsConfig::default());
        assert_eq!(avatar.position.x, 10.0);
    }

    #[test]
    fn non_finite_position_is_left_alone() {
        let grid = grid_with(&[(0, 0, 0)]);
        let mut avatar = avatar_at(f32::NAN, 0.0, 0.0, 0.0);
        let contacts = resolve(&mut avatar, &grid, &PhysicsConfig::default());
        assert_eq!(contacts, Contacts::default());
    }
}
