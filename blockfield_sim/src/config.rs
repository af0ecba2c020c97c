// Data-driven game configuration.
//
// All tunable simulation parameters live here in `GameConfig`, loadable from
// JSON. The tick code reads thresholds and rates from the config rather than
// embedding them, so a driver can adjust feel (gravity, jump height, pick
// reach) without recompiling. Every group is `#[serde(default)]`: a config
// file only needs the fields it overrides.
//
// Groups:
// - `TerrainConfig`:     height-field parameters and lattice extent.
// - `PhysicsConfig`:     gravity, movement, jump, and the collision resolver's
//                        thresholds (see `collision.rs` for how they combine).
// - `InteractionConfig`: pick reach and build clearance.
// - `PersistenceConfig`: checkpoint cadence and the store key.
//
// See also: `sim.rs` which owns the `GameConfig` as part of `WorldState`,
// `terrain.rs`, `collision.rs`, `avatar.rs` for the consumers.
//
// The grid resolution itself is not configurable (`types::CELL_SIZE`); the
// collision thresholds below are expressed in the same world units.

use crate::error::ConfigError;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Procedural terrain parameters. Height at column `x` is
/// `amplitude * sin(x * frequency) + base_height`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Inclusive world-space X range of generated columns.
    pub x_range: (i32, i32),
    /// Inclusive world-space Z range of generated columns.
    pub z_range: (i32, i32),
    /// Lattice step in world units, both horizontally and vertically.
    pub step: i32,
    pub amplitude: f32,
    pub frequency: f32,
    pub base_height: f32,
    /// Generate the y=0 layer as indestructible so the world cannot be dug
    /// through.
    pub bedrock_floor: bool,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            x_range: (-200, 200),
            z_range: (-200, 200),
            step: 10,
            amplitude: 20.0,
            frequency: 0.02,
            base_height: 30.0,
            bedrock_floor: true,
        }
    }
}

/// Avatar kinematics and collision thresholds, all per tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Subtracted from vertical velocity every tick.
    pub gravity: f32,
    /// Vertical velocity set by a jump.
    pub jump_velocity: f32,
    /// Distance per tick contributed by each held movement key.
    pub move_speed: f32,
    /// Radians of yaw/pitch per unit of pointer delta.
    pub look_sensitivity: f32,
    /// Blocks with `|dx|` and `|dz|` below this overlap the avatar
    /// horizontally for the vertical pass.
    pub horizontal_overlap: f32,
    /// Blocks with `|dy|` at most this are considered by the vertical pass.
    pub vertical_reach: f32,
    /// `dy` must be at least this (above) or at most its negation (below)
    /// for a floor or ceiling snap.
    pub landing_threshold: f32,
    /// Distance from a block centre to the avatar centre after a floor or
    /// ceiling snap.
    pub snap_offset: f32,
    /// Half-extent of the cube the horizontal pass pushes the avatar out of.
    pub push_extent: f32,
    /// Falling below this Y triggers a respawn.
    pub fall_floor: f32,
    pub spawn_point: Vec3,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.25,
            jump_velocity: 4.5,
            move_speed: 0.3,
            look_sensitivity: 0.01,
            horizontal_overlap: 10.0,
            vertical_reach: 20.0,
            landing_threshold: 8.0,
            snap_offset: 15.0,
            push_extent: 10.0,
            fall_floor: -100.0,
            spawn_point: Vec3::new(0.0, 50.0, 0.0),
        }
    }
}

/// Build/mine parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Maximum pick distance from the avatar.
    pub reach: f32,
    /// Builds whose block centre lies closer than this to the avatar centre
    /// are rejected as out of range.
    pub build_clearance: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            reach: 100.0,
            build_clearance: 10.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Ticks between periodic checkpoint saves. Zero disables them.
    pub checkpoint_interval_ticks: u64,
    /// Key under which the snapshot is stored.
    pub store_key: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval_ticks: 60,
            store_key: "blockfield.save".to_string(),
        }
    }
}

/// Complete game configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Simulation ticks per second of wall time, used by real-time pacing.
    pub tick_rate_hz: u32,
    pub terrain: TerrainConfig,
    pub physics: PhysicsConfig,
    pub interaction: InteractionConfig,
    pub persistence: PersistenceConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            terrain: TerrainConfig::default(),
            physics: PhysicsConfig::default(),
            interaction: InteractionConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
