// Snapshot persistence.
//
// A snapshot is the complete saved game: every block, the avatar pose and
// the selected block type, serialized as one JSON document:
//
//   { "blocks": [{ "x": 0, "y": 0, "z": 0, "type": "stone", "indestructible": true }, ...],
//     "player": { "position": { "x": 0.0, "y": 50.0, "z": 0.0 }, "yaw": 0.0, "pitch": 0.0 },
//     "selectedBlock": "dirt" }
//
// Block coordinates are world units on the lattice (cell key * CELL_SIZE).
// Blocks are written in ascending key order so identical worlds produce
// identical documents. Velocity and `on_ground` are not persisted.
//
// Loading is all-or-nothing. A document that fails to parse, is missing a
// required field, or carries a non-finite or out-of-world pose is rejected
// with a `SnapshotError` and the caller's in-memory state is left untouched.
// `Persistence::load()` logs the rejection and reports `None`, so a bad save
// degrades to the freshly generated world rather than an error.
//
// See also: `store.rs` for the key-value backends, `sim.rs` for
// `WorldState::snapshot()` / `restore()`, `session.rs` for save triggers.

use crate::avatar::{AvatarPose, AvatarState};
use crate::error::{PersistError, SnapshotError};
use crate::grid::VoxelGrid;
use crate::store::Store;
use crate::types::{Block, BlockType, CellKey, WORLD_LIMIT};
use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    #[serde(default)]
    pub indestructible: bool,
}

impl BlockRecord {
    fn from_block(block: &Block) -> Self {
        let w = block.key.world();
        Self {
            x: w.x,
            y: w.y,
            z: w.z,
            block_type: block.block_type,
            indestructible: block.indestructible,
        }
    }

    /// Off-lattice coordinates quantize to their containing cell.
    pub fn to_block(self) -> Block {
        Block {
            key: CellKey::from_world(IVec3::new(self.x, self.y, self.z)),
            block_type: self.block_type,
            indestructible: self.indestructible,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub position: PositionRecord,
    pub yaw: f32,
    pub pitch: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub blocks: Vec<BlockRecord>,
    pub player: PlayerRecord,
    pub selected_block: BlockType,
}

impl Snapshot {
    /// Capture the current world. Blocks are sorted by cell key.
    pub fn capture(grid: &VoxelGrid, avatar: &AvatarState, selection: BlockType) -> Self {
        let mut blocks: Vec<&Block> = grid.all().collect();
        blocks.sort_unstable_by_key(|b| b.key);
        let pose = avatar.pose();
        Self {
            blocks: blocks.into_iter().map(BlockRecord::from_block).collect(),
            player: PlayerRecord {
                position: PositionRecord {
                    x: pose.position.x,
                    y: pose.position.y,
                    z: pose.position.z,
                },
                yaw: pose.yaw,
                pitch: pose.pitch,
            },
            selected_block: selection,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse and validate a snapshot document.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    fn validate(&self) -> Result<(), SnapshotError> {
        let p = &self.player;
        let finite = [p.position.x, p.position.y, p.position.z, p.yaw, p.pitch]
            .iter()
            .all(|v| v.is_finite());
        let in_world = [p.position.x, p.position.y, p.position.z]
            .iter()
            .all(|v| v.abs() <= WORLD_LIMIT);
        if !finite || !in_world {
            return Err(SnapshotError::InvalidPose(format!(
                "position ({}, {}, {}), yaw {}, pitch {}",
                p.position.x, p.position.y, p.position.z, p.yaw, p.pitch
            )));
        }
        Ok(())
    }

    pub fn pose(&self) -> AvatarPose {
        let p = &self.player;
        AvatarPose {
            position: Vec3::new(p.position.x, p.position.y, p.position.z),
            yaw: p.yaw,
            pitch: p.pitch,
        }
    }

    pub fn blocks(&self) -> impl Iterator<Item = Block> + '_ {
        self.blocks.iter().map(|r| r.to_block())
    }
}

// ---------------------------------------------------------------------------
// Store adapter
// ---------------------------------------------------------------------------

/// Reads and writes snapshots under a single key of a `Store`.
#[derive(Debug)]
pub struct Persistence<S> {
    store: S,
    key: String,
}

impl<S: Store> Persistence<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Encode and write a snapshot, returning the encoded length.
    pub fn save(&mut self, snapshot: &Snapshot) -> Result<usize, PersistError> {
        let json = snapshot.to_json().map_err(PersistError::Encode)?;
        self.store.set(&self.key, &json)?;
        log::debug!(
            "saved {} blocks ({} bytes) to {:?}",
            snapshot.blocks.len(),
            json.len(),
            self.key
        );
        Ok(json.len())
    }

    /// Read the stored snapshot. Missing, unreadable and malformed data all
    /// yield `None`; the latter two are logged.
    pub fn load(&self) -> Option<Snapshot> {
        let json = match self.store.get(&self.key) {
            Ok(Some(json)) => json,
            Ok(None) => {
                log::info!("no saved world under {:?}", self.key);
                return None;
            }
            Err(e) => {
                log::warn!("could not read saved world: {e}");
                return None;
            }
        };
        match Snapshot::from_json(&json) {
            Ok(snapshot) => {
                log::info!(
                    "loaded {} blocks from {:?}",
                    snapshot.blocks.len(),
                    self.key
                );
                Some(snapshot)
            }
            Err(e) => {
                log::warn!("discarding saved world: {e}");
                None
            }
        }
    }
}
